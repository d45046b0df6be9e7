//! HTTP request handlers.

use super::types::{
    HealthResponse, NumbersResponse, RaffleInfoResponse, RegistrationInfo, RegistrationResponse,
    RegistrationsResponse,
};
use super::AppState;
use crate::error::FormError;
use crate::form::{ReceiptUpload, RegistrationForm};
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use raffle_ledger::{FIRST_NUMBER, LAST_NUMBER};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Health check endpoint.
///
/// Reports `degraded` instead of failing when storage cannot be read.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let summary = state.controller.ledger().summary().await;
    let count = state.controller.registrations().count().await;

    match (summary, count) {
        (Ok(summary), Ok(count)) => Json(HealthResponse {
            status: "ok".to_string(),
            available_count: summary.total_available,
            registration_count: count,
        }),
        (summary, count) => {
            if let Err(e) = &summary {
                warn!(error = %e, "Health check could not read numbers");
            }
            if let Err(e) = &count {
                warn!(error = %e, "Health check could not read registrations");
            }
            Json(HealthResponse {
                status: "degraded".to_string(),
                available_count: summary.map(|s| s.total_available).unwrap_or(0),
                registration_count: count.unwrap_or(0),
            })
        }
    }
}

/// Raffle title, prize and price.
pub async fn raffle_info(State(state): State<AppState>) -> Json<RaffleInfoResponse> {
    let raffle = &state.raffle;

    Json(RaffleInfoResponse {
        title: raffle.title.clone(),
        prize: raffle.prize.clone(),
        price_cents: raffle.price_cents,
        currency: raffle.currency.clone(),
        payment_key: raffle.payment_key.clone(),
        first_number: FIRST_NUMBER,
        last_number: LAST_NUMBER,
    })
}

/// Numbers still open for selection.
pub async fn list_numbers(
    State(state): State<AppState>,
) -> Result<Json<NumbersResponse>, FormError> {
    let available = state.controller.ledger().list_available().await?;

    Ok(Json(NumbersResponse {
        total_available: available.len(),
        lowest: available.first().copied(),
        highest: available.last().copied(),
        available,
    }))
}

/// Submit the registration form.
pub async fn submit_registration(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RegistrationResponse>), FormError> {
    let form = read_form(multipart).await?;
    debug!(numbers = %form.numbers, "Registration form received");

    let confirmation = state.controller.submit(form).await?;
    let registration = confirmation.registration;

    info!(
        registration_id = registration.id,
        count = registration.numbers.len(),
        "Registration confirmed"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            id: registration.id,
            message: format!(
                "Registration {} confirmed for numbers {}",
                registration.id,
                registration
                    .numbers
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            numbers: registration.numbers,
            receipt_url: registration.receipt_url,
            amount_due_cents: confirmation.amount_due_cents,
            currency: state.raffle.currency.clone(),
        }),
    ))
}

/// List every registration. Requires the operator token.
pub async fn list_registrations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RegistrationsResponse>, FormError> {
    if !is_operator(&state, &headers) {
        warn!("Rejected registration listing without operator token");
        return Err(FormError::Forbidden);
    }

    let registrations: Vec<RegistrationInfo> = state
        .controller
        .registrations()
        .list()
        .await?
        .into_iter()
        .map(RegistrationInfo::from)
        .collect();

    Ok(Json(RegistrationsResponse {
        total: registrations.len(),
        registrations,
    }))
}

/// Collect the form fields from a multipart body.
///
/// Unknown fields are ignored. Missing text fields are left empty so the
/// controller reports them in its usual order.
async fn read_form(mut multipart: Multipart) -> Result<RegistrationForm, FormError> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "name" => form.name = field.text().await?,
            "contact" => form.contact = field.text().await?,
            "numbers" => form.numbers = field.text().await?,
            "receipt" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                form.receipt = Some(ReceiptUpload {
                    data: data.to_vec(),
                    file_name,
                    content_type,
                });
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

fn is_operator(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = &state.admin_token else {
        return false;
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(provided) => hash_token(provided) == hash_token(expected.expose_secret()),
        None => false,
    }
}

fn hash_token(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}
