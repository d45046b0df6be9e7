//! Raffle Form - entry service for a numbered raffle.
//!
//! Participants pick numbers between 1 and 250, leave a name and contact
//! phone, and upload a payment receipt. The service:
//! - Validates the submission and reports the first problem found
//! - Stores the receipt and reserves the numbers so nobody can pick them twice
//! - Appends the registration to a durable log for the operator

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod storage;

pub use config::Config;
pub use error::FormError;
pub use form::{Confirmation, FormController, ReceiptUpload, RegistrationForm};
pub use storage::build_state;
