//! Contact number validation.

/// Minimum digit count for a contact number (area code + 8-digit landline).
pub const MIN_CONTACT_DIGITS: usize = 10;

/// Maximum digit count for a contact number (area code + 9-digit mobile).
pub const MAX_CONTACT_DIGITS: usize = 11;

/// Keep only the ASCII digits of a free-text contact number.
pub fn contact_digits(contact: &str) -> String {
    contact.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check whether a free-text contact number has 10 or 11 digits.
///
/// Any punctuation, spaces or letters are ignored, so `"(11) 98888-7777"`
/// is accepted while `"123"` is not.
pub fn is_valid_contact(contact: &str) -> bool {
    let digits = contact_digits(contact).len();
    (MIN_CONTACT_DIGITS..=MAX_CONTACT_DIGITS).contains(&digits)
}
