//! Parsing of the comma-separated number selection typed by participants.

use crate::types::{FIRST_NUMBER, LAST_NUMBER};
use std::collections::BTreeSet;
use thiserror::Error;

/// Why a number selection was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("'{0}' is not a number; type numbers separated by commas")]
    NotANumber(String),

    #[error("Choose at least one number")]
    Empty,

    #[error("Number {0} is outside the allowed range (1-250)")]
    OutOfRange(i64),
}

/// Parse a selection such as `"1, 5, 23"` into an ordered set of numbers.
///
/// Empty pieces are skipped and duplicates collapse, so `"5,,5, 17"` yields
/// `{5, 17}`.
pub fn parse_selection(text: &str) -> Result<BTreeSet<u16>, SelectionError> {
    let mut requested = BTreeSet::new();
    for piece in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let value: i64 = piece
            .parse()
            .map_err(|_| SelectionError::NotANumber(piece.to_string()))?;
        requested.insert(value);
    }

    if requested.is_empty() {
        return Err(SelectionError::Empty);
    }

    requested
        .into_iter()
        .map(|value| {
            u16::try_from(value)
                .ok()
                .filter(|n| (FIRST_NUMBER..=LAST_NUMBER).contains(n))
                .ok_or(SelectionError::OutOfRange(value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_list() {
        let numbers = parse_selection("1, 5, 23").unwrap();
        assert_eq!(numbers.into_iter().collect::<Vec<_>>(), vec![1, 5, 23]);
    }

    #[test]
    fn test_duplicates_and_order_collapse() {
        let a = parse_selection("17, 5, 5, 17").unwrap();
        let b = parse_selection("5,17").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_empty_pieces_skipped() {
        let numbers = parse_selection(" ,3,, 4 ,").unwrap();
        assert_eq!(numbers.len(), 2);
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(parse_selection(""), Err(SelectionError::Empty));
        assert_eq!(parse_selection(" , ,"), Err(SelectionError::Empty));
    }

    #[test]
    fn test_not_a_number() {
        assert_eq!(
            parse_selection("1, two, 3"),
            Err(SelectionError::NotANumber("two".into()))
        );
        assert_eq!(
            parse_selection("1 2"),
            Err(SelectionError::NotANumber("1 2".into()))
        );
    }

    #[test]
    fn test_range_boundaries() {
        assert!(parse_selection("1").is_ok());
        assert!(parse_selection("250").is_ok());
        assert_eq!(parse_selection("0"), Err(SelectionError::OutOfRange(0)));
        assert_eq!(parse_selection("251"), Err(SelectionError::OutOfRange(251)));
        assert_eq!(parse_selection("-4"), Err(SelectionError::OutOfRange(-4)));
        assert_eq!(
            parse_selection("70000"),
            Err(SelectionError::OutOfRange(70000))
        );
    }

    #[test]
    fn test_one_bad_number_rejects_selection() {
        assert_eq!(
            parse_selection("10, 300, 20"),
            Err(SelectionError::OutOfRange(300))
        );
    }
}
