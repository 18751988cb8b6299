//! Invoice number formatting and parsing.
//!
//! The persisted format is `INV_<R4>_<S4>`: a fixed prefix, four characters
//! drawn uniformly from `[A-Z0-9]`, and the allocated sequence zero-padded
//! to at least four digits with no upper bound. Uniqueness is guaranteed by
//! the monotonic sequence; the random block only disambiguates numbers
//! visually, so collisions in it are accepted.

use rand::Rng;

use crate::error::AppError;

pub const INVOICE_NUMBER_PREFIX: &str = "INV";

const RANDOM_BLOCK_LEN: usize = 4;
const MIN_SEQUENCE_DIGITS: usize = 4;
const RANDOM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Parsed components of an invoice number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvoiceNumber {
    pub random_code: String,
    pub sequence: i64,
}

/// Format an invoice number for an allocated sequence value.
///
/// Sequences beyond 9999 simply produce more digits.
pub fn format(sequence: i64) -> String {
    let mut rng = rand::thread_rng();
    let random_code: String = (0..RANDOM_BLOCK_LEN)
        .map(|_| RANDOM_ALPHABET[rng.gen_range(0..RANDOM_ALPHABET.len())] as char)
        .collect();
    format_with_code(&random_code, sequence)
}

/// Format with an explicit random block. Split out so the round-trip law is
/// testable deterministically.
pub fn format_with_code(random_code: &str, sequence: i64) -> String {
    format!(
        "{}_{}_{:0width$}",
        INVOICE_NUMBER_PREFIX,
        random_code,
        sequence,
        width = MIN_SEQUENCE_DIGITS
    )
}

/// Parse an invoice number into its components.
///
/// Fails with [`AppError::MalformedInvoiceNumber`] unless the input matches
/// `INV_[A-Z0-9]{4}_\d{4,}`.
pub fn parse(number: &str) -> Result<ParsedInvoiceNumber, AppError> {
    let malformed = || AppError::MalformedInvoiceNumber(number.to_string());

    let mut parts = number.split('_');
    let prefix = parts.next().ok_or_else(malformed)?;
    let random_code = parts.next().ok_or_else(malformed)?;
    let digits = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() || prefix != INVOICE_NUMBER_PREFIX {
        return Err(malformed());
    }

    if random_code.len() != RANDOM_BLOCK_LEN
        || !random_code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return Err(malformed());
    }

    if digits.len() < MIN_SEQUENCE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let sequence: i64 = digits.parse().map_err(|_| malformed())?;

    Ok(ParsedInvoiceNumber {
        random_code: random_code.to_string(),
        sequence,
    })
}

/// Non-throwing predicate wrapper over [`parse`].
pub fn validate(number: &str) -> bool {
    parse(number).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_zero_pads_to_four_digits() {
        assert_eq!(format_with_code("AB12", 7), "INV_AB12_0007");
        assert_eq!(format_with_code("ZZZZ", 9999), "INV_ZZZZ_9999");
    }

    #[test]
    fn format_grows_beyond_four_digits() {
        assert_eq!(format_with_code("AB12", 10000), "INV_AB12_10000");
        assert_eq!(format_with_code("AB12", 1234567), "INV_AB12_1234567");
    }

    #[test]
    fn parse_round_trips_format() {
        for sequence in [0, 1, 42, 9999, 10000, 123456789] {
            let number = format(sequence);
            let parsed = parse(&number).expect("generated number must parse");
            assert_eq!(parsed.sequence, sequence);
            assert_eq!(parsed.random_code.len(), 4);
        }
    }

    #[test]
    fn parse_extracts_components() {
        let parsed = parse("INV_K7Q2_0042").unwrap();
        assert_eq!(parsed.random_code, "K7Q2");
        assert_eq!(parsed.sequence, 42);
    }

    #[test]
    fn parse_rejects_bad_grammar() {
        for bad in [
            "",
            "INV",
            "INV_K7Q2",
            "INV_K7Q2_007",        // too few digits
            "INV_k7q2_0042",       // lowercase random block
            "INV_K7Q_0042",        // short random block
            "INV_K7Q22_0042",      // long random block
            "XYZ_K7Q2_0042",       // wrong prefix
            "INV_K7Q2_00A2",       // non-digit sequence
            "INV_K7Q2_0042_EXTRA", // trailing segment
        ] {
            assert!(parse(bad).is_err(), "expected {:?} to be rejected", bad);
            assert!(!validate(bad));
        }
    }

    #[test]
    fn validate_accepts_well_formed_numbers() {
        assert!(validate("INV_A1B2_0001"));
        assert!(validate("INV_0000_123456"));
    }
}
