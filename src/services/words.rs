//! Amount-in-words rendering for the invoice footer.
//!
//! Uses the Indian long-form convention with Thousand/Lakh/Crore grouping,
//! e.g. "One Thousand Two Hundred Thirty Four Rupees and Fifty Paise Only".

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Largest supported amount in rupees. Anything at or above is a conversion
/// failure and the caller falls back to a numeric rendering.
const MAX_RUPEES: u64 = 1_000_000_000_000_000;

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

fn push_word(out: &mut String, word: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(word);
}

fn push_below_hundred(out: &mut String, n: u64) {
    if n < 20 {
        push_word(out, ONES[n as usize]);
    } else {
        push_word(out, TENS[(n / 10) as usize]);
        if n % 10 != 0 {
            push_word(out, ONES[(n % 10) as usize]);
        }
    }
}

fn push_below_thousand(out: &mut String, n: u64) {
    if n >= 100 {
        push_word(out, ONES[(n / 100) as usize]);
        push_word(out, "Hundred");
    }
    if n % 100 != 0 || n == 0 {
        push_below_hundred(out, n % 100);
    }
}

/// Render a non-negative integer in Indian grouping. Crores recurse so large
/// values read as "<words> Crore".
fn integer_to_words(n: u64) -> String {
    let mut out = String::new();

    let crore = n / 10_000_000;
    let lakh = (n / 100_000) % 100;
    let thousand = (n / 1_000) % 100;
    let rest = n % 1_000;

    if crore > 0 {
        push_word(&mut out, &integer_to_words(crore));
        push_word(&mut out, "Crore");
    }
    if lakh > 0 {
        push_below_hundred(&mut out, lakh);
        push_word(&mut out, "Lakh");
    }
    if thousand > 0 {
        push_below_hundred(&mut out, thousand);
        push_word(&mut out, "Thousand");
    }
    if rest > 0 || n == 0 {
        push_below_thousand(&mut out, rest);
    }

    out
}

/// Render a rupee amount in words.
///
/// Returns `None` when the amount cannot be converted (negative or beyond
/// the supported range); generation then falls back to a plain numeric
/// string rather than aborting.
pub fn amount_in_words(amount: Decimal) -> Option<String> {
    if amount.is_sign_negative() {
        return None;
    }

    let rounded = amount.round_dp(2);
    let rupees = rounded.trunc().to_u64()?;
    if rupees >= MAX_RUPEES {
        return None;
    }
    let paise = ((rounded - rounded.trunc()) * Decimal::from(100))
        .round()
        .to_u64()?;

    let mut words = format!("{} Rupees", integer_to_words(rupees));
    if paise > 0 {
        words.push_str(&format!(" and {} Paise", integer_to_words(paise)));
    }
    words.push_str(" Only");
    Some(words)
}

/// Numeric fallback used when word conversion fails.
pub fn numeric_fallback(amount: Decimal) -> String {
    format!("Rs. {:.2}", amount)
}
