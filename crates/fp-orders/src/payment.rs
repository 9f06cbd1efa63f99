use thiserror::Error;
use url::Url;

/// `1250` paise => `"12.50"`.
pub fn format_amount(paise: i64) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("amount has more than two decimals: {0}")]
    TooManyDecimals(String),
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

/// Rupees with at most two decimals into paise, without floats.
///
/// `"250.5"` => 25050, `"0.07"` => 7, `"₹12.30"` => 1230.
pub fn parse_rupees(raw: &str) -> Result<i64, AmountError> {
    let s = raw.trim().trim_start_matches('₹').trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative(raw.to_string()));
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if frac.len() > 2 {
        return Err(AmountError::TooManyDecimals(raw.to_string()));
    }
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(frac) || (whole.is_empty() && frac.is_empty()) {
        return Err(AmountError::Invalid(raw.to_string()));
    }

    let out_of_range = || AmountError::OutOfRange(raw.to_string());
    let rupees: i64 = match whole {
        "" => 0,
        w => w.parse().map_err(|_| out_of_range())?,
    };
    let paise: i64 = match frac.len() {
        0 => 0,
        1 => i64::from(frac.as_bytes()[0] - b'0') * 10,
        _ => frac.parse().map_err(|_| out_of_range())?,
    };

    rupees
        .checked_mul(100)
        .and_then(|r| r.checked_add(paise))
        .ok_or_else(out_of_range)
}

/// `1250` paise => `"₹12.50"`; negatives render as `"₹-12.50"`.
pub fn format_inr(paise: i64) -> String {
    format!("₹{}", format_amount(paise))
}

/// UPI intent link the payment page renders as a QR code.
///
/// `upi://pay?pa=<vpa>&pn=<merchant>&am=<amount>&cu=INR&tn=Order-<number>`
pub fn upi_payment_link(vpa: &str, merchant_name: &str, amount_paise: i64, order_number: &str) -> String {
    let note = format!("Order-{order_number}");
    let amount = format_amount(amount_paise);
    match Url::parse_with_params(
        "upi://pay",
        &[
            ("pa", vpa),
            ("pn", merchant_name),
            ("am", amount.as_str()),
            ("cu", "INR"),
            ("tn", note.as_str()),
        ],
    ) {
        Ok(u) => u.to_string(),
        // "upi://pay" is a constant and always parses.
        Err(_) => format!("upi://pay?pa={vpa}&am={amount}&cu=INR&tn={note}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rupee_strings_parse_exactly() {
        assert_eq!(parse_rupees("250"), Ok(25_000));
        assert_eq!(parse_rupees("250.5"), Ok(25_050));
        assert_eq!(parse_rupees("0.07"), Ok(7));
        assert_eq!(parse_rupees(" ₹12.30 "), Ok(1_230));
        assert_eq!(parse_rupees(".5"), Ok(50));
    }

    #[test]
    fn rupee_strings_reject_garbage() {
        assert_eq!(parse_rupees(""), Err(AmountError::Empty));
        assert!(matches!(parse_rupees("-5"), Err(AmountError::Negative(_))));
        assert!(matches!(parse_rupees("1.234"), Err(AmountError::TooManyDecimals(_))));
        assert!(matches!(parse_rupees("12a"), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_rupees("."), Err(AmountError::Invalid(_))));
        assert!(matches!(
            parse_rupees("99999999999999999999"),
            Err(AmountError::OutOfRange(_))
        ));
    }

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(123_456), "1234.56");
        assert_eq!(format_inr(-250), "₹-2.50");
    }

    #[test]
    fn upi_link_carries_amount_and_order_reference() {
        let link = upi_payment_link("flashprint@upi", "FlashPrint", 3600, "FP-ABC-1234");
        assert!(link.starts_with("upi://pay?"));
        assert!(link.contains("pa=flashprint%40upi"));
        assert!(link.contains("am=36.00"));
        assert!(link.contains("cu=INR"));
        assert!(link.contains("tn=Order-FP-ABC-1234"));
    }
}
