use chrono::{DateTime, Utc};
use uuid::Uuid;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_SPACE: u32 = 36 * 36 * 36 * 36;

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// `FP-<base36 millis>-<4 base36 chars>`, upper case.
///
/// `suffix_seed` is reduced modulo 36^4 and left-padded with zeros.
pub fn format_order_number(unix_millis: i64, suffix_seed: u32) -> String {
    let ts = base36(unix_millis.max(0) as u64);
    let suffix = base36(u64::from(suffix_seed % SUFFIX_SPACE));
    format!("FP-{ts}-{suffix:0>4}")
}

/// New order number for an order placed at `now`. Randomness comes from a v4
/// UUID; uniqueness is ultimately enforced by the database.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let bytes = *Uuid::new_v4().as_bytes();
    let seed = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format_order_number(now.timestamp_millis(), seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_stable() {
        assert_eq!(format_order_number(0, 0), "FP-0-0000");
        assert_eq!(format_order_number(35, 35), "FP-Z-000Z");
        assert_eq!(format_order_number(36, SUFFIX_SPACE + 36), "FP-10-0010");
    }

    #[test]
    fn generated_numbers_have_expected_shape() {
        let n = generate_order_number(Utc::now());
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "FP");
        assert_eq!(parts[2].len(), 4);
        assert!(n
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
