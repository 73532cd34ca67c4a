use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

/// Country prefix of numbers the M-Pesa rail can pay out to.
pub const KENYA_DIAL_PREFIX: &str = "+254";

fn payout_phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("static phone pattern"))
}

/// Accepts 10 to 15 digits with an optional leading '+'.
pub fn validate_payout_phone(phone: &str) -> AppResult<()> {
    if !payout_phone_regex().is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number format".to_string(),
        ));
    }
    Ok(())
}

/// Normalizes Kenyan mobile numbers to +254XXXXXXXXX.
/// Other inputs only gain a leading '+'.
pub fn format_kenyan_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 12 && digits.starts_with("254") {
        format!("+{digits}")
    } else if digits.len() == 10 && digits.starts_with('0') {
        format!("+254{}", &digits[1..])
    } else if digits.len() == 9 && (digits.starts_with('7') || digits.starts_with('1')) {
        format!("+254{digits}")
    } else {
        format!("+{digits}")
    }
}

/// Normalizes a payout number and refuses anything outside Kenya.
pub fn kenyan_payout_phone(phone: &str) -> AppResult<String> {
    let formatted = format_kenyan_phone(phone);
    if !formatted.starts_with(KENYA_DIAL_PREFIX) {
        return Err(AppError::ValidationError(
            "Only Kenyan M-Pesa numbers (+254) are supported".to_string(),
        ));
    }
    Ok(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_payout_phone() {
        assert!(validate_payout_phone("0712345678").is_ok());
        assert!(validate_payout_phone("+254712345678").is_ok());
        assert!(validate_payout_phone("071234567").is_err());
        assert!(validate_payout_phone("+2547123456789012").is_err());
        assert!(validate_payout_phone("07-1234-5678").is_err());
        assert!(validate_payout_phone("").is_err());
    }

    #[test]
    fn test_format_kenyan_phone() {
        assert_eq!(format_kenyan_phone("0712345678"), "+254712345678");
        assert_eq!(format_kenyan_phone("712345678"), "+254712345678");
        assert_eq!(format_kenyan_phone("254712345678"), "+254712345678");
        assert_eq!(format_kenyan_phone("+254712345678"), "+254712345678");
        assert_eq!(format_kenyan_phone("0110123456"), "+254110123456");
        assert_eq!(format_kenyan_phone("+14155550123"), "+14155550123");
    }

    #[test]
    fn test_kenyan_payout_phone() {
        assert_eq!(kenyan_payout_phone("0712345678").unwrap(), "+254712345678");
        assert!(matches!(
            kenyan_payout_phone("+14155550123"),
            Err(AppError::ValidationError(_))
        ));
    }
}
