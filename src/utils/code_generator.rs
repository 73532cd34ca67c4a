use rand::Rng;

const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Referral code: "CB" + user id + 6 random uppercase alphanumerics.
/// The user id prefix keeps codes unique across users.
pub fn generate_referral_code(user_id: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| REFERRAL_ALPHABET[rng.gen_range(0..REFERRAL_ALPHABET.len())] as char)
        .collect();
    format!("CB{user_id}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_referral_code_shape() {
        let code = generate_referral_code(123);
        assert!(code.starts_with("CB123"));
        assert_eq!(code.len(), "CB123".len() + 6);
        assert!(
            code["CB123".len()..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_codes_for_different_users_differ() {
        assert_ne!(generate_referral_code(1), generate_referral_code(2));
    }
}
