//! Referral code generation.

use argon2::password_hash::rand_core::{OsRng, RngCore};

use crate::config::{REFERRAL_CODE_ALPHABET, REFERRAL_CODE_LENGTH};

/// Random uppercase code drawn from an unambiguous alphabet.
pub fn generate_referral_code() -> String {
    let mut bytes = [0u8; REFERRAL_CODE_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| REFERRAL_CODE_ALPHABET[*b as usize % REFERRAL_CODE_ALPHABET.len()] as char)
        .collect()
}

/// Normalize user input before lookup.
pub fn normalize_referral_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_the_expected_alphabet() {
        for _ in 0..50 {
            let code = generate_referral_code();
            assert_eq!(code.len(), REFERRAL_CODE_LENGTH);
            assert!(code.bytes().all(|b| REFERRAL_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_referral_code(" ab12cd34 "), "AB12CD34");
    }
}
