//! Login and password format rules
//!
//! Lengths are measured in bytes. Messages are returned verbatim to clients.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum login length in bytes
pub const MIN_LOGIN_LEN: usize = 8;

/// Minimum password length in bytes
pub const MIN_PASSWORD_LEN: usize = 8;

/// Characters that satisfy the password "special character" rule
pub const SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{}|;:',.<>?/`~";

static LOGIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("login pattern is a valid regex"));

/// Check login format.
///
/// Returns the first rule violated, in order: length, then alphabet.
pub fn validate_login(login: &str) -> Result<(), &'static str> {
    if login.len() < MIN_LOGIN_LEN {
        return Err("login must be at least 8 characters");
    }
    if !LOGIN_RE.is_match(login) {
        return Err("login must contain only latin letters and digits");
    }
    Ok(())
}

/// Check password strength.
///
/// Returns the first rule violated, in order: length, letter case, digit,
/// special character.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err("password must be at least 8 characters");
    }

    let (mut upper, mut lower, mut digit, mut special) = (false, false, false, false);
    for c in password.chars() {
        match c {
            'A'..='Z' => upper = true,
            'a'..='z' => lower = true,
            '0'..='9' => digit = true,
            c if SPECIAL_CHARS.contains(c) => special = true,
            _ => {}
        }
    }

    if !(upper && lower) {
        return Err("password must contain both upper and lower case letters");
    }
    if !digit {
        return Err("password must contain at least one digit");
    }
    if !special {
        return Err("password must contain at least one special character");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_rules() {
        assert_eq!(validate_login("TestUser01"), Ok(()));
        assert_eq!(validate_login("abcdefgh"), Ok(()));
        assert_eq!(
            validate_login("short"),
            Err("login must be at least 8 characters")
        );
        assert_eq!(
            validate_login("bad_login_1"),
            Err("login must contain only latin letters and digits")
        );
        assert_eq!(
            validate_login("кириллица"),
            Err("login must contain only latin letters and digits")
        );
    }

    #[test]
    fn test_login_length_is_bytes() {
        // Four two-byte characters reach the length floor but fail the alphabet rule
        assert_eq!(
            validate_login("éééé"),
            Err("login must contain only latin letters and digits")
        );
    }

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(validate_password("Passw0rd!"), Ok(()));
        assert_eq!(
            validate_password("Pa0!"),
            Err("password must be at least 8 characters")
        );
        assert_eq!(
            validate_password("password0!"),
            Err("password must contain both upper and lower case letters")
        );
        assert_eq!(
            validate_password("Password!"),
            Err("password must contain at least one digit")
        );
        assert_eq!(
            validate_password("Password0"),
            Err("password must contain at least one special character")
        );
    }

    #[test]
    fn test_double_quote_is_not_special() {
        assert_eq!(
            validate_password("Password0\""),
            Err("password must contain at least one special character")
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any alphanumeric login of at least 8 bytes is accepted.
            #[test]
            fn alphanumeric_logins_accepted(login in "[a-zA-Z0-9]{8,32}") {
                prop_assert_eq!(validate_login(&login), Ok(()));
            }

            /// Logins under 8 bytes are always rejected for length first.
            #[test]
            fn short_logins_rejected(login in "[a-zA-Z0-9_]{0,7}") {
                prop_assert_eq!(
                    validate_login(&login),
                    Err("login must be at least 8 characters")
                );
            }

            /// A long enough password with every character class passes.
            #[test]
            fn complete_passwords_accepted(
                body in "[a-z]{6,12}",
                upper in "[A-Z]",
                digit in "[0-9]",
                special in "[!@#$%^&*()_+=\\-]",
            ) {
                let password = format!("{upper}{body}{special}{digit}");
                prop_assert_eq!(validate_password(&password), Ok(()));
            }

            /// Passwords without a special character are rejected.
            #[test]
            fn passwords_without_special_rejected(password in "[A-Z][a-z]{6,12}[0-9]") {
                prop_assert_eq!(
                    validate_password(&password),
                    Err("password must contain at least one special character")
                );
            }
        }
    }
}
