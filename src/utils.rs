use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

// Default limit for pagination
const DEFAULT_PAGE_LIMIT: u64 = 25;
// Max limit to prevent excessive requests
const MAX_PAGE_LIMIT: u64 = 100;

#[derive(Debug, Deserialize, Default)]
pub struct PaginationParams {
    #[serde(default)]
    limit: u64,
    #[serde(default)]
    offset: u64,
}

impl PaginationParams {
    pub fn limit(&self) -> u64 {
        if self.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit.clamp(1, MAX_PAGE_LIMIT)
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

lazy_static! {
    // Starts with a letter; letters, digits and underscores; 3-20 characters.
    static ref LOGIN_RE: Regex = Regex::new("^[a-zA-Z][a-zA-Z0-9_]{2,19}$").unwrap();
    static ref NAME_RE: Regex = Regex::new("^[a-zA-Z]+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub const LOGIN_RULES: &str = "Username must start with a letter and contain only letters, \
     numbers, and underscores (3-20 characters)";

pub const PASSWORD_RULES: &str = "Password must be 8-20 characters long and include at least \
     one uppercase letter, one lowercase letter, one digit, and one special character (@#$%^&+=!)";

pub fn valid_login(login: &str) -> bool {
    LOGIN_RE.is_match(login)
}

pub fn valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

const PASSWORD_SPECIALS: &str = "@#$%^&+=!";

/// 8-20 characters from the allowed alphabet, with at least one lowercase
/// letter, one uppercase letter, one digit and one special character.
pub fn valid_password(password: &str) -> bool {
    let len = password.chars().count();
    if !(8..=20).contains(&len) {
        return false;
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_caps() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams {
            limit: 1000,
            offset: 50,
        };
        assert_eq!(params.limit(), MAX_PAGE_LIMIT);
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn login_rules() {
        assert!(valid_login("alice"));
        assert!(valid_login("a2_bc"));
        assert!(!valid_login("ab")); // too short
        assert!(!valid_login("1alice")); // must start with a letter
        assert!(!valid_login("alice.b")); // no dots
        assert!(!valid_login("a_login_that_is_way_too_long"));
    }

    #[test]
    fn email_rules() {
        assert!(valid_email("a@b.co"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("a@b"));
        assert!(!valid_email("a b@c.de"));
    }

    #[test]
    fn password_rules() {
        assert!(valid_password("Passw0rd!"));
        assert!(!valid_password("Sh0rt!a")); // too short
        assert!(!valid_password("alllowercase1!"));
        assert!(!valid_password("ALLUPPERCASE1!"));
        assert!(!valid_password("NoDigits!!"));
        assert!(!valid_password("NoSpecials11"));
        assert!(!valid_password("Has Space1!"));
    }
}
