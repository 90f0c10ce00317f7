use lazy_static::lazy_static;
use regex::Regex;

pub(crate) fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn shape_check() {
        assert!(is_valid("a@x.com"));
        assert!(!is_valid("a@x"));
        assert!(!is_valid("ax.com"));
        assert!(!is_valid("a b@x.com"));
    }
}
