// Small input checks shared by the services.

/// Loose shape check: something@domain.tld
pub fn is_valid_email(email: &str) -> bool {
    if email.len() <= 5 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some(at_pos) = email.find('@') else {
        return false;
    };
    if at_pos == 0 || at_pos == email.len() - 1 {
        return false;
    }
    let domain_part = &email[at_pos + 1..];
    !domain_part.contains('@') && domain_part.contains('.') && !domain_part.ends_with('.')
}

/// Exactly `len` ASCII digits (CPF is 11, a cellphone with area code is 11).
pub fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Trim and drop blank strings.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ana@moveat.app"));
        assert!(!is_valid_email("ana.moveat.app"));
        assert!(!is_valid_email("@moveat.app"));
        assert!(!is_valid_email("ana@moveat"));
        assert!(!is_valid_email("ana @moveat.app"));
        assert!(!is_valid_email("ana@@moveat.app"));
    }

    #[test]
    fn digit_strings() {
        assert!(is_digits("12345678901", 11));
        assert!(!is_digits("123.456.789-01", 11));
        assert!(!is_digits("1234567890", 11));
    }

    #[test]
    fn cleans_blanks() {
        assert_eq!(clean(Some("  CRN-3 ".to_string())), Some("CRN-3".to_string()));
        assert_eq!(clean(Some("   ".to_string())), None);
        assert_eq!(clean(None), None);
    }
}
