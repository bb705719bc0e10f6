//! Phone number normalization
//!
//! Only two shapes are understood: numbers already in international format, and French mobile numbers
//! (`06...`, `07...`). Anything else yields `None`, and the caller is expected to skip that contact.

const COUNTRY_CODE: &str = "+33";
const MOBILE_PREFIXES: [&str; 2] = ["06", "07"];

/// Canonicalize a raw phone number into an international-format identifier
pub fn normalize(raw: &str) -> Option<String> {
    let number: String = raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if number.starts_with('+') {
        return Some(number);
    }

    if MOBILE_PREFIXES.iter().any(|prefix| number.starts_with(prefix)) {
        return Some(format!("{}{}", COUNTRY_CODE, &number[1..]));
    }

    None
}

/// The SIP address of a normalized number on a given domain
pub fn sip_uri(number: &str, domain: &str) -> String {
    format!("sip:{}@{}", number, domain)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_numbers_get_the_country_code() {
        assert_eq!(normalize("06 12 34 56 78").as_deref(), Some("+33612345678"));
        assert_eq!(normalize("07.98.76.54.32").as_deref(), Some("+33798765432"));
        assert_eq!(normalize("(06) 12-34-56-78").as_deref(), Some("+33612345678"));
    }

    #[test]
    fn international_numbers_are_kept() {
        assert_eq!(normalize("+33612345678").as_deref(), Some("+33612345678"));
        assert_eq!(normalize("+1 (555) 010-9999").as_deref(), Some("+15550109999"));
    }

    #[test]
    fn other_shapes_are_rejected() {
        assert_eq!(normalize("0123456789"), None);
        assert_eq!(normalize("612345678"), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("call me"), None);
    }

    #[test]
    fn sip_addresses() {
        assert_eq!(sip_uri("+33612345678", "sip.example.net"), "sip:+33612345678@sip.example.net");
    }
}
