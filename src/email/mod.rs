use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::config;

mod verify;
pub use verify::{Verdict, Verifier, VerifierError, VerifyResponse};

static EMAIL_FORMAT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("compile email format regex"));

/// `local@domain.tld` shape: exactly one `@`, no whitespace, a dot
/// somewhere in the domain. Quality beyond that is the checker's and
/// the verification service's business.
pub fn is_valid_email_format(email: &str) -> bool {
    EMAIL_FORMAT_REGEX.is_match(email)
}

/// Local email-quality heuristics, evaluated in order with the first
/// hit short-circuiting: shape, likely-fake local part, domain typo.
///
/// The tables are configuration data ([`config::Email`]); nothing here
/// hard-codes them.
pub struct Checker {
    fake_prefixes: Vec<String>,
    domain_typos: BTreeMap<String, String>,
}

impl Checker {
    pub fn new(cfg: &config::Email) -> Self {
        Self {
            fake_prefixes: cfg
                .fake_prefixes
                .iter()
                .map(|prefix| prefix.to_lowercase())
                .collect(),
            domain_typos: cfg
                .domain_typos
                .iter()
                .map(|(typo, fix)| (typo.to_lowercase(), fix.clone()))
                .collect(),
        }
    }

    /// `None` when the address passes every local check. An empty input
    /// yields no message; forms treat it as "nothing entered yet".
    pub fn check(&self, email: &str) -> Option<String> {
        if email.is_empty() {
            return None;
        }

        if !is_valid_email_format(email) {
            return Some("Please enter a valid email format".to_string());
        }

        let (local, domain) = email.split_once('@')?;

        if self.fake_prefixes.iter().any(|p| local.eq_ignore_ascii_case(p)) {
            return Some("Please use a real email address".to_string());
        }

        if let Some(fix) = self.domain_typos.get(&domain.to_lowercase()) {
            return Some(format!("Did you mean {local}@{fix}?"));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Checker {
        Checker::new(&config::Email::default())
    }

    #[test]
    fn format_check() {
        assert!(is_valid_email_format("user@x.com"));
        assert!(is_valid_email_format("first.last@sub.domain.org"));

        assert!(!is_valid_email_format("user@"));
        assert!(!is_valid_email_format("user"));
        assert!(!is_valid_email_format("user@nodot"));
        assert!(!is_valid_email_format("user name@x.com"));
        assert!(!is_valid_email_format("user@@x.com"));
        assert!(!is_valid_email_format(""));
    }

    #[test]
    fn bad_shape_short_circuits() {
        assert_eq!(
            checker().check("user@").as_deref(),
            Some("Please enter a valid email format")
        );
    }

    #[test]
    fn fake_prefixes_are_flagged() {
        let checker = checker();
        for address in ["test@example.com", "ADMIN@corp.org", "no-reply@x.io"] {
            let message = checker.check(address).unwrap();
            assert!(message.contains("real email address"), "{address}: {message}");
        }

        // prefix must match the whole local part
        assert!(checker.check("testers@example.com").is_none());
    }

    #[test]
    fn domain_typos_get_a_suggestion() {
        let message = checker().check("user2@gmial.com").unwrap();
        assert_eq!(message, "Did you mean user2@gmail.com?");

        let message = checker().check("someone@OUTLOK.com").unwrap();
        assert!(message.contains("Did you mean"));
    }

    #[test]
    fn clean_addresses_pass() {
        let checker = checker();
        assert!(checker.check("alice.smith@gmail.com").is_none());
        assert!(checker.check("bob@company.co.uk").is_none());
        assert!(checker.check("").is_none());
    }

    #[test]
    fn tables_come_from_configuration() {
        let cfg: config::Email = serde_json::from_value(serde_json::json!({
            "fake_prefixes": ["bogus"],
            "domain_typos": { "gnail.com": "gmail.com" },
        }))
        .unwrap();
        let checker = Checker::new(&cfg);

        assert!(checker.check("bogus@x.com").is_some());
        // the default lists are gone once overridden
        assert!(checker.check("test@example.com").is_none());
        assert!(checker.check("user@gnail.com").unwrap().contains("gmail.com"));
    }
}
