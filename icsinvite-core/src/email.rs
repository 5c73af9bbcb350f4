//! Email identity.
//!
//! Canonical forms are only ever used to decide whether two addresses belong
//! to the same person. Messages are always sent to the raw address.

/// Maps an email address to the form used for identity comparison.
pub trait EmailCanonicalizer: Send + Sync {
    fn canonicalize(&self, email: &str) -> String;
}

/// Guesses the provider's aliasing rules from the domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessCanonicalizer;

impl EmailCanonicalizer for GuessCanonicalizer {
    fn canonicalize(&self, email: &str) -> String {
        canonicalize_by_guess(email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Default,
    Gmail,
    Proton,
}

const PROTON_DOMAINS: &[&str] = &["proton.me", "protonmail.com", "protonmail.ch", "pm.me"];
const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com", "google.com"];

fn scheme_for(domain: &str) -> Scheme {
    if PROTON_DOMAINS.contains(&domain) {
        Scheme::Proton
    } else if GMAIL_DOMAINS.contains(&domain) {
        Scheme::Gmail
    } else {
        Scheme::Default
    }
}

/// Canonicalize an email with the scheme guessed from its domain.
pub fn canonicalize_by_guess(email: &str) -> String {
    let email = email.trim().to_lowercase();

    let Some((local, domain)) = email.rsplit_once('@') else {
        return email;
    };

    let local = match scheme_for(domain) {
        Scheme::Default => local.to_string(),
        Scheme::Gmail => strip_plus_alias(local).replace('.', ""),
        Scheme::Proton => strip_plus_alias(local).replace(['.', '-', '_'], ""),
    };

    format!("{local}@{domain}")
}

fn strip_plus_alias(local: &str) -> &str {
    local.split_once('+').map_or(local, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme_only_lowercases() {
        assert_eq!(
            canonicalize_by_guess("John.Doe+work@Example.COM"),
            "john.doe+work@example.com"
        );
    }

    #[test]
    fn test_gmail_scheme_strips_dots_and_plus_alias() {
        assert_eq!(
            canonicalize_by_guess("John.Doe+calendar@GMail.com"),
            "johndoe@gmail.com"
        );
    }

    #[test]
    fn test_proton_scheme_strips_separators_and_plus_alias() {
        assert_eq!(
            canonicalize_by_guess("jane_d-o.e+news@proton.me"),
            "janedoe@proton.me"
        );
    }

    #[test]
    fn test_without_at_sign_is_lowercased() {
        assert_eq!(canonicalize_by_guess(" NotAnEmail "), "notanemail");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let samples = [
            "Alice@Example.com",
            "a.l.i.c.e+x@gmail.com",
            "b_o-b.+y+z@pm.me",
            "carol+@protonmail.ch",
            "dave@sub.example.org",
            "+only-plus@gmail.com",
            "weird",
        ];
        for email in samples {
            let once = canonicalize_by_guess(email);
            let twice = canonicalize_by_guess(&once);
            assert_eq!(once, twice, "canonicalize not idempotent for {email}");
        }
    }
}
