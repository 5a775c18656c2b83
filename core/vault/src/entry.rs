//! Credential entries and the vault line format.

use chrono::NaiveDate;
use tracing::warn;

use crate::config::FIELD_SEPARATOR;
use credvault_common::{Error, Result, SensitiveString};

/// Decrypted credential held by an active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    /// Login name for the service; may be empty.
    pub username: String,
    /// Cleartext secret.
    pub secret: SensitiveString,
    /// Optional expiration date.
    pub expiration: Option<NaiveDate>,
}

impl CredentialEntry {
    /// Create a new entry.
    pub fn new(
        username: impl Into<String>,
        secret: impl Into<SensitiveString>,
        expiration: Option<NaiveDate>,
    ) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            expiration,
        }
    }
}

/// One vault line as stored: the secret is still encrypted under the
/// session key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// Login name for the service.
    pub username: String,
    /// Base64 ciphertext of the secret.
    pub ciphertext: String,
    /// Optional expiration date.
    pub expiration: Option<NaiveDate>,
}

/// Reject text that would break the line format.
///
/// A trailing `|` would merge with the following separator into `|||`,
/// which splits one field early.
pub(crate) fn check_field(name: &str, value: &str) -> Result<()> {
    if value.contains(FIELD_SEPARATOR)
        || value.ends_with('|')
        || value.contains('\n')
        || value.contains('\r')
    {
        return Err(Error::InvalidInput(format!(
            "{} cannot contain '{}', end with '|' or contain line breaks",
            name, FIELD_SEPARATOR
        )));
    }
    Ok(())
}

/// Serialize one vault line: `label||username||ciphertext||date-or-empty`.
pub(crate) fn format_line(label: &str, stored: &StoredCredential) -> String {
    let expiration = stored
        .expiration
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    [
        label,
        stored.username.as_str(),
        stored.ciphertext.as_str(),
        expiration.as_str(),
    ]
    .join(FIELD_SEPARATOR)
}

/// Parse one vault line.
///
/// Returns `None` for blank lines and lines with fewer than three fields.
/// An unparseable date is dropped with a warning; the entry survives.
pub(crate) fn parse_line(line: &str) -> Option<(String, StoredCredential)> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if parts.len() < 3 {
        warn!(fields = parts.len(), "Skipping malformed vault line");
        return None;
    }

    let label = parts[0].to_string();
    let expiration = match parts.get(3).map(|s| s.trim()) {
        None | Some("") => None,
        Some(text) => match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!(label = %label, "Ignoring unparseable expiration date");
                None
            }
        },
    };

    Some((
        label,
        StoredCredential {
            username: parts[1].to_string(),
            ciphertext: parts[2].to_string(),
            expiration,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stored(username: &str, expiration: Option<NaiveDate>) -> StoredCredential {
        StoredCredential {
            username: username.to_string(),
            ciphertext: "Y2lwaGVy".to_string(),
            expiration,
        }
    }

    #[test]
    fn test_format_line_with_date() {
        let date = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();
        let line = format_line("Gmail", &stored("alice@x.com", Some(date)));

        assert_eq!(line, "Gmail||alice@x.com||Y2lwaGVy||2099-01-01");
    }

    #[test]
    fn test_format_line_without_date() {
        let line = format_line("Work", &stored("", None));
        assert_eq!(line, "Work||||Y2lwaGVy||");
    }

    #[test]
    fn test_parse_line_full() {
        let (label, entry) = parse_line("Gmail||alice@x.com||Y2lwaGVy||2099-01-01").unwrap();

        assert_eq!(label, "Gmail");
        assert_eq!(entry.username, "alice@x.com");
        assert_eq!(entry.ciphertext, "Y2lwaGVy");
        assert_eq!(entry.expiration, NaiveDate::from_ymd_opt(2099, 1, 1));
    }

    #[test]
    fn test_parse_line_three_fields() {
        let (label, entry) = parse_line("Work||alice.w||Y2lwaGVy").unwrap();
        assert_eq!(label, "Work");
        assert_eq!(entry.expiration, None);
    }

    #[test]
    fn test_parse_line_too_few_fields() {
        assert!(parse_line("Broken||only-two").is_none());
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
    }

    #[test]
    fn test_parse_line_bad_date_keeps_entry() {
        let (label, entry) = parse_line("Bank||me||Y2lwaGVy||not-a-date").unwrap();
        assert_eq!(label, "Bank");
        assert_eq!(entry.expiration, None);
    }

    #[test]
    fn test_check_field() {
        assert!(check_field("label", "Gmail").is_ok());
        assert!(check_field("label", "").is_ok());
        assert!(matches!(
            check_field("label", "a||b"),
            Err(Error::InvalidInput(_))
        ));
        assert!(check_field("username", "a\nb").is_err());
        assert!(check_field("username", "single|pipe").is_ok());
        assert!(check_field("username", "|leading").is_ok());
        assert!(matches!(
            check_field("username", "bob|"),
            Err(Error::InvalidInput(_))
        ));
        assert!(check_field("label", "Gmail|").is_err());
    }

    #[test]
    fn test_pipes_inside_fields_parse_back() {
        let line = format_line("a|b", &stored("|bob", None));
        let (label, entry) = parse_line(&line).unwrap();

        assert_eq!(label, "a|b");
        assert_eq!(entry.username, "|bob");
        assert_eq!(entry.ciphertext, "Y2lwaGVy");
    }

    proptest! {
        #[test]
        fn prop_line_parses_back(
            label in "[A-Za-z0-9 ._@-]{1,24}",
            username in "[A-Za-z0-9._@-]{0,24}",
            ciphertext in "[A-Za-z0-9+/]{4,40}={0,2}",
            days in proptest::option::of(0i64..40_000),
        ) {
            let expiration = days.and_then(|d| {
                NaiveDate::from_ymd_opt(2000, 1, 1)
                    .and_then(|base| base.checked_add_signed(chrono::Duration::days(d)))
            });
            let original = StoredCredential { username, ciphertext, expiration };

            let line = format_line(&label, &original);
            let (parsed_label, parsed) = parse_line(&line).unwrap();

            prop_assert_eq!(parsed_label, label);
            prop_assert_eq!(parsed, original);
        }
    }
}
