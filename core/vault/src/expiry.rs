//! Expiration classification, expiring-soon queries and vault statistics.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::entry::CredentialEntry;

/// Days left at or below which a credential counts as urgent.
pub const URGENT_DAYS: i64 = 7;

/// Days left at or below which a credential counts as expiring soon.
pub const SOON_DAYS: i64 = 30;

/// Expiration state of one credential relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExpirationStatus {
    /// No expiration date set.
    NoExpiration,
    /// Date is before the reference date.
    Expired,
    /// Expires within `URGENT_DAYS` days (0 means today).
    ExpiresIn(i64),
    /// Expires within `SOON_DAYS` days.
    ExpiringSoon(i64),
    /// More than `SOON_DAYS` days left.
    Healthy,
}

impl ExpirationStatus {
    /// Classify `expiration` against `today`.
    pub fn classify(expiration: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(date) = expiration else {
            return Self::NoExpiration;
        };

        match days_left(date, today) {
            d if d < 0 => Self::Expired,
            d if d <= URGENT_DAYS => Self::ExpiresIn(d),
            d if d <= SOON_DAYS => Self::ExpiringSoon(d),
            _ => Self::Healthy,
        }
    }
}

impl fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExpiration => f.write_str("no expiration"),
            Self::Expired => f.write_str("expired"),
            Self::ExpiresIn(0) => f.write_str("expires today"),
            Self::ExpiresIn(d) => write!(f, "expires in {} day(s)", d),
            Self::ExpiringSoon(d) => write!(f, "expires soon ({} days)", d),
            Self::Healthy => f.write_str("ok"),
        }
    }
}

/// A credential surfaced by [`expiring_within`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringCredential {
    pub label: String,
    pub username: String,
    pub expiration: NaiveDate,
    /// Negative when already expired.
    pub days_left: i64,
}

/// Counts shown on the vault summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CredentialStats {
    pub total: usize,
    pub no_expiry: usize,
    /// Dates within `[today, today + SOON_DAYS]`.
    pub expiring_soon: usize,
}

fn days_left(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

/// Credentials whose date is no later than `today + days`, expired ones
/// included. Sorted by date, then label.
pub fn expiring_within(
    credentials: &BTreeMap<String, CredentialEntry>,
    days: i64,
    today: NaiveDate,
) -> Vec<ExpiringCredential> {
    let mut expiring: Vec<ExpiringCredential> = credentials
        .iter()
        .filter_map(|(label, entry)| {
            let expiration = entry.expiration?;
            let left = days_left(expiration, today);
            (left <= days).then(|| ExpiringCredential {
                label: label.clone(),
                username: entry.username.clone(),
                expiration,
                days_left: left,
            })
        })
        .collect();

    expiring.sort_by(|a, b| {
        a.expiration
            .cmp(&b.expiration)
            .then_with(|| a.label.cmp(&b.label))
    });
    expiring
}

/// Summarize a credential set.
pub fn stats(credentials: &BTreeMap<String, CredentialEntry>, today: NaiveDate) -> CredentialStats {
    credentials
        .values()
        .fold(CredentialStats::default(), |mut acc, entry| {
            acc.total += 1;
            match entry.expiration {
                None => acc.no_expiry += 1,
                Some(date) if (0..=SOON_DAYS).contains(&days_left(date, today)) => {
                    acc.expiring_soon += 1
                }
                Some(_) => {}
            }
            acc
        })
}

/// Labels whose label or username contains `query`, ignoring case.
pub fn search(credentials: &BTreeMap<String, CredentialEntry>, query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    credentials
        .iter()
        .filter(|(label, entry)| {
            needle.is_empty()
                || label.to_lowercase().contains(&needle)
                || entry.username.to_lowercase().contains(&needle)
        })
        .map(|(label, _)| label.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 1)
    }

    fn vault() -> BTreeMap<String, CredentialEntry> {
        let mut v = BTreeMap::new();
        v.insert("Gmail".into(), CredentialEntry::new("alice@x.com", "s1", Some(date(2024, 6, 5))));
        v.insert("Work".into(), CredentialEntry::new("alice.w", "s2", None));
        v.insert("Bank".into(), CredentialEntry::new("acct-42", "s3", Some(date(2024, 5, 20))));
        v.insert("Forum".into(), CredentialEntry::new("", "s4", Some(date(2024, 6, 25))));
        v.insert("Cloud".into(), CredentialEntry::new("ops", "s5", Some(date(2025, 1, 1))));
        v
    }

    #[test]
    fn test_classify() {
        let t = today();
        assert_eq!(ExpirationStatus::classify(None, t), ExpirationStatus::NoExpiration);
        assert_eq!(ExpirationStatus::classify(Some(date(2024, 5, 31)), t), ExpirationStatus::Expired);
        assert_eq!(ExpirationStatus::classify(Some(t), t), ExpirationStatus::ExpiresIn(0));
        assert_eq!(ExpirationStatus::classify(Some(date(2024, 6, 8)), t), ExpirationStatus::ExpiresIn(7));
        assert_eq!(ExpirationStatus::classify(Some(date(2024, 6, 9)), t), ExpirationStatus::ExpiringSoon(8));
        assert_eq!(ExpirationStatus::classify(Some(date(2024, 7, 1)), t), ExpirationStatus::ExpiringSoon(30));
        assert_eq!(ExpirationStatus::classify(Some(date(2024, 7, 2)), t), ExpirationStatus::Healthy);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ExpirationStatus::ExpiresIn(0).to_string(), "expires today");
        assert_eq!(ExpirationStatus::ExpiresIn(3).to_string(), "expires in 3 day(s)");
        assert_eq!(ExpirationStatus::Expired.to_string(), "expired");
    }

    #[test]
    fn test_expiring_within_sorted_by_date() {
        let found = expiring_within(&vault(), 30, today());
        let labels: Vec<_> = found.iter().map(|e| e.label.as_str()).collect();

        assert_eq!(labels, vec!["Bank", "Gmail", "Forum"]);
        assert_eq!(found[0].days_left, -12);
        assert_eq!(found[1].days_left, 4);
    }

    #[test]
    fn test_expiring_within_narrow_window() {
        let found = expiring_within(&vault(), 7, today());
        let labels: Vec<_> = found.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Bank", "Gmail"]);
    }

    #[test]
    fn test_expiring_ties_break_on_label() {
        let mut v: BTreeMap<String, CredentialEntry> = BTreeMap::new();
        v.insert("b".into(), CredentialEntry::new("", "s", Some(date(2024, 6, 2))));
        v.insert("a".into(), CredentialEntry::new("", "s", Some(date(2024, 6, 2))));

        let found = expiring_within(&v, 1, today());
        assert_eq!(found[0].label, "a");
        assert_eq!(found[1].label, "b");
    }

    #[test]
    fn test_stats() {
        let s = stats(&vault(), today());
        assert_eq!(
            s,
            CredentialStats {
                total: 5,
                no_expiry: 1,
                expiring_soon: 2,
            }
        );
        assert_eq!(stats(&BTreeMap::new(), today()), CredentialStats::default());
    }

    #[test]
    fn test_search_case_insensitive() {
        let v = vault();
        assert_eq!(search(&v, "gMa"), vec!["Gmail"]);
        assert_eq!(search(&v, "ALICE"), vec!["Gmail", "Work"]);
        assert_eq!(search(&v, "").len(), 5);
        assert!(search(&v, "zzz").is_empty());
    }
}
