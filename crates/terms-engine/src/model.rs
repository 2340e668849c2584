use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of one [`TermsDocument`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermsId(uuid::Uuid);

impl TermsId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for TermsId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TermsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Caller-supplied opaque user identifier.
///
/// The engine never interprets this beyond equality; authentication and
/// session handling live outside the engine entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One versioned terms-and-conditions document.
///
/// All versions of a policy share a `slug`; the active version for a slug is
/// the one with the latest `date_active` that is non-null and not in the
/// future. Documents are authored externally and never mutated or deleted by
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsDocument {
    #[serde(default)]
    pub id: TermsId,
    pub slug: String,
    pub name: String,
    /// Two-fractional-digit version, monotonic per slug by convention only.
    #[serde(default = "default_version")]
    pub version_number: f64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    /// Null means draft (never activated); a future value means not yet
    /// active.
    #[serde(default)]
    pub date_active: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub date_created: DateTime<Utc>,
    /// Optional documents only need to be shown once; mandatory documents
    /// require acceptance.
    #[serde(default)]
    pub optional: bool,
}

fn default_version() -> f64 {
    1.0
}

impl TermsDocument {
    /// Whether this document counts toward the active set at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.date_active, Some(active) if active <= now)
    }
}

impl fmt::Display for TermsDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:.2}", self.slug, self.version_number)
    }
}

/// The durable fact that a user has seen and/or accepted one specific
/// document version.
///
/// Exactly one record exists per (user, terms) pair; a second write for the
/// same pair updates the first. For a mandatory document `date_accepted`
/// must be set; for an optional document a null `date_accepted` means "seen
/// but not accepted".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceRecord {
    pub user: UserId,
    pub terms: TermsId,
    /// Informational only; never consulted by resolution.
    #[serde(default)]
    pub ip_address: Option<IpAddr>,
    #[serde(default)]
    pub date_accepted: Option<DateTime<Utc>>,
}

impl AcceptanceRecord {
    pub fn is_accepted(&self) -> bool {
        self.date_accepted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(slug: &str, version: f64, date_active: Option<DateTime<Utc>>) -> TermsDocument {
        TermsDocument {
            id: TermsId::new(),
            slug: slug.to_string(),
            name: slug.to_string(),
            version_number: version,
            text: None,
            info: None,
            date_active,
            date_created: Utc::now(),
            optional: false,
        }
    }

    #[test]
    fn display_includes_slug_and_two_decimal_version() {
        let d = doc("site-terms", 2.0, None);
        assert_eq!(d.to_string(), "site-terms-2.00");

        let d = doc("contrib-terms", 1.5, None);
        assert_eq!(d.to_string(), "contrib-terms-1.50");
    }

    #[test]
    fn draft_document_is_never_active() {
        let d = doc("site-terms", 1.0, None);
        assert!(!d.is_active_at(Utc::now()));
    }

    #[test]
    fn future_activation_is_not_yet_active() {
        let future = Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap();
        let d = doc("site-terms", 1.0, Some(future));
        assert!(!d.is_active_at(Utc::now()));
    }

    #[test]
    fn past_activation_is_active() {
        let past = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        let d = doc("site-terms", 1.0, Some(past));
        assert!(d.is_active_at(Utc::now()));
    }

    #[test]
    fn acceptance_record_acceptance_state() {
        let mut record = AcceptanceRecord {
            user: UserId::from("user1"),
            terms: TermsId::new(),
            ip_address: None,
            date_accepted: None,
        };
        assert!(!record.is_accepted());

        record.date_accepted = Some(Utc::now());
        assert!(record.is_accepted());
    }
}
