use chrono::{DateTime, Utc};

use crate::model::{AcceptanceRecord, TermsDocument, TermsId, UserId};

/// Errors a store implementation may surface.
///
/// `NotFound` and `DuplicateKey` are distinguishable outcomes the engine
/// handles locally; `Unavailable` marks a transient backend failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to terms documents.
///
/// Implementations live outside the engine (the in-memory variant in
/// [`crate::memory`] is the reference implementation used by the tests).
pub trait PolicyStore: Send + Sync {
    /// Every document whose `date_active` is non-null and at or before
    /// `now`, optionally restricted to one slug. Order is unspecified; the
    /// resolvers sort in application code.
    fn query_active(
        &self,
        slug: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TermsDocument>, StoreError>;
}

/// Read/write access to per-user acceptance records.
///
/// Implementations must enforce uniqueness of the (user, terms) composite
/// identity: a second insert for the same pair fails with
/// [`StoreError::DuplicateKey`] rather than creating a second record.
pub trait AcceptanceStore: Send + Sync {
    /// Records for `user`, optionally restricted to the given document ids.
    fn find(
        &self,
        user: &UserId,
        terms: Option<&[TermsId]>,
    ) -> Result<Vec<AcceptanceRecord>, StoreError>;

    /// Insert a new record. Fails with [`StoreError::DuplicateKey`] if one
    /// already exists for the (user, terms) pair.
    fn insert(&self, record: AcceptanceRecord) -> Result<(), StoreError>;

    /// Replace the existing record for the (user, terms) pair. Fails with
    /// [`StoreError::NotFound`] if there is none.
    fn update(&self, record: AcceptanceRecord) -> Result<(), StoreError>;
}

/// Caller-supplied permission check used for the exemption rule.
pub trait PermissionChecker: Send + Sync {
    /// Whether `user` holds `permission` through an explicit grant.
    ///
    /// Implementations must not report `true` solely because the user has
    /// an elevated role; superuser status never implicitly satisfies the
    /// exemption check.
    fn has_explicit_permission(&self, user: &UserId, permission: &str) -> bool;
}
