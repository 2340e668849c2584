//! In-memory store implementations.
//!
//! These back the test suite and small embeddings; production deployments
//! are expected to provide their own [`PolicyStore`] / [`AcceptanceStore`]
//! over a real database.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::model::{AcceptanceRecord, TermsDocument, TermsId, UserId};
use crate::store::{AcceptanceStore, PermissionChecker, PolicyStore, StoreError};

/// A [`PolicyStore`] over a plain vector of documents.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    docs: RwLock<Vec<TermsDocument>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-seeded with `docs`.
    pub fn with_documents(docs: Vec<TermsDocument>) -> Self {
        Self {
            docs: RwLock::new(docs),
        }
    }

    /// Append one document.
    pub fn add(&self, doc: TermsDocument) {
        self.write().push(doc);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<TermsDocument>> {
        self.docs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<TermsDocument>> {
        self.docs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn query_active(
        &self,
        slug: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TermsDocument>, StoreError> {
        let docs = self.read();
        Ok(docs
            .iter()
            .filter(|d| d.is_active_at(now))
            .filter(|d| slug.map_or(true, |s| d.slug == s))
            .cloned()
            .collect())
    }
}

/// An [`AcceptanceStore`] over a map keyed by the (user, terms) composite
/// identity, which gives the uniqueness constraint for free.
#[derive(Debug, Default)]
pub struct MemoryAcceptanceStore {
    records: RwLock<HashMap<(UserId, TermsId), AcceptanceRecord>>,
}

impl MemoryAcceptanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<(UserId, TermsId), AcceptanceRecord>> {
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<(UserId, TermsId), AcceptanceRecord>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AcceptanceStore for MemoryAcceptanceStore {
    fn find(
        &self,
        user: &UserId,
        terms: Option<&[TermsId]>,
    ) -> Result<Vec<AcceptanceRecord>, StoreError> {
        let records = self.read();
        Ok(records
            .values()
            .filter(|r| &r.user == user)
            .filter(|r| terms.map_or(true, |ids| ids.contains(&r.terms)))
            .cloned()
            .collect())
    }

    fn insert(&self, record: AcceptanceRecord) -> Result<(), StoreError> {
        let key = (record.user.clone(), record.terms);
        let mut records = self.write();
        if records.contains_key(&key) {
            return Err(StoreError::DuplicateKey(format!(
                "{}:{}",
                record.user, record.terms
            )));
        }
        records.insert(key, record);
        Ok(())
    }

    fn update(&self, record: AcceptanceRecord) -> Result<(), StoreError> {
        let key = (record.user.clone(), record.terms);
        let mut records = self.write();
        match records.get_mut(&key) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

/// A [`PermissionChecker`] over a set of explicit (user, permission) grants.
///
/// There is deliberately no notion of roles here: only grants added through
/// [`grant`](Self::grant) count, which is exactly the contract the
/// exemption check requires.
#[derive(Debug, Default)]
pub struct MemoryPermissions {
    grants: RwLock<HashSet<(UserId, String)>>,
}

impl MemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicit grant of `permission` to `user`.
    pub fn grant(&self, user: &UserId, permission: &str) {
        self.grants
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((user.clone(), permission.to_string()));
    }
}

impl PermissionChecker for MemoryPermissions {
    fn has_explicit_permission(&self, user: &UserId, permission: &str) -> bool {
        self.grants
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&(user.clone(), permission.to_string()))
    }
}
