use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::cache::EngineCache;
use crate::error::EngineError;
use crate::model::{AcceptanceRecord, TermsDocument, UserId};
use crate::store::{AcceptanceStore, StoreError};

/// Writes and updates acceptance records, keeping the outstanding cache
/// consistent with every write.
#[derive(Clone)]
pub struct AcceptanceRecorder {
    store: Arc<dyn AcceptanceStore>,
    cache: Arc<EngineCache>,
    /// When off, the caller-supplied address is discarded instead of
    /// persisted. Resolution logic never reads it either way.
    store_ip: bool,
}

impl AcceptanceRecorder {
    pub fn new(store: Arc<dyn AcceptanceStore>, cache: Arc<EngineCache>, store_ip: bool) -> Self {
        Self {
            store,
            cache,
            store_ip,
        }
    }

    /// Record that `user` has seen (and, with `accepted`, accepted) `doc`.
    ///
    /// A first write creates the record; a later write updates it, moving
    /// `date_accepted` forward from null to a timestamp but never clearing
    /// an acceptance that already happened. Recording a mandatory document
    /// with `accepted == false` is a precondition violation and is rejected
    /// before anything reaches the store.
    ///
    /// On success the user's outstanding cache entries (both flag variants)
    /// are invalidated, so the next resolution recomputes.
    pub fn record_seen_or_accepted(
        &self,
        user: &UserId,
        doc: &TermsDocument,
        accepted: bool,
        ip_address: Option<IpAddr>,
    ) -> Result<AcceptanceRecord, EngineError> {
        if !accepted && !doc.optional {
            return Err(EngineError::MandatoryNotAccepted(doc.to_string()));
        }

        let record = AcceptanceRecord {
            user: user.clone(),
            terms: doc.id,
            ip_address: self.store_ip.then_some(ip_address).flatten(),
            date_accepted: accepted.then(Utc::now),
        };

        let stored = match self.store.find(user, Some(&[doc.id]))?.into_iter().next() {
            Some(existing) => self.merge_and_update(existing, record)?,
            None => match self.store.insert(record.clone()) {
                Ok(()) => {
                    info!(%user, terms = %doc, accepted, "acceptance record created");
                    record
                }
                // A concurrent writer got there first; converge on update.
                Err(StoreError::DuplicateKey(_)) => {
                    debug!(%user, terms = %doc, "lost insert race, updating instead");
                    match self.store.find(user, Some(&[doc.id]))?.into_iter().next() {
                        Some(existing) => self.merge_and_update(existing, record)?,
                        None => return Err(StoreError::NotFound.into()),
                    }
                }
                Err(err) => return Err(err.into()),
            },
        };

        self.cache.invalidate_outstanding(user);
        Ok(stored)
    }

    /// Apply `incoming` on top of `existing`: acceptance timestamps only
    /// move forward (null to set), and an already-stored address is kept
    /// unless a new one arrives.
    fn merge_and_update(
        &self,
        existing: AcceptanceRecord,
        incoming: AcceptanceRecord,
    ) -> Result<AcceptanceRecord, EngineError> {
        let merged = AcceptanceRecord {
            user: existing.user.clone(),
            terms: existing.terms,
            ip_address: incoming.ip_address.or(existing.ip_address),
            date_accepted: existing.date_accepted.or(incoming.date_accepted),
        };
        self.store.update(merged.clone())?;
        info!(user = %merged.user, accepted = merged.is_accepted(), "acceptance record updated");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::memory::MemoryAcceptanceStore;
    use crate::model::{TermsDocument, TermsId};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn doc(slug: &str, optional: bool) -> TermsDocument {
        TermsDocument {
            id: TermsId::new(),
            slug: slug.to_string(),
            name: slug.to_string(),
            version_number: 2.0,
            text: None,
            info: None,
            date_active: Some(at(2012, 1, 5)),
            date_created: at(2011, 12, 1),
            optional,
        }
    }

    fn recorder(store_ip: bool) -> (AcceptanceRecorder, Arc<MemoryAcceptanceStore>, Arc<EngineCache>) {
        let store = Arc::new(MemoryAcceptanceStore::new());
        let cache = Arc::new(EngineCache::new(Duration::from_secs(30)));
        (
            AcceptanceRecorder::new(store.clone(), cache.clone(), store_ip),
            store,
            cache,
        )
    }

    fn localhost() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    #[test]
    fn accepting_creates_a_record_with_a_timestamp() {
        let (recorder, store, _) = recorder(true);
        let user = UserId::from("user1");
        let doc = doc("site-terms", false);

        let record = recorder
            .record_seen_or_accepted(&user, &doc, true, Some(localhost()))
            .unwrap();
        assert!(record.is_accepted());
        assert_eq!(record.ip_address, Some(localhost()));

        let stored = store.find(&user, Some(&[doc.id])).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_accepted());
    }

    #[test]
    fn mandatory_document_cannot_be_merely_seen() {
        let (recorder, store, _) = recorder(true);
        let user = UserId::from("user1");
        let doc = doc("site-terms", false);

        let err = recorder
            .record_seen_or_accepted(&user, &doc, false, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::MandatoryNotAccepted(_)));
        // The invalid record must never reach storage.
        assert!(store.find(&user, None).unwrap().is_empty());
    }

    #[test]
    fn optional_document_can_be_seen_without_acceptance() {
        let (recorder, store, _) = recorder(true);
        let user = UserId::from("user1");
        let doc = doc("optional-terms", true);

        let record = recorder
            .record_seen_or_accepted(&user, &doc, false, None)
            .unwrap();
        assert!(!record.is_accepted());
        assert_eq!(store.find(&user, None).unwrap().len(), 1);
    }

    #[test]
    fn later_acceptance_fills_in_the_timestamp() {
        let (recorder, store, _) = recorder(true);
        let user = UserId::from("user1");
        let doc = doc("optional-terms", true);

        recorder
            .record_seen_or_accepted(&user, &doc, false, None)
            .unwrap();
        let updated = recorder
            .record_seen_or_accepted(&user, &doc, true, None)
            .unwrap();
        assert!(updated.is_accepted());

        // Still one record for the pair.
        assert_eq!(store.find(&user, None).unwrap().len(), 1);
    }

    #[test]
    fn acceptance_is_never_cleared_by_a_later_seen_write() {
        let (recorder, _, _) = recorder(true);
        let user = UserId::from("user1");
        let doc = doc("optional-terms", true);

        let accepted = recorder
            .record_seen_or_accepted(&user, &doc, true, None)
            .unwrap();
        let after = recorder
            .record_seen_or_accepted(&user, &doc, false, None)
            .unwrap();
        assert_eq!(after.date_accepted, accepted.date_accepted);
    }

    #[test]
    fn ip_address_is_dropped_when_the_toggle_is_off() {
        let (recorder, store, _) = recorder(false);
        let user = UserId::from("user1");
        let doc = doc("site-terms", false);

        recorder
            .record_seen_or_accepted(&user, &doc, true, Some(localhost()))
            .unwrap();
        let stored = store.find(&user, None).unwrap();
        assert_eq!(stored[0].ip_address, None);
    }

    #[test]
    fn write_invalidates_both_outstanding_cache_variants() {
        let (recorder, _, cache) = recorder(true);
        let user = UserId::from("user1");
        let doc = doc("site-terms", false);

        cache.set_outstanding(&user, false, vec![doc.clone()]);
        cache.set_outstanding(&user, true, vec![doc.clone()]);

        recorder
            .record_seen_or_accepted(&user, &doc, true, None)
            .unwrap();

        assert!(cache.get_outstanding(&user, false).is_none());
        assert!(cache.get_outstanding(&user, true).is_none());
    }

    #[test]
    fn lost_insert_race_converges_on_update() {
        // A store that reports "no record" on the first read but rejects the
        // insert, as a concurrent writer would cause.
        struct RacyStore {
            inner: MemoryAcceptanceStore,
            raced: std::sync::atomic::AtomicBool,
        }
        impl AcceptanceStore for RacyStore {
            fn find(
                &self,
                user: &UserId,
                terms: Option<&[TermsId]>,
            ) -> Result<Vec<AcceptanceRecord>, StoreError> {
                if !self.raced.load(std::sync::atomic::Ordering::SeqCst) {
                    return Ok(Vec::new());
                }
                self.inner.find(user, terms)
            }
            fn insert(&self, record: AcceptanceRecord) -> Result<(), StoreError> {
                // The concurrent writer's seen-only record lands first.
                self.raced.store(true, std::sync::atomic::Ordering::SeqCst);
                self.inner
                    .insert(AcceptanceRecord {
                        date_accepted: None,
                        ..record.clone()
                    })
                    .unwrap();
                Err(StoreError::DuplicateKey("raced".to_string()))
            }
            fn update(&self, record: AcceptanceRecord) -> Result<(), StoreError> {
                self.inner.update(record)
            }
        }

        let store = Arc::new(RacyStore {
            inner: MemoryAcceptanceStore::new(),
            raced: std::sync::atomic::AtomicBool::new(false),
        });
        let cache = Arc::new(EngineCache::new(Duration::from_secs(30)));
        let recorder = AcceptanceRecorder::new(store.clone(), cache, true);
        let user = UserId::from("user1");
        let doc = doc("optional-terms", true);

        let record = recorder
            .record_seen_or_accepted(&user, &doc, true, None)
            .unwrap();
        assert!(record.is_accepted());
        assert_eq!(store.inner.find(&user, None).unwrap().len(), 1);
        assert!(store.inner.find(&user, None).unwrap()[0].is_accepted());
    }
}
