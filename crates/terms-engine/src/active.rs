use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use crate::cache::EngineCache;
use crate::model::{TermsDocument, TermsId};
use crate::store::{PolicyStore, StoreError};

/// Resolves the currently active version of each terms document.
///
/// Results are cached under the configured time-to-live; activation changes
/// are operator-driven and rare, so the cache is never proactively
/// invalidated and staleness is bounded by the TTL alone.
#[derive(Clone)]
pub struct ActiveVersionResolver {
    store: Arc<dyn PolicyStore>,
    cache: Arc<EngineCache>,
}

impl ActiveVersionResolver {
    pub fn new(store: Arc<dyn PolicyStore>, cache: Arc<EngineCache>) -> Self {
        Self { store, cache }
    }

    /// The active version for `slug`: the qualifying document with the
    /// latest `date_active`.
    ///
    /// `None` is a normal outcome, but usually means the slug was gated on
    /// before any version was activated, so it is logged for operators.
    pub fn get_active(&self, slug: &str) -> Option<TermsDocument> {
        if let Some(doc) = self.cache.get_active_doc(slug) {
            return Some(doc);
        }

        let docs = match self.store.query_active(Some(slug), Utc::now()) {
            Ok(docs) => docs,
            Err(err) => {
                error!(slug, %err, "policy store lookup failed");
                return None;
            }
        };

        match latest(docs) {
            Some(doc) => {
                self.cache.set_active_doc(slug, doc.clone());
                Some(doc)
            }
            None => {
                error!(slug, "requested terms that have no active version");
                None
            }
        }
    }

    /// Identifiers of the active version of every slug, slug ascending.
    ///
    /// Cached independently of [`get_active_list`](Self::get_active_list):
    /// this set only changes when activation timestamps change, and it
    /// doubles as a cheap existence filter.
    pub fn get_active_ids(&self) -> Vec<TermsId> {
        self.try_get_active_ids().unwrap_or_else(|err| {
            error!(%err, "policy store lookup failed");
            Vec::new()
        })
    }

    /// The full records referenced by [`get_active_ids`](Self::get_active_ids),
    /// slug ascending.
    pub fn get_active_list(&self) -> Vec<TermsDocument> {
        self.try_get_active_list().unwrap_or_else(|err| {
            error!(%err, "policy store lookup failed");
            Vec::new()
        })
    }

    /// Failure-aware form of [`get_active_ids`](Self::get_active_ids).
    ///
    /// A store failure is never cached: an empty id set is a valid result
    /// worth keeping for the TTL, an outage is not, and conflating the two
    /// would suppress the gate until the entry expired.
    pub(crate) fn try_get_active_ids(&self) -> Result<Vec<TermsId>, StoreError> {
        if let Some(ids) = self.cache.get_active_ids() {
            return Ok(ids);
        }

        let ids: Vec<TermsId> = self.active_by_slug()?.values().map(|d| d.id).collect();
        self.cache.set_active_ids(ids.clone());
        Ok(ids)
    }

    /// Failure-aware form of [`get_active_list`](Self::get_active_list);
    /// the same no-caching-on-failure rule applies.
    pub(crate) fn try_get_active_list(&self) -> Result<Vec<TermsDocument>, StoreError> {
        if let Some(list) = self.cache.get_active_list() {
            return Ok(list);
        }

        let ids = self.try_get_active_ids()?;
        let list: Vec<TermsDocument> = self
            .active_by_slug()?
            .into_values()
            .filter(|d| ids.contains(&d.id))
            .collect();
        self.cache.set_active_list(list.clone());
        Ok(list)
    }

    /// One document per slug, keyed (and therefore ordered) by slug, each
    /// the latest activated version of that slug.
    fn active_by_slug(&self) -> Result<BTreeMap<String, TermsDocument>, StoreError> {
        let docs = self.store.query_active(None, Utc::now())?;
        debug!(count = docs.len(), "resolving active set");

        let mut by_slug: BTreeMap<String, TermsDocument> = BTreeMap::new();
        for doc in docs {
            match by_slug.get(&doc.slug) {
                Some(current) if !supersedes(&doc, current) => {}
                _ => {
                    by_slug.insert(doc.slug.clone(), doc);
                }
            }
        }
        Ok(by_slug)
    }
}

/// Whether `candidate` wins over `current` as the active version of a slug:
/// latest `date_active` wins, `date_created` breaks ties.
fn supersedes(candidate: &TermsDocument, current: &TermsDocument) -> bool {
    (candidate.date_active, candidate.date_created) > (current.date_active, current.date_created)
}

fn latest(docs: Vec<TermsDocument>) -> Option<TermsDocument> {
    docs.into_iter()
        .max_by_key(|d| (d.date_active, d.date_created))
}
