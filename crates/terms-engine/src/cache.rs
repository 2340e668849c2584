use std::time::Duration;

use result_cache::{TtlCache, TtlSlot};

use crate::model::{TermsDocument, TermsId, UserId};

/// Cache key for one outstanding-terms result.
///
/// The two `skip_optional` variants differ in both membership and ordering,
/// so each gets its own entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutstandingKey {
    pub user: UserId,
    pub skip_optional: bool,
}

/// Domain-typed facade over the generic TTL caches.
///
/// Two scopes exist: the active-set caches are global (per slug at most),
/// while the outstanding cache is keyed per (user, skip_optional). The
/// resolvers hold an `Arc` to this facade rather than any process-wide
/// singleton, and the recorder invalidates through it.
#[derive(Debug)]
pub struct EngineCache {
    active_doc: TtlCache<String, TermsDocument>,
    active_ids: TtlSlot<Vec<TermsId>>,
    active_list: TtlSlot<Vec<TermsDocument>>,
    outstanding: TtlCache<OutstandingKey, Vec<TermsDocument>>,
}

impl EngineCache {
    /// Create a cache whose entries all share `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            active_doc: TtlCache::new(ttl),
            active_ids: TtlSlot::new(ttl),
            active_list: TtlSlot::new(ttl),
            outstanding: TtlCache::new(ttl),
        }
    }

    // -- Active-set caches (global scope) ------------------------------------

    pub fn get_active_doc(&self, slug: &str) -> Option<TermsDocument> {
        self.active_doc.get(&slug.to_string())
    }

    pub fn set_active_doc(&self, slug: &str, doc: TermsDocument) {
        self.active_doc.set(slug.to_string(), doc);
    }

    pub fn get_active_ids(&self) -> Option<Vec<TermsId>> {
        self.active_ids.get()
    }

    pub fn set_active_ids(&self, ids: Vec<TermsId>) {
        self.active_ids.set(ids);
    }

    pub fn get_active_list(&self) -> Option<Vec<TermsDocument>> {
        self.active_list.get()
    }

    pub fn set_active_list(&self, list: Vec<TermsDocument>) {
        self.active_list.set(list);
    }

    // -- Outstanding cache (per user and flag) -------------------------------

    pub fn get_outstanding(&self, user: &UserId, skip_optional: bool) -> Option<Vec<TermsDocument>> {
        self.outstanding.get(&OutstandingKey {
            user: user.clone(),
            skip_optional,
        })
    }

    pub fn set_outstanding(&self, user: &UserId, skip_optional: bool, docs: Vec<TermsDocument>) {
        self.outstanding.set(
            OutstandingKey {
                user: user.clone(),
                skip_optional,
            },
            docs,
        );
    }

    /// Drop both flag variants of the user's outstanding entry. Called after
    /// every acceptance write; the active-set caches are unrelated and stay.
    pub fn invalidate_outstanding(&self, user: &UserId) {
        for skip_optional in [false, true] {
            self.outstanding.invalidate(&OutstandingKey {
                user: user.clone(),
                skip_optional,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(slug: &str) -> TermsDocument {
        TermsDocument {
            id: TermsId::new(),
            slug: slug.to_string(),
            name: slug.to_string(),
            version_number: 1.0,
            text: None,
            info: None,
            date_active: Some(Utc::now()),
            date_created: Utc::now(),
            optional: false,
        }
    }

    #[test]
    fn outstanding_entries_are_independent_per_flag() {
        let cache = EngineCache::new(Duration::from_secs(60));
        let user = UserId::from("user1");

        cache.set_outstanding(&user, false, vec![doc("a"), doc("b")]);
        cache.set_outstanding(&user, true, vec![doc("a")]);

        assert_eq!(cache.get_outstanding(&user, false).unwrap().len(), 2);
        assert_eq!(cache.get_outstanding(&user, true).unwrap().len(), 1);
    }

    #[test]
    fn invalidate_outstanding_clears_both_flags_for_one_user_only() {
        let cache = EngineCache::new(Duration::from_secs(60));
        let user1 = UserId::from("user1");
        let user2 = UserId::from("user2");

        cache.set_outstanding(&user1, false, vec![doc("a")]);
        cache.set_outstanding(&user1, true, vec![doc("a")]);
        cache.set_outstanding(&user2, false, vec![doc("a")]);

        cache.invalidate_outstanding(&user1);

        assert!(cache.get_outstanding(&user1, false).is_none());
        assert!(cache.get_outstanding(&user1, true).is_none());
        assert!(cache.get_outstanding(&user2, false).is_some());
    }

    #[test]
    fn invalidating_outstanding_leaves_active_caches_alone() {
        let cache = EngineCache::new(Duration::from_secs(60));
        let user = UserId::from("user1");

        cache.set_active_list(vec![doc("a")]);
        cache.set_active_doc("a", doc("a"));
        cache.invalidate_outstanding(&user);

        assert!(cache.get_active_list().is_some());
        assert!(cache.get_active_doc("a").is_some());
    }
}
