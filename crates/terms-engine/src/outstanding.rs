use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{debug, error};

use crate::active::ActiveVersionResolver;
use crate::cache::EngineCache;
use crate::model::{TermsDocument, UserId};
use crate::store::{AcceptanceStore, PermissionChecker};

/// Resolves, per user, the ordered set of active terms the user has not yet
/// satisfied.
///
/// Mandatory documents stay outstanding until accepted; optional documents
/// stay outstanding only until they have been shown once (a record exists,
/// accepted or not).
#[derive(Clone)]
pub struct OutstandingPolicyResolver {
    active: ActiveVersionResolver,
    acceptances: Arc<dyn AcceptanceStore>,
    permissions: Arc<dyn PermissionChecker>,
    cache: Arc<EngineCache>,
    /// Users holding this permission through an explicit grant bypass the
    /// gate entirely.
    exempt_permission: Option<String>,
}

impl OutstandingPolicyResolver {
    pub fn new(
        active: ActiveVersionResolver,
        acceptances: Arc<dyn AcceptanceStore>,
        permissions: Arc<dyn PermissionChecker>,
        cache: Arc<EngineCache>,
        exempt_permission: Option<String>,
    ) -> Self {
        Self {
            active,
            acceptances,
            permissions,
            cache,
            exempt_permission,
        }
    }

    /// The active documents `user` still needs to see or accept, mandatory
    /// first, slug ascending within each group.
    ///
    /// With `skip_optional` set, optional documents are left out entirely;
    /// otherwise optional documents appear until first shown.
    pub fn get_outstanding(&self, user: &UserId, skip_optional: bool) -> Vec<TermsDocument> {
        // Exemption check first, bypassing the cache. The checker only
        // reports explicit grants; an elevated role alone never satisfies
        // this.
        if let Some(perm) = &self.exempt_permission {
            if self.permissions.has_explicit_permission(user, perm) {
                debug!(%user, perm, "user is exempt from the terms gate");
                return Vec::new();
            }
        }

        if let Some(docs) = self.cache.get_outstanding(user, skip_optional) {
            return docs;
        }

        let active = match self.active.try_get_active_list() {
            Ok(active) => active,
            Err(err) => {
                // Same fail-soft rule as below: empty result, never cached,
                // so the next call retries against a healed store.
                error!(%user, %err, "policy store lookup failed; returning no outstanding terms");
                return Vec::new();
            }
        };

        let records = match self.acceptances.find(user, None) {
            Ok(records) => records,
            Err(err) => {
                // Fail soft: an unavailable acceptance store must not block
                // the gating flow, so the caller sees nothing outstanding.
                // The failure is not cached, so the next call retries.
                error!(%user, %err, "acceptance store lookup failed; returning no outstanding terms");
                return Vec::new();
            }
        };

        let mut outstanding: Vec<TermsDocument> = active
            .into_iter()
            .filter(|doc| {
                let record = records.iter().find(|r| r.terms == doc.id);
                // Accepted documents are satisfied regardless of kind.
                if record.is_some_and(|r| r.is_accepted()) {
                    return false;
                }
                if doc.optional {
                    // Optional documents drop out entirely when the caller
                    // skips them, and otherwise drop out once seen.
                    return !skip_optional && record.is_none();
                }
                true
            })
            .collect();

        outstanding.sort_by(|a, b| (a.optional, &a.slug).cmp(&(b.optional, &b.slug)));
        // Some backends collate booleans true-first; if the realized order
        // leads with an optional document, re-sort with the flag descending
        // so mandatory documents always come first.
        if outstanding.first().is_some_and(|d| d.optional) {
            outstanding.sort_by(|a, b| (Reverse(a.optional), &a.slug).cmp(&(Reverse(b.optional), &b.slug)));
        }

        self.cache
            .set_outstanding(user, skip_optional, outstanding.clone());
        outstanding
    }
}
