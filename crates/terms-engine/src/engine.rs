use std::net::IpAddr;
use std::sync::Arc;

use crate::active::ActiveVersionResolver;
use crate::cache::EngineCache;
use crate::config::TermsConfig;
use crate::error::EngineError;
use crate::model::{AcceptanceRecord, TermsDocument, TermsId, UserId};
use crate::outstanding::OutstandingPolicyResolver;
use crate::recorder::AcceptanceRecorder;
use crate::store::{AcceptanceStore, PermissionChecker, PolicyStore};

/// The assembled resolution engine: the surface consumers (redirect
/// middleware, templates, mailers) are expected to call.
///
/// Returned vectors are snapshots, not live views; callers must not assume
/// they reflect writes made after the call.
#[derive(Clone)]
pub struct TermsEngine {
    config: TermsConfig,
    active: ActiveVersionResolver,
    outstanding: OutstandingPolicyResolver,
    recorder: AcceptanceRecorder,
}

impl TermsEngine {
    /// Wire the engine together from its configuration and store seams.
    ///
    /// A single cache instance, sized by the configured TTL, is shared by
    /// the resolvers and the recorder so acceptance writes invalidate the
    /// entries the resolvers read.
    pub fn new(
        config: TermsConfig,
        policies: Arc<dyn PolicyStore>,
        acceptances: Arc<dyn AcceptanceStore>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        let cache = Arc::new(EngineCache::new(config.cache_ttl()));
        let active = ActiveVersionResolver::new(policies, cache.clone());
        let outstanding = OutstandingPolicyResolver::new(
            active.clone(),
            acceptances.clone(),
            permissions,
            cache.clone(),
            config.exempt_permission.clone(),
        );
        let recorder = AcceptanceRecorder::new(acceptances, cache, config.store_ip_address);
        Self {
            config,
            active,
            outstanding,
            recorder,
        }
    }

    pub fn config(&self) -> &TermsConfig {
        &self.config
    }

    /// The active version of `slug`, or of the configured default slug when
    /// `slug` is `None`.
    pub fn get_active(&self, slug: Option<&str>) -> Option<TermsDocument> {
        self.active
            .get_active(slug.unwrap_or(&self.config.default_slug))
    }

    /// Identifiers of every slug's active version, slug ascending.
    pub fn get_active_ids(&self) -> Vec<TermsId> {
        self.active.get_active_ids()
    }

    /// Every slug's active version, slug ascending.
    pub fn get_active_list(&self) -> Vec<TermsDocument> {
        self.active.get_active_list()
    }

    /// The documents `user` still needs to see or accept.
    pub fn get_outstanding(&self, user: &UserId, skip_optional: bool) -> Vec<TermsDocument> {
        self.outstanding.get_outstanding(user, skip_optional)
    }

    /// Record that `user` has seen or accepted `doc`.
    pub fn record_seen_or_accepted(
        &self,
        user: &UserId,
        doc: &TermsDocument,
        accepted: bool,
        ip_address: Option<IpAddr>,
    ) -> Result<AcceptanceRecord, EngineError> {
        self.recorder
            .record_seen_or_accepted(user, doc, accepted, ip_address)
    }
}
