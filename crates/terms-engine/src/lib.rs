//! # terms-engine
//!
//! Resolution engine for versioned terms-and-conditions gating: decides
//! which policy document version is currently active per slug, which active
//! documents a given user has not yet satisfied (mandatory documents need
//! acceptance, optional documents only need to have been shown once), and
//! keeps a TTL-bounded cache of both results consistent with acceptance
//! writes.
//!
//! HTTP handling, templating, email, and document authoring live elsewhere;
//! this crate only consumes the [`store`] contracts and exposes the
//! [`TermsEngine`] surface those layers call.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use terms_engine::{loader, TermsConfig, TermsEngine, UserId};
//! use terms_engine::memory::{MemoryAcceptanceStore, MemoryPermissions, MemoryPolicyStore};
//!
//! let docs = loader::load_documents_from_str(r#"
//! - slug: "site-terms"
//!   name: "Site Terms"
//!   version_number: 2.0
//!   date_active: "2012-01-05T00:00:00Z"
//! "#).unwrap();
//!
//! let engine = TermsEngine::new(
//!     TermsConfig::default(),
//!     Arc::new(MemoryPolicyStore::with_documents(docs)),
//!     Arc::new(MemoryAcceptanceStore::new()),
//!     Arc::new(MemoryPermissions::new()),
//! );
//!
//! let user = UserId::from("user1");
//! let outstanding = engine.get_outstanding(&user, false);
//! assert_eq!(outstanding.len(), 1);
//! ```

mod active;
mod cache;
pub mod config;
mod engine;
mod error;
pub mod loader;
pub mod memory;
mod model;
mod outstanding;
mod recorder;
pub mod store;

// Re-export primary public API at crate root.
pub use active::ActiveVersionResolver;
pub use cache::{EngineCache, OutstandingKey};
pub use config::TermsConfig;
pub use engine::TermsEngine;
pub use error::EngineError;
pub use model::{AcceptanceRecord, TermsDocument, TermsId, UserId};
pub use outstanding::OutstandingPolicyResolver;
pub use recorder::AcceptanceRecorder;
