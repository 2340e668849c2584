//! YAML seed loader for terms documents.
//!
//! Document authoring is an external concern; this loader only turns an
//! already-authored YAML fixture into [`TermsDocument`] records, typically
//! to seed a [`MemoryPolicyStore`](crate::memory::MemoryPolicyStore) in
//! tests and small embeddings.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::model::TermsDocument;

/// Load a list of [`TermsDocument`] records from a YAML file on disk.
pub fn load_documents(path: impl AsRef<Path>) -> Result<Vec<TermsDocument>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read terms file: {}", path.display()))?;
    load_documents_from_str(&contents)
        .with_context(|| format!("failed to parse terms file: {}", path.display()))
}

/// Parse and validate a list of [`TermsDocument`] records from a YAML string.
pub fn load_documents_from_str(yaml: &str) -> Result<Vec<TermsDocument>> {
    let docs: Vec<TermsDocument> =
        serde_yml::from_str(yaml).context("YAML deserialization failed")?;
    validate(&docs)?;
    Ok(docs)
}

/// Post-deserialization checks: non-empty slugs and unique (slug, version)
/// pairs. Several versions per slug are expected; duplicates of the same
/// version are almost certainly a copy-paste mistake.
fn validate(docs: &[TermsDocument]) -> Result<()> {
    let mut seen = HashSet::new();
    for doc in docs {
        if doc.slug.is_empty() {
            bail!("terms slug must not be empty");
        }
        let key = format!("{doc}");
        if !seen.insert(key) {
            bail!("duplicate terms version: '{doc}'");
        }
    }
    Ok(())
}
