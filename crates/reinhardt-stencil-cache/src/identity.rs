//! Template identities derived from name and content

use reinhardt_stencil_core::TemplateIdentity;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a template source
pub fn content_hash(source: &str) -> String {
	hex::encode(Sha256::digest(source.as_bytes()))
}

/// Identity of a named template with the given source
///
/// Editing the source yields a new identity, so stale compiled units are never
/// served for changed templates.
///
/// # Examples
///
/// ```
/// use reinhardt_stencil_cache::identity_for;
///
/// let first = identity_for("page.html", "<h1>{title}</h1>");
/// let edited = identity_for("page.html", "<h2>{title}</h2>");
///
/// assert!(first.as_str().starts_with("page.html@"));
/// assert_ne!(first, edited);
/// assert_eq!(first, identity_for("page.html", "<h1>{title}</h1>"));
/// ```
pub fn identity_for(name: &str, source: &str) -> TemplateIdentity {
	TemplateIdentity::new(format!("{}@{}", name, content_hash(source)))
}
