//! Tenant identity types and subdomain validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default prefix joined with the subdomain to form the compose project name.
pub const DEFAULT_PROJECT_PREFIX: &str = "q8-";

/// DNS label limit; subdomains are used as a single label.
pub const MAX_SUBDOMAIN_LEN: usize = 63;

/// Identity of a tenant as supplied by the control plane.
///
/// Only `subdomain` is dereferenced (directory name, project name). `id` is
/// carried through for logs and responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdentity {
    pub id: String,
    pub subdomain: String,
}

/// Configuration files materialized into the tenant directory.
///
/// Contents are opaque and written verbatim.
#[derive(Debug, Clone, Default)]
pub struct ProvisionPayload {
    pub compose_content: String,
    pub env_content: String,
}

/// Build the compose project name for a subdomain.
///
/// The same subdomain must always map to the same project so the engine
/// addresses one container group across provision, restart and teardown.
pub fn project_name(prefix: &str, subdomain: &str) -> String {
    format!("{prefix}{subdomain}")
}

/// Allowed subdomain characters: lowercase ASCII letters, digits and hyphen,
/// no leading or trailing hyphen. Keeps the value usable as a path component
/// and a compose project name (compose rejects uppercase project names).
pub fn is_valid_subdomain(subdomain: &str) -> bool {
    !subdomain.is_empty()
        && subdomain.len() <= MAX_SUBDOMAIN_LEN
        && !subdomain.starts_with('-')
        && !subdomain.ends_with('-')
        && subdomain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Validate a subdomain, returning a [`CoreError::Validation`] on failure.
pub fn validate_subdomain(subdomain: &str) -> Result<(), CoreError> {
    if subdomain.is_empty() {
        return Err(CoreError::Validation("subdomain is required".to_string()));
    }
    if !is_valid_subdomain(subdomain) {
        return Err(CoreError::Validation(format!(
            "Invalid subdomain '{subdomain}': expected 1-{MAX_SUBDOMAIN_LEN} \
             lowercase alphanumeric or '-' characters, not starting or ending with '-'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
