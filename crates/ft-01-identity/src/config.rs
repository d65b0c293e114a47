//! Identity directory configuration.

/// Configuration for the identity directory.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Prefixes that mark a string as a full id rather than an alias.
    pub full_id_prefixes: Vec<String>,
    /// Maximum alias length in bytes.
    pub max_alias_length: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            // Plain and base64-encoded X.509 identity strings
            full_id_prefixes: vec!["x509::".to_string(), "eDUwOTo6".to_string()],
            max_alias_length: 256,
        }
    }
}

impl IdentityConfig {
    /// True when `candidate` is shaped like a full id.
    #[must_use]
    pub fn is_full_id(&self, candidate: &str) -> bool {
        self.full_id_prefixes
            .iter()
            .any(|p| candidate.starts_with(p.as_str()))
    }
}
