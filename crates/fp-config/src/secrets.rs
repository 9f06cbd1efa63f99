//! Runtime secret resolution.
//!
//! Config YAML stores only env var NAMES. The daemon resolves them once at
//! startup and passes [`ResolvedSecrets`] into its state; nothing else reads
//! `std::env` for secrets. `Debug` redacts values and errors name the
//! variable, never its value.

use crate::AppConfig;

#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Shared key gating the admin setup endpoints. `None` disables them.
    pub admin_setup_key: Option<String>,
    /// Env var the key was read from, for log lines.
    pub admin_setup_key_env: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "admin_setup_key",
                &self.admin_setup_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field("admin_setup_key_env", &self.admin_setup_key_env)
            .finish()
    }
}

impl ResolvedSecrets {
    /// Constant-time comparison against the configured setup key. Always
    /// false when no key is configured.
    pub fn setup_key_matches(&self, candidate: &str) -> bool {
        let Some(expected) = self.admin_setup_key.as_deref() else {
            return false;
        };
        let (a, b) = (expected.as_bytes(), candidate.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

/// Returns `None` if the variable is unset or its value is blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

pub fn resolve_secrets(cfg: &AppConfig) -> ResolvedSecrets {
    ResolvedSecrets {
        admin_setup_key: resolve_env(&cfg.setup_key_env),
        admin_setup_key_env: cfg.setup_key_env.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_the_key() {
        let s = ResolvedSecrets {
            admin_setup_key: Some("hunter2-setup".to_string()),
            admin_setup_key_env: "FP_ADMIN_SETUP_KEY".to_string(),
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<REDACTED>"));
    }

    #[test]
    fn missing_key_never_matches() {
        let s = ResolvedSecrets {
            admin_setup_key: None,
            admin_setup_key_env: "X".to_string(),
        };
        assert!(!s.setup_key_matches(""));
        assert!(!s.setup_key_matches("anything"));
    }

    #[test]
    fn key_must_match_exactly() {
        let s = ResolvedSecrets {
            admin_setup_key: Some("abc123".to_string()),
            admin_setup_key_env: "X".to_string(),
        };
        assert!(s.setup_key_matches("abc123"));
        assert!(!s.setup_key_matches("abc124"));
        assert!(!s.setup_key_matches("abc12"));
    }
}
