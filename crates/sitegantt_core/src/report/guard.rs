//! Shared-secret guard for report requests.

use crate::report::service::ReportError;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Compares presented keys against the configured reports key.
#[derive(Clone, Default)]
pub struct ApiKeyGuard {
    expected: Option<String>,
}

impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl ApiKeyGuard {
    /// Creates a guard. Blank keys count as not configured.
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected: expected.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    /// Returns whether `presented` matches the configured key.
    pub fn allows(&self, presented: Option<&str>) -> bool {
        match (self.expected.as_deref(), presented) {
            (Some(expected), Some(presented)) => {
                constant_time_eq(expected.as_bytes(), presented.as_bytes())
            }
            _ => false,
        }
    }

    /// Like [`ApiKeyGuard::allows`], mapping rejection to `Unauthorized`.
    pub fn check(&self, presented: Option<&str>) -> Result<(), ReportError> {
        if self.allows(presented) {
            Ok(())
        } else {
            Err(ReportError::Unauthorized)
        }
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::ApiKeyGuard;
    use crate::report::service::ReportError;

    #[test]
    fn matching_key_is_allowed() {
        let guard = ApiKeyGuard::new(Some("s3cret".to_string()));
        assert!(guard.allows(Some("s3cret")));
        assert!(!guard.allows(Some("s3cre")));
        assert!(!guard.allows(Some("S3CRET")));
        assert!(!guard.allows(None));
        assert!(guard.check(Some("s3cret")).is_ok());
        let err = guard.check(None).unwrap_err();
        assert!(matches!(err, ReportError::Unauthorized));
        assert!(err.to_string().contains("x-api-key"));
    }

    #[test]
    fn unconfigured_guard_rejects_everything() {
        let guard = ApiKeyGuard::new(Some("  ".to_string()));
        assert!(!guard.is_configured());
        assert!(!guard.allows(Some("  ")));
        assert!(!ApiKeyGuard::default().allows(Some("")));
    }

    #[test]
    fn debug_output_hides_key() {
        let guard = ApiKeyGuard::new(Some("s3cret".to_string()));
        assert!(!format!("{guard:?}").contains("s3cret"));
    }
}
