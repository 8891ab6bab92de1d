//! Session identity.
//!
//! The chat service keys conversations by user id. The id lives for the
//! process lifetime and is passed explicitly to everything that needs it,
//! rather than living in ambient global state.

use uuid::Uuid;

/// Immutable per-process session identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: String,
}

impl SessionContext {
    /// Create a session with a freshly generated user id.
    pub fn new() -> Self {
        Self {
            user_id: format!("user-{}", Uuid::new_v4()),
        }
    }

    /// Create a session for an externally supplied user id (CLI `--user`).
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// The session's user id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = SessionContext::new();
        let b = SessionContext::new();
        assert_ne!(a.user_id(), b.user_id());
        assert!(a.user_id().starts_with("user-"));
    }

    #[test]
    fn test_explicit_user_id() {
        let session = SessionContext::with_user_id("user-42");
        assert_eq!(session.user_id(), "user-42");
    }
}
