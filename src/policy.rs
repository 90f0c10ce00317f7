//! Ownership rule: only a record's owner may change it.

use crate::{auth::CallerId, error::AppError};

pub fn can_mutate(owner_id: i64, caller: CallerId) -> bool {
    owner_id == caller.0
}

/// Guard for handlers; call it before any write.
pub fn ensure_owner(owner_id: i64, caller: CallerId, message: &str) -> Result<(), AppError> {
    if can_mutate(owner_id, caller) {
        Ok(())
    } else {
        tracing::warn!(owner_id, caller_id = caller.0, "ownership check failed");
        Err(AppError::Unauthorized(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_mutate() {
        assert!(can_mutate(7, CallerId(7)));
        assert!(ensure_owner(7, CallerId(7), "access denied").is_ok());
    }

    #[test]
    fn anyone_else_may_not() {
        assert!(!can_mutate(7, CallerId(8)));
        let err = ensure_owner(7, CallerId(8), "access denied").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "access denied"));
    }
}
