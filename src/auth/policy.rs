use std::fmt::Display;

use tracing::warn;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

fn normalize(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Ownership rule shared by posts, comments and profiles.
pub fn authorize(actor_id: &str, owner_id: &str) -> Access {
    if normalize(actor_id) == normalize(owner_id) {
        Access::Allow
    } else {
        Access::Deny
    }
}

/// Fails with `Forbidden(denied)` unless `actor` owns the resource.
pub fn require_owner(
    actor: impl Display,
    owner: impl Display,
    denied: &'static str,
) -> Result<(), AppError> {
    let (actor, owner) = (actor.to_string(), owner.to_string());
    match authorize(&actor, &owner) {
        Access::Allow => Ok(()),
        Access::Deny => {
            warn!(actor = %actor, owner = %owner, "ownership check denied");
            Err(AppError::Forbidden(denied))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn same_identity_is_allowed() {
        let id = Uuid::new_v4();
        assert_eq!(authorize(&id.to_string(), &id.to_string()), Access::Allow);
    }

    #[test]
    fn comparison_is_normalized() {
        let id = Uuid::new_v4().to_string();
        let shouted = format!("  {}  ", id.to_uppercase());
        assert_eq!(authorize(&id, &shouted), Access::Allow);
    }

    #[test]
    fn other_identity_is_denied() {
        let a = Uuid::new_v4().to_string();
        let b = Uuid::new_v4().to_string();
        assert_eq!(authorize(&a, &b), Access::Deny);
        assert_eq!(authorize(&a, "not-an-id"), Access::Deny);
    }

    #[test]
    fn require_owner_maps_deny_to_forbidden() {
        let err = require_owner(Uuid::new_v4(), Uuid::new_v4(), "Not authorized").unwrap_err();
        assert!(matches!(err, AppError::Forbidden("Not authorized")));
        let me = Uuid::new_v4();
        assert!(require_owner(me, me, "Not authorized").is_ok());
    }
}
