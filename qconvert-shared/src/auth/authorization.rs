/// Ownership checks for user-owned records
///
/// Every user-owned row carries a `user_id`. Handlers fetch the row by ID,
/// then call one of these checks: a row owned by someone else is
/// `Forbidden`, never silently treated as missing.
///
/// Data files are the one exception to strict ownership: anonymous uploads
/// (NULL owner) are readable by anyone who holds the ID, but only an owner
/// may change or delete a record.

use uuid::Uuid;

use super::identity::Identity;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is authenticated but does not own the record
    #[error("Access denied")]
    NotOwner,

    /// Caller is anonymous and the record has an owner
    #[error("Authentication required")]
    AuthenticationRequired,
}

/// Requires the caller to own a record
pub fn ensure_owner(identity: &Identity, owner_id: Uuid) -> Result<(), AuthzError> {
    if identity.user_id == owner_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Requires the caller to be allowed to act on a record with an optional owner
///
/// Ownerless records are open to everyone; owned records require the owner.
pub fn ensure_access(identity: Option<&Identity>, owner_id: Option<Uuid>) -> Result<(), AuthzError> {
    match (owner_id, identity) {
        (None, _) => Ok(()),
        (Some(owner), Some(identity)) => ensure_owner(identity, owner),
        (Some(_), None) => Err(AuthzError::AuthenticationRequired),
    }
}

/// Requires the caller to own a record with an optional owner
///
/// Used before mutation: ownerless records are read-only.
pub fn ensure_modifiable(identity: &Identity, owner_id: Option<Uuid>) -> Result<(), AuthzError> {
    match owner_id {
        Some(owner) => ensure_owner(identity, owner),
        None => Err(AuthzError::NotOwner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn identity(user_id: Uuid) -> Identity {
        Identity {
            user_id,
            email: "owner@example.com".to_string(),
            name: "Owner".to_string(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_ensure_owner() {
        let owner = Uuid::new_v4();

        assert!(ensure_owner(&identity(owner), owner).is_ok());
        assert_eq!(
            ensure_owner(&identity(Uuid::new_v4()), owner),
            Err(AuthzError::NotOwner)
        );
    }

    #[test]
    fn test_ensure_access_ownerless_record() {
        assert!(ensure_access(None, None).is_ok());
        assert!(ensure_access(Some(&identity(Uuid::new_v4())), None).is_ok());
    }

    #[test]
    fn test_ensure_access_owned_record() {
        let owner = Uuid::new_v4();

        assert!(ensure_access(Some(&identity(owner)), Some(owner)).is_ok());
        assert_eq!(
            ensure_access(Some(&identity(Uuid::new_v4())), Some(owner)),
            Err(AuthzError::NotOwner)
        );
        assert_eq!(
            ensure_access(None, Some(owner)),
            Err(AuthzError::AuthenticationRequired)
        );
    }

    #[test]
    fn test_ensure_modifiable_requires_owner() {
        let owner = Uuid::new_v4();

        assert!(ensure_modifiable(&identity(owner), Some(owner)).is_ok());
        assert_eq!(
            ensure_modifiable(&identity(Uuid::new_v4()), Some(owner)),
            Err(AuthzError::NotOwner)
        );
        assert_eq!(
            ensure_modifiable(&identity(owner), None),
            Err(AuthzError::NotOwner)
        );
    }
}
