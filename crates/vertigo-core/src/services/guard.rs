//! Ownership checks shared by every mutating post operation.

use uuid::Uuid;

use crate::domain::Post;
use crate::error::DomainError;

/// A record that belongs to exactly one account.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Post {
    fn owner_id(&self) -> Uuid {
        self.author
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The actor owns the resource and may mutate or delete it.
    Owner,
    Denied,
}

impl Capability {
    pub fn require_owner(self) -> Result<(), DomainError> {
        match self {
            Self::Owner => Ok(()),
            Self::Denied => Err(DomainError::Unauthorized),
        }
    }
}

pub fn authorize<R: Owned + ?Sized>(actor: Uuid, resource: &R) -> Capability {
    if resource.owner_id() == actor {
        Capability::Owner
    } else {
        Capability::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_is_owner() {
        let author = Uuid::new_v4();
        let post = Post::new(author, "t".into(), "c".into(), "t".into(), "c".into());

        assert_eq!(authorize(author, &post), Capability::Owner);
        assert!(authorize(author, &post).require_owner().is_ok());
    }

    #[test]
    fn test_stranger_is_denied() {
        let post = Post::new(Uuid::new_v4(), "t".into(), "c".into(), "t".into(), "c".into());

        let capability = authorize(Uuid::new_v4(), &post);

        assert_eq!(capability, Capability::Denied);
        assert!(matches!(
            capability.require_owner(),
            Err(DomainError::Unauthorized)
        ));
    }
}
