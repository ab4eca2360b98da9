//! Access control: actors, capabilities and the authorization policies that
//! gate every resource operation.
//!
//! Authorization is orthogonal to validation. A policy is consulted twice for
//! operations on an existing record: once before the record is loaded
//! (`target = None`) and once with the loaded record, so ownership rules can
//! inspect it. Both checks run before any validation or persistence.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;

/// A named permission grantable to a user independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CanView,
    CanCreate,
    CanEdit,
    CanDelete,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::CanView,
        Capability::CanCreate,
        Capability::CanEdit,
        Capability::CanDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanView => "can_view",
            Capability::CanCreate => "can_create",
            Capability::CanEdit => "can_edit",
            Capability::CanDelete => "can_delete",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!("unknown capability '{s}' (expected can_view, can_create, can_edit or can_delete)")
            })
    }
}

/// The kind of operation being attempted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl Operation {
    /// Safe operations never mutate state.
    pub fn is_safe(&self) -> bool {
        matches!(self, Operation::List | Operation::Retrieve)
    }

    pub fn required_capability(&self) -> Capability {
        match self {
            Operation::List | Operation::Retrieve => Capability::CanView,
            Operation::Create => Capability::CanCreate,
            Operation::Update | Operation::PartialUpdate => Capability::CanEdit,
            Operation::Delete => Capability::CanDelete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Retrieve => "retrieve",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::PartialUpdate => "partial_update",
            Operation::Delete => "delete",
        }
    }
}

/// An authenticated identity as seen by the authorization layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub capabilities: BTreeSet<Capability>,
}

impl Principal {
    /// Superusers implicitly hold every capability.
    pub fn has(&self, capability: Capability) -> bool {
        self.is_superuser || self.capabilities.contains(&capability)
    }
}

/// Whoever issued the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Actor {
    #[default]
    Anonymous,
    User(Principal),
}

impl Actor {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::User(p) => Some(p),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.principal().map(|p| p.id)
    }

    /// Returns the principal or fails with [`AppError::Unauthorized`].
    pub fn require_authenticated(&self) -> Result<&Principal, AppError> {
        self.principal().ok_or_else(not_authenticated)
    }
}

/// Records that have an owning user.
pub trait Owned {
    fn owner_id(&self) -> Option<i64> {
        None
    }
}

/// Decides whether an actor may perform an operation, optionally on a
/// specific record.
pub trait Authorizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] when an identity is required but absent,
    /// [`AppError::Forbidden`] when the identity lacks capability or ownership.
    fn authorize(
        &self,
        actor: &Actor,
        operation: Operation,
        target: Option<&dyn Owned>,
    ) -> Result<(), AppError>;
}

fn not_authenticated() -> AppError {
    AppError::unauthorized(
        "Authentication credentials were not provided.",
        json!({}),
    )
}

fn permission_denied(operation: Operation) -> AppError {
    AppError::forbidden(
        "You do not have permission to perform this action.",
        json!({ "operation": operation.as_str() }),
    )
}

/// Every operation requires an authenticated actor holding the matching capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityGate;

impl Authorizer for CapabilityGate {
    fn name(&self) -> &'static str {
        "capability"
    }

    fn authorize(
        &self,
        actor: &Actor,
        operation: Operation,
        _target: Option<&dyn Owned>,
    ) -> Result<(), AppError> {
        let principal = actor.require_authenticated()?;
        if principal.has(operation.required_capability()) {
            Ok(())
        } else {
            Err(permission_denied(operation))
        }
    }
}

/// Reads are open to anyone; writes need an authenticated actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedOrReadOnly;

impl Authorizer for AuthenticatedOrReadOnly {
    fn name(&self) -> &'static str {
        "authenticated_or_read_only"
    }

    fn authorize(
        &self,
        actor: &Actor,
        operation: Operation,
        _target: Option<&dyn Owned>,
    ) -> Result<(), AppError> {
        if operation.is_safe() {
            return Ok(());
        }
        actor.require_authenticated().map(|_| ())
    }
}

/// Reads are open to anyone; writes need an authenticated actor and, on an
/// existing record, that actor must be the record's owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOrReadOnly;

impl Authorizer for OwnerOrReadOnly {
    fn name(&self) -> &'static str {
        "owner_or_read_only"
    }

    fn authorize(
        &self,
        actor: &Actor,
        operation: Operation,
        target: Option<&dyn Owned>,
    ) -> Result<(), AppError> {
        if operation.is_safe() {
            return Ok(());
        }
        let principal = actor.require_authenticated()?;

        match target {
            None => Ok(()),
            Some(record) if record.owner_id() == Some(principal.id) => Ok(()),
            Some(_) => Err(permission_denied(operation)),
        }
    }
}
