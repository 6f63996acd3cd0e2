#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Scoped permission model.
//!
//! A principal holds a [`PermissionSet`]: a collection of [`ScopedPermission`]
//! grants at one of three scopes (global, project, ticket). Access checks ask
//! whether the set *implies* a permission on an [`AccessControlled`] object:
//!
//! | Grant scope | Implies on a project `P` | Implies on a ticket `P-n` |
//! |-------------|--------------------------|---------------------------|
//! | `global`    | yes                      | yes                       |
//! | `project:P` | yes                      | yes                       |
//! | `ticket:P-n`| no                       | only `P-n`                |
//!
//! ```rust
//! use tracker_security::{Permission, PermissionSet, ProjectId, Scope, ScopedPermission, TicketId};
//!
//! let project = ProjectId(7);
//! let set = PermissionSet::builder()
//!     .add(ScopedPermission::new(Scope::Project(project), Permission::TicketRead))
//!     .build();
//!
//! assert!(set.implies(&TicketId::new(project, 42), Permission::TicketRead));
//! assert!(!set.implies(&TicketId::new(ProjectId(8), 1), Permission::TicketRead));
//! ```

pub mod access;
pub mod bin_codec;
pub mod error;
pub mod permission;
pub mod permission_set;
pub mod principal;
pub mod scope;

pub use access::{AccessControlled, AccessPredicate, AccessTarget, ImplicationPredicate, is_permitted};
pub use bin_codec::{PERMSET_BIN_VERSION, decode_permission_set, encode_permission_set};
pub use error::{CodecError, DecodeError};
pub use permission::Permission;
pub use permission_set::{PermissionSet, PermissionSetBuilder};
pub use principal::Principal;
pub use scope::{ProjectId, Scope, ScopeKind, ScopedPermission, TicketId};
