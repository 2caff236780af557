//! Core types for the policy engine
//!
//! - `TenantId` / `UserId` / `RoleId` - Typed platform identifiers
//! - `PolicyError` - Error types

pub mod error;
pub mod ids;

pub use error::{PolicyError, PolicyResult};
pub use ids::{RoleId, TenantId, UserId};
