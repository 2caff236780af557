pub mod core;
pub mod permissions;
pub mod store;

// Assembly and ambient setup
pub mod config;
pub mod engine;
pub mod logging;

pub use crate::core::{PolicyError, PolicyResult, RoleId, TenantId, UserId};
pub use engine::PolicyEngine;
