//! The actor being evaluated

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{RoleId, UserId};

/// Actor whose request is being authorized
///
/// Built by the caller from platform membership data before each evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    #[serde(default)]
    pub role_ids: BTreeSet<RoleId>,
    /// Owns the tenant being evaluated
    #[serde(default)]
    pub is_tenant_owner: bool,
    /// Holds the platform's administrator permission in the tenant
    #[serde(default)]
    pub has_administrator_flag: bool,
    /// Operator of the whole deployment
    #[serde(default)]
    pub is_super_owner: bool,
}

impl Principal {
    /// An ordinary member with no roles and no bypass flags
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            role_ids: BTreeSet::new(),
            is_tenant_owner: false,
            has_administrator_flag: false,
            is_super_owner: false,
        }
    }

    /// Add held roles
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.role_ids.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Mark as tenant owner
    pub fn tenant_owner(mut self, value: bool) -> Self {
        self.is_tenant_owner = value;
        self
    }

    /// Mark as administrator
    pub fn administrator(mut self, value: bool) -> Self {
        self.has_administrator_flag = value;
        self
    }

    /// Mark as super owner
    pub fn super_owner(mut self, value: bool) -> Self {
        self.is_super_owner = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let p = Principal::new(1u64).with_roles([2u64, 3, 2]).administrator(true);
        assert_eq!(p.user_id, UserId(1));
        assert_eq!(p.role_ids.len(), 2);
        assert!(p.has_administrator_flag);
        assert!(!p.is_tenant_owner);
        assert!(!p.is_super_owner);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let p: Principal = serde_json::from_str(r#"{"user_id": 5}"#).unwrap();
        assert_eq!(p, Principal::new(5u64));
    }
}
