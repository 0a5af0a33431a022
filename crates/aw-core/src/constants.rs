//! Well-known Azure RBAC role definition ids.
//!
//! Role assignments reference a role definition by an ARM path whose final
//! segment is one of these GUIDs. The edge collectors filter on them.

/// Owner.
pub const OWNER_ROLE_ID: &str = "8e3af657-a8ff-443c-a75c-2fe8c4bcb635";

/// User Access Administrator.
pub const USER_ACCESS_ADMIN_ROLE_ID: &str = "18d7d88d-d35e-4fb5-a5c3-7773c20a72d9";

/// Contributor.
pub const CONTRIBUTOR_ROLE_ID: &str = "b24988ac-6180-42a0-ab88-20f7382dd24c";

/// Avere Contributor.
pub const AVERE_CONTRIBUTOR_ROLE_ID: &str = "4f8fab4f-1852-4a58-a46a-8eaf358af14a";

/// Virtual Machine Administrator Login.
pub const VM_ADMIN_LOGIN_ROLE_ID: &str = "1c0163c0-47e6-4577-8991-ea5c82e286e4";

/// Virtual Machine Contributor.
pub const VM_CONTRIBUTOR_ROLE_ID: &str = "9980e02c-c2be-4d73-94e8-173b1dc7cf3c";

/// Key Vault Contributor.
pub const KEY_VAULT_CONTRIBUTOR_ROLE_ID: &str = "f25e0fa2-a7c8-4377-a976-54943a77a395";
