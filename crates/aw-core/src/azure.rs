//! Raw Azure wire types.
//!
//! These structs mirror the JSON shapes returned by the Microsoft Graph and
//! Azure Resource Manager APIs. Parsing is deliberately tolerant: every
//! struct derives `Default` and deserializes with `#[serde(default)]` so a
//! missing field never fails a whole page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An Azure AD application registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    pub id: String,
    pub app_id: String,
    pub display_name: String,
    pub publisher_domain: Option<String>,
    pub sign_in_audience: Option<String>,
    pub created_date_time: Option<DateTime<Utc>>,
}

/// An Azure AD joined or registered device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    pub id: String,
    pub device_id: String,
    pub display_name: String,
    pub operating_system: Option<String>,
    pub operating_system_version: Option<String>,
    pub trust_type: Option<String>,
    pub profile_type: Option<String>,
}

/// An Azure AD security or M365 group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub security_enabled: Option<bool>,
    pub mail_enabled: Option<bool>,
    pub mail: Option<String>,
    pub on_premises_security_identifier: Option<String>,
    pub on_premises_sync_enabled: Option<bool>,
    pub is_assignable_to_role: Option<bool>,
}

/// An Azure AD service principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePrincipal {
    pub id: String,
    pub app_id: String,
    pub display_name: String,
    pub service_principal_type: Option<String>,
    pub account_enabled: Option<bool>,
    pub app_owner_organization_id: Option<String>,
    pub service_principal_names: Vec<String>,
}

/// An Azure AD user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub user_principal_name: String,
    pub display_name: String,
    pub mail: Option<String>,
    pub account_enabled: Option<bool>,
    pub user_type: Option<String>,
    pub on_premises_security_identifier: Option<String>,
    pub on_premises_sync_enabled: Option<bool>,
    pub last_password_change_date_time: Option<DateTime<Utc>>,
}

/// An Azure AD directory role definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Role {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_built_in: Option<bool>,
    pub is_enabled: Option<bool>,
    pub template_id: Option<String>,
}

/// An Azure AD directory role assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnifiedRoleAssignment {
    pub id: String,
    pub role_definition_id: String,
    pub principal_id: String,
    pub directory_scope_id: Option<String>,
}

/// A tenant visible to the authenticated principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tenant {
    pub id: String,
    pub tenant_id: String,
    pub display_name: String,
    pub default_domain: Option<String>,
    pub tenant_category: Option<String>,
    pub country_code: Option<String>,
    pub domains: Vec<String>,
}

/// An ARM subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscription {
    /// Full ARM path, `/subscriptions/<guid>`.
    pub id: String,
    pub subscription_id: String,
    pub display_name: String,
    pub state: Option<String>,
    pub tenant_id: Option<String>,
}

/// An ARM management group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagementGroup {
    /// Full ARM path, `/providers/Microsoft.Management/managementGroups/<name>`.
    pub id: String,
    pub name: String,
    pub properties: ManagementGroupProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagementGroupProperties {
    pub tenant_id: Option<String>,
    pub display_name: Option<String>,
}

/// One entry from a management group descendants listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescendantInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub descendant_type: String,
    pub properties: DescendantInfoProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescendantInfoProperties {
    pub parent: Option<DescendantParentGroupInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescendantParentGroupInfo {
    pub id: String,
}

/// An ARM resource group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub managed_by: Option<String>,
}

/// An ARM virtual machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub properties: VirtualMachineProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineProperties {
    pub vm_id: Option<String>,
}

/// An ARM key vault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyVault {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub properties: KeyVaultProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyVaultProperties {
    pub tenant_id: Option<String>,
    pub vault_uri: Option<String>,
    pub enable_rbac_authorization: Option<bool>,
    pub access_policies: Vec<KeyVaultAccessPolicyEntry>,
}

/// One access policy entry on a key vault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyVaultAccessPolicyEntry {
    pub tenant_id: Option<String>,
    pub object_id: String,
    pub permissions: KeyVaultPermissions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyVaultPermissions {
    pub keys: Vec<String>,
    pub secrets: Vec<String>,
    pub certificates: Vec<String>,
}

/// Access policy capabilities the collector filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVaultAccessType {
    GetCerts,
    GetKeys,
    GetSecrets,
}

impl KeyVaultAccessPolicyEntry {
    /// Whether this policy grants `Get` for the given capability.
    pub fn grants(&self, access: KeyVaultAccessType) -> bool {
        let permissions = match access {
            KeyVaultAccessType::GetCerts => &self.permissions.certificates,
            KeyVaultAccessType::GetKeys => &self.permissions.keys,
            KeyVaultAccessType::GetSecrets => &self.permissions.secrets,
        };
        permissions.iter().any(|p| p.eq_ignore_ascii_case("get"))
    }

    /// Whether this policy grants `Get` for any of the given capabilities.
    pub fn grants_any(&self, filter: &[KeyVaultAccessType]) -> bool {
        filter.iter().any(|access| self.grants(*access))
    }
}

/// An ARM role assignment on a scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleAssignment {
    pub id: String,
    pub name: Option<String>,
    pub properties: RoleAssignmentProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleAssignmentProperties {
    /// ARM path of the role definition; the final segment is the role GUID.
    pub role_definition_id: String,
    pub principal_id: Option<String>,
    pub principal_type: Option<String>,
    pub scope: Option<String>,
}

impl RoleAssignment {
    /// Whether this assignment's role definition ends in the given GUID.
    pub fn matches_role(&self, role_id: &str) -> bool {
        self.properties
            .role_definition_id
            .rsplit('/')
            .next()
            .is_some_and(|tail| tail.eq_ignore_ascii_case(role_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::USER_ACCESS_ADMIN_ROLE_ID;

    fn assignment_for(role_definition_id: &str) -> RoleAssignment {
        RoleAssignment {
            properties: RoleAssignmentProperties {
                role_definition_id: role_definition_id.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn matches_role_on_full_path() {
        let assignment = assignment_for(&format!(
            "/subscriptions/s1/providers/Microsoft.Authorization/roleDefinitions/{}",
            USER_ACCESS_ADMIN_ROLE_ID
        ));
        assert!(assignment.matches_role(USER_ACCESS_ADMIN_ROLE_ID));
        assert!(!assignment.matches_role("8e3af657-a8ff-443c-a75c-2fe8c4bcb635"));
    }

    #[test]
    fn matches_role_is_case_insensitive() {
        let assignment = assignment_for(&USER_ACCESS_ADMIN_ROLE_ID.to_uppercase());
        assert!(assignment.matches_role(USER_ACCESS_ADMIN_ROLE_ID));
    }

    #[test]
    fn access_policy_grants() {
        let entry = KeyVaultAccessPolicyEntry {
            object_id: "p1".into(),
            permissions: KeyVaultPermissions {
                keys: vec!["Get".into(), "List".into()],
                secrets: vec!["List".into()],
                certificates: Vec::new(),
            },
            ..Default::default()
        };
        assert!(entry.grants(KeyVaultAccessType::GetKeys));
        assert!(!entry.grants(KeyVaultAccessType::GetSecrets));
        assert!(!entry.grants(KeyVaultAccessType::GetCerts));
        assert!(entry.grants_any(&[KeyVaultAccessType::GetCerts, KeyVaultAccessType::GetKeys]));
        assert!(!entry.grants_any(&[KeyVaultAccessType::GetCerts]));
    }

    #[test]
    fn tolerant_subscription_parsing() {
        let subscription: Subscription = serde_json::from_str(
            r#"{"id":"/subscriptions/abc","subscriptionId":"abc","displayName":"prod"}"#,
        )
        .unwrap();
        assert_eq!(subscription.subscription_id, "abc");
        assert!(subscription.state.is_none());
    }
}
