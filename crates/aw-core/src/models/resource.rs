//! Payloads for ARM resources and their authorization edges.
//!
//! Role-bearing edges come in singleton/aggregate pairs: the aggregate is
//! what gets emitted, carrying every matching child discovered for one
//! parent, and each child repeats the parent id next to the raw assignment.

use serde::{Deserialize, Serialize};

use crate::azure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(flatten)]
    pub subscription: azure::Subscription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOwner {
    pub owner: azure::RoleAssignment,
    pub subscription_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOwners {
    pub subscription_id: String,
    pub owners: Vec<SubscriptionOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUserAccessAdmin {
    pub user_access_admin: azure::RoleAssignment,
    pub subscription_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUserAccessAdmins {
    pub subscription_id: String,
    pub user_access_admins: Vec<SubscriptionUserAccessAdmin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementGroup {
    #[serde(flatten)]
    pub management_group: azure::ManagementGroup,
}

/// One entry of a management group's descendants listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementGroupDescendant {
    pub management_group_id: String,
    pub descendant: azure::DescendantInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementGroupOwner {
    pub owner: azure::RoleAssignment,
    pub management_group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementGroupOwners {
    pub management_group_id: String,
    pub owners: Vec<ManagementGroupOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementGroupUserAccessAdmin {
    pub user_access_admin: azure::RoleAssignment,
    pub management_group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementGroupUserAccessAdmins {
    pub management_group_id: String,
    pub user_access_admins: Vec<ManagementGroupUserAccessAdmin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(flatten)]
    pub resource_group: azure::ResourceGroup,
    pub subscription_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupOwner {
    pub owner: azure::RoleAssignment,
    pub resource_group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupOwners {
    pub resource_group_id: String,
    pub owners: Vec<ResourceGroupOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupUserAccessAdmin {
    pub user_access_admin: azure::RoleAssignment,
    pub resource_group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupUserAccessAdmins {
    pub resource_group_id: String,
    pub user_access_admins: Vec<ResourceGroupUserAccessAdmin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVault {
    #[serde(flatten)]
    pub key_vault: azure::KeyVault,
    pub subscription_id: String,
}

/// One access policy entry that grants a monitored capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultAccessPolicy {
    pub key_vault_id: String,
    pub access_policy: azure::KeyVaultAccessPolicyEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultOwner {
    pub owner: azure::RoleAssignment,
    pub key_vault_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultOwners {
    pub key_vault_id: String,
    pub owners: Vec<KeyVaultOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultContributor {
    pub contributor: azure::RoleAssignment,
    pub key_vault_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultContributors {
    pub key_vault_id: String,
    pub contributors: Vec<KeyVaultContributor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultUserAccessAdmin {
    pub user_access_admin: azure::RoleAssignment,
    pub key_vault_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultUserAccessAdmins {
    pub key_vault_id: String,
    pub user_access_admins: Vec<KeyVaultUserAccessAdmin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    #[serde(flatten)]
    pub virtual_machine: azure::VirtualMachine,
    pub subscription_id: String,
}

/// Every role assignment scoped to one virtual machine.
///
/// This is the intermediate batch the VM edge collectors filter; it flows
/// on its own typed stream and is never emitted to the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineRoleAssignments {
    pub virtual_machine_id: String,
    pub role_assignments: Vec<azure::RoleAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineOwner {
    pub owner: azure::RoleAssignment,
    pub virtual_machine_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineOwners {
    pub virtual_machine_id: String,
    pub owners: Vec<VirtualMachineOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineContributor {
    pub contributor: azure::RoleAssignment,
    pub virtual_machine_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineContributors {
    pub virtual_machine_id: String,
    pub contributors: Vec<VirtualMachineContributor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineAvereContributor {
    pub avere_contributor: azure::RoleAssignment,
    pub virtual_machine_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineAvereContributors {
    pub virtual_machine_id: String,
    pub avere_contributors: Vec<VirtualMachineAvereContributor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineAdminLogin {
    pub admin_login: azure::RoleAssignment,
    pub virtual_machine_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineAdminLogins {
    pub virtual_machine_id: String,
    pub admin_logins: Vec<VirtualMachineAdminLogin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineUserAccessAdmin {
    pub user_access_admin: azure::RoleAssignment,
    pub virtual_machine_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineUserAccessAdmins {
    pub virtual_machine_id: String,
    pub user_access_admins: Vec<VirtualMachineUserAccessAdmin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineVMContributor {
    pub vm_contributor: azure::RoleAssignment,
    pub virtual_machine_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineVMContributors {
    pub virtual_machine_id: String,
    pub vm_contributors: Vec<VirtualMachineVMContributor>,
}
