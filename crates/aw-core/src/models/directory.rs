//! Payloads for Azure AD directory objects and their relationships.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::azure;

/// An application registration with the tenant it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    #[serde(flatten)]
    pub application: azure::Application,
    pub tenant_id: String,
    pub tenant_name: String,
}

/// One owner of an application. Owners come back as raw directory
/// objects whose concrete type varies, so the child stays untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppOwner {
    pub owner: Value,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(flatten)]
    pub device: azure::Device,
    pub tenant_id: String,
    pub tenant_name: String,
}

/// One registered owner of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOwner {
    pub owner: Value,
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(flatten)]
    pub group: azure::Group,
    pub tenant_id: String,
    pub tenant_name: String,
}

/// One owner of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOwner {
    pub owner: Value,
    pub group_id: String,
}

/// One member of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub member: Value,
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
    #[serde(flatten)]
    pub service_principal: azure::ServicePrincipal,
    pub tenant_id: String,
    pub tenant_name: String,
}

/// One owner of a service principal, kept alongside its parent id so the
/// aggregate's children are self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipalOwner {
    pub owner: Value,
    pub service_principal_id: String,
}

/// All owners discovered for one service principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipalOwners {
    pub service_principal_id: String,
    pub owners: Vec<ServicePrincipalOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub user: azure::User,
    pub tenant_id: String,
    pub tenant_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[serde(flatten)]
    pub tenant: azure::Tenant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(flatten)]
    pub role: azure::Role,
    pub tenant_id: String,
    pub tenant_name: String,
}

/// One assignment of a directory role to a principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    #[serde(flatten)]
    pub assignment: azure::UnifiedRoleAssignment,
    pub tenant_id: String,
    pub tenant_name: String,
}
