//! The tagged record envelope.
//!
//! Every stream in the pipeline carries [`Record`] values, and the driver
//! serializes each one as `{"kind": "<Kind>", "data": {...}}`. The envelope
//! is an adjacently tagged enum, so a record's kind and its payload cannot
//! disagree and consumers match exhaustively instead of downcasting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models;

/// One record of the collection output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Record {
    #[serde(rename = "AZApp")]
    App(models::App),
    #[serde(rename = "AZAppOwner")]
    AppOwner(models::AppOwner),
    #[serde(rename = "AZDevice")]
    Device(models::Device),
    #[serde(rename = "AZDeviceOwner")]
    DeviceOwner(models::DeviceOwner),
    #[serde(rename = "AZGroup")]
    Group(models::Group),
    #[serde(rename = "AZGroupMember")]
    GroupMember(models::GroupMember),
    #[serde(rename = "AZGroupOwner")]
    GroupOwner(models::GroupOwner),
    #[serde(rename = "AZKeyVault")]
    KeyVault(models::KeyVault),
    #[serde(rename = "AZKeyVaultAccessPolicy")]
    KeyVaultAccessPolicy(models::KeyVaultAccessPolicy),
    #[serde(rename = "AZKeyVaultContributor")]
    KeyVaultContributors(models::KeyVaultContributors),
    #[serde(rename = "AZKeyVaultOwner")]
    KeyVaultOwners(models::KeyVaultOwners),
    #[serde(rename = "AZKeyVaultUserAccessAdmin")]
    KeyVaultUserAccessAdmins(models::KeyVaultUserAccessAdmins),
    #[serde(rename = "AZManagementGroup")]
    ManagementGroup(models::ManagementGroup),
    #[serde(rename = "AZManagementGroupDescendant")]
    ManagementGroupDescendant(models::ManagementGroupDescendant),
    #[serde(rename = "AZManagementGroupOwner")]
    ManagementGroupOwners(models::ManagementGroupOwners),
    #[serde(rename = "AZManagementGroupUserAccessAdmin")]
    ManagementGroupUserAccessAdmins(models::ManagementGroupUserAccessAdmins),
    #[serde(rename = "AZResourceGroup")]
    ResourceGroup(models::ResourceGroup),
    #[serde(rename = "AZResourceGroupOwner")]
    ResourceGroupOwners(models::ResourceGroupOwners),
    #[serde(rename = "AZResourceGroupUserAccessAdmin")]
    ResourceGroupUserAccessAdmins(models::ResourceGroupUserAccessAdmins),
    #[serde(rename = "AZRole")]
    Role(models::Role),
    #[serde(rename = "AZRoleAssignment")]
    RoleAssignment(models::RoleAssignment),
    #[serde(rename = "AZServicePrincipal")]
    ServicePrincipal(models::ServicePrincipal),
    #[serde(rename = "AZServicePrincipalOwner")]
    ServicePrincipalOwners(models::ServicePrincipalOwners),
    #[serde(rename = "AZSubscription")]
    Subscription(models::Subscription),
    #[serde(rename = "AZSubscriptionOwner")]
    SubscriptionOwners(models::SubscriptionOwners),
    #[serde(rename = "AZSubscriptionUserAccessAdmin")]
    SubscriptionUserAccessAdmins(models::SubscriptionUserAccessAdmins),
    #[serde(rename = "AZTenant")]
    Tenant(models::Tenant),
    #[serde(rename = "AZUser")]
    User(models::User),
    #[serde(rename = "AZVM")]
    VirtualMachine(models::VirtualMachine),
    #[serde(rename = "AZVMAdminLogin")]
    VirtualMachineAdminLogins(models::VirtualMachineAdminLogins),
    #[serde(rename = "AZVMAvereContributor")]
    VirtualMachineAvereContributors(models::VirtualMachineAvereContributors),
    #[serde(rename = "AZVMContributor")]
    VirtualMachineContributors(models::VirtualMachineContributors),
    #[serde(rename = "AZVMOwner")]
    VirtualMachineOwners(models::VirtualMachineOwners),
    #[serde(rename = "AZVMUserAccessAdmin")]
    VirtualMachineUserAccessAdmins(models::VirtualMachineUserAccessAdmins),
    #[serde(rename = "AZVMVMContributor")]
    VirtualMachineVMContributors(models::VirtualMachineVMContributors),
}

/// The closed set of record kinds, one per [`Record`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "AZApp")]
    App,
    #[serde(rename = "AZAppOwner")]
    AppOwner,
    #[serde(rename = "AZDevice")]
    Device,
    #[serde(rename = "AZDeviceOwner")]
    DeviceOwner,
    #[serde(rename = "AZGroup")]
    Group,
    #[serde(rename = "AZGroupMember")]
    GroupMember,
    #[serde(rename = "AZGroupOwner")]
    GroupOwner,
    #[serde(rename = "AZKeyVault")]
    KeyVault,
    #[serde(rename = "AZKeyVaultAccessPolicy")]
    KeyVaultAccessPolicy,
    #[serde(rename = "AZKeyVaultContributor")]
    KeyVaultContributor,
    #[serde(rename = "AZKeyVaultOwner")]
    KeyVaultOwner,
    #[serde(rename = "AZKeyVaultUserAccessAdmin")]
    KeyVaultUserAccessAdmin,
    #[serde(rename = "AZManagementGroup")]
    ManagementGroup,
    #[serde(rename = "AZManagementGroupDescendant")]
    ManagementGroupDescendant,
    #[serde(rename = "AZManagementGroupOwner")]
    ManagementGroupOwner,
    #[serde(rename = "AZManagementGroupUserAccessAdmin")]
    ManagementGroupUserAccessAdmin,
    #[serde(rename = "AZResourceGroup")]
    ResourceGroup,
    #[serde(rename = "AZResourceGroupOwner")]
    ResourceGroupOwner,
    #[serde(rename = "AZResourceGroupUserAccessAdmin")]
    ResourceGroupUserAccessAdmin,
    #[serde(rename = "AZRole")]
    Role,
    #[serde(rename = "AZRoleAssignment")]
    RoleAssignment,
    #[serde(rename = "AZServicePrincipal")]
    ServicePrincipal,
    #[serde(rename = "AZServicePrincipalOwner")]
    ServicePrincipalOwner,
    #[serde(rename = "AZSubscription")]
    Subscription,
    #[serde(rename = "AZSubscriptionOwner")]
    SubscriptionOwner,
    #[serde(rename = "AZSubscriptionUserAccessAdmin")]
    SubscriptionUserAccessAdmin,
    #[serde(rename = "AZTenant")]
    Tenant,
    #[serde(rename = "AZUser")]
    User,
    #[serde(rename = "AZVM")]
    VirtualMachine,
    #[serde(rename = "AZVMAdminLogin")]
    VirtualMachineAdminLogin,
    #[serde(rename = "AZVMAvereContributor")]
    VirtualMachineAvereContributor,
    #[serde(rename = "AZVMContributor")]
    VirtualMachineContributor,
    #[serde(rename = "AZVMOwner")]
    VirtualMachineOwner,
    #[serde(rename = "AZVMUserAccessAdmin")]
    VirtualMachineUserAccessAdmin,
    #[serde(rename = "AZVMVMContributor")]
    VirtualMachineVMContributor,
}

impl Kind {
    /// The kind tag as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::App => "AZApp",
            Kind::AppOwner => "AZAppOwner",
            Kind::Device => "AZDevice",
            Kind::DeviceOwner => "AZDeviceOwner",
            Kind::Group => "AZGroup",
            Kind::GroupMember => "AZGroupMember",
            Kind::GroupOwner => "AZGroupOwner",
            Kind::KeyVault => "AZKeyVault",
            Kind::KeyVaultAccessPolicy => "AZKeyVaultAccessPolicy",
            Kind::KeyVaultContributor => "AZKeyVaultContributor",
            Kind::KeyVaultOwner => "AZKeyVaultOwner",
            Kind::KeyVaultUserAccessAdmin => "AZKeyVaultUserAccessAdmin",
            Kind::ManagementGroup => "AZManagementGroup",
            Kind::ManagementGroupDescendant => "AZManagementGroupDescendant",
            Kind::ManagementGroupOwner => "AZManagementGroupOwner",
            Kind::ManagementGroupUserAccessAdmin => "AZManagementGroupUserAccessAdmin",
            Kind::ResourceGroup => "AZResourceGroup",
            Kind::ResourceGroupOwner => "AZResourceGroupOwner",
            Kind::ResourceGroupUserAccessAdmin => "AZResourceGroupUserAccessAdmin",
            Kind::Role => "AZRole",
            Kind::RoleAssignment => "AZRoleAssignment",
            Kind::ServicePrincipal => "AZServicePrincipal",
            Kind::ServicePrincipalOwner => "AZServicePrincipalOwner",
            Kind::Subscription => "AZSubscription",
            Kind::SubscriptionOwner => "AZSubscriptionOwner",
            Kind::SubscriptionUserAccessAdmin => "AZSubscriptionUserAccessAdmin",
            Kind::Tenant => "AZTenant",
            Kind::User => "AZUser",
            Kind::VirtualMachine => "AZVM",
            Kind::VirtualMachineAdminLogin => "AZVMAdminLogin",
            Kind::VirtualMachineAvereContributor => "AZVMAvereContributor",
            Kind::VirtualMachineContributor => "AZVMContributor",
            Kind::VirtualMachineOwner => "AZVMOwner",
            Kind::VirtualMachineUserAccessAdmin => "AZVMUserAccessAdmin",
            Kind::VirtualMachineVMContributor => "AZVMVMContributor",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Record {
    /// The kind tag of this record.
    pub fn kind(&self) -> Kind {
        match self {
            Record::App(_) => Kind::App,
            Record::AppOwner(_) => Kind::AppOwner,
            Record::Device(_) => Kind::Device,
            Record::DeviceOwner(_) => Kind::DeviceOwner,
            Record::Group(_) => Kind::Group,
            Record::GroupMember(_) => Kind::GroupMember,
            Record::GroupOwner(_) => Kind::GroupOwner,
            Record::KeyVault(_) => Kind::KeyVault,
            Record::KeyVaultAccessPolicy(_) => Kind::KeyVaultAccessPolicy,
            Record::KeyVaultContributors(_) => Kind::KeyVaultContributor,
            Record::KeyVaultOwners(_) => Kind::KeyVaultOwner,
            Record::KeyVaultUserAccessAdmins(_) => Kind::KeyVaultUserAccessAdmin,
            Record::ManagementGroup(_) => Kind::ManagementGroup,
            Record::ManagementGroupDescendant(_) => Kind::ManagementGroupDescendant,
            Record::ManagementGroupOwners(_) => Kind::ManagementGroupOwner,
            Record::ManagementGroupUserAccessAdmins(_) => Kind::ManagementGroupUserAccessAdmin,
            Record::ResourceGroup(_) => Kind::ResourceGroup,
            Record::ResourceGroupOwners(_) => Kind::ResourceGroupOwner,
            Record::ResourceGroupUserAccessAdmins(_) => Kind::ResourceGroupUserAccessAdmin,
            Record::Role(_) => Kind::Role,
            Record::RoleAssignment(_) => Kind::RoleAssignment,
            Record::ServicePrincipal(_) => Kind::ServicePrincipal,
            Record::ServicePrincipalOwners(_) => Kind::ServicePrincipalOwner,
            Record::Subscription(_) => Kind::Subscription,
            Record::SubscriptionOwners(_) => Kind::SubscriptionOwner,
            Record::SubscriptionUserAccessAdmins(_) => Kind::SubscriptionUserAccessAdmin,
            Record::Tenant(_) => Kind::Tenant,
            Record::User(_) => Kind::User,
            Record::VirtualMachine(_) => Kind::VirtualMachine,
            Record::VirtualMachineAdminLogins(_) => Kind::VirtualMachineAdminLogin,
            Record::VirtualMachineAvereContributors(_) => Kind::VirtualMachineAvereContributor,
            Record::VirtualMachineContributors(_) => Kind::VirtualMachineContributor,
            Record::VirtualMachineOwners(_) => Kind::VirtualMachineOwner,
            Record::VirtualMachineUserAccessAdmins(_) => Kind::VirtualMachineUserAccessAdmin,
            Record::VirtualMachineVMContributors(_) => Kind::VirtualMachineVMContributor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure;

    fn sample_app() -> Record {
        Record::App(models::App {
            application: azure::Application {
                id: "obj-1".into(),
                app_id: "app-1".into(),
                display_name: "billing".into(),
                ..Default::default()
            },
            tenant_id: "t1".into(),
            tenant_name: "contoso".into(),
        })
    }

    #[test]
    fn envelope_shape_on_the_wire() {
        let json = serde_json::to_value(sample_app()).unwrap();
        assert_eq!(json["kind"], "AZApp");
        assert_eq!(json["data"]["appId"], "app-1");
        assert_eq!(json["data"]["tenantId"], "t1");
        // The flattened application fields sit next to the tenant fields.
        assert_eq!(json["data"]["displayName"], "billing");
    }

    #[test]
    fn round_trip_entity_record() {
        let record = sample_app();
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: Record = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn round_trip_aggregate_record() {
        let assignment = azure::RoleAssignment {
            id: "ra-1".into(),
            properties: azure::RoleAssignmentProperties {
                role_definition_id: "/providers/roleDefinitions/guid".into(),
                principal_id: Some("p1".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let record = Record::SubscriptionUserAccessAdmins(models::SubscriptionUserAccessAdmins {
            subscription_id: "s1".into(),
            user_access_admins: vec![models::SubscriptionUserAccessAdmin {
                user_access_admin: assignment,
                subscription_id: "s1".into(),
            }],
        });
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: Record = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.kind(), Kind::SubscriptionUserAccessAdmin);
    }

    #[test]
    fn round_trip_untyped_owner_record() {
        let record = Record::AppOwner(models::AppOwner {
            owner: serde_json::json!({"id": "u1", "@odata.type": "#microsoft.graph.user"}),
            app_id: "obj-1".into(),
        });
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: Record = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(Kind::VirtualMachine.as_str(), "AZVM");
        assert_eq!(Kind::VirtualMachineVMContributor.as_str(), "AZVMVMContributor");
        assert_eq!(Kind::ServicePrincipalOwner.to_string(), "AZServicePrincipalOwner");
        let kind: Kind = serde_json::from_str("\"AZKeyVaultUserAccessAdmin\"").unwrap();
        assert_eq!(kind, Kind::KeyVaultUserAccessAdmin);
    }

    #[test]
    fn kind_matches_serialized_tag_for_every_variant() {
        let records = vec![
            sample_app(),
            Record::Tenant(models::Tenant {
                tenant: azure::Tenant::default(),
            }),
            Record::ServicePrincipalOwners(models::ServicePrincipalOwners {
                service_principal_id: "sp1".into(),
                owners: Vec::new(),
            }),
            Record::VirtualMachineVMContributors(models::VirtualMachineVMContributors {
                virtual_machine_id: "vm1".into(),
                vm_contributors: Vec::new(),
            }),
        ];
        for record in records {
            let json = serde_json::to_value(&record).unwrap();
            assert_eq!(json["kind"], record.kind().as_str());
        }
    }
}
