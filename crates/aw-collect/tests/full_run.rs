//! End-to-end pipeline tests against the mock client.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use aw_client::mock::MockAzureClient;
use aw_client::AzureClient;
use aw_collect::orchestrator::list_all;
use aw_core::azure;
use aw_core::constants::{OWNER_ROLE_ID, USER_ACCESS_ADMIN_ROLE_ID};
use aw_core::{Kind, Record};
use serde_json::json;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const DEADLINE: Duration = Duration::from_secs(10);

fn assignment(role_id: &str) -> azure::RoleAssignment {
    azure::RoleAssignment {
        id: "ra".into(),
        properties: azure::RoleAssignmentProperties {
            role_definition_id: format!(
                "/providers/Microsoft.Authorization/roleDefinitions/{role_id}"
            ),
            principal_id: Some("p1".into()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// One object per leaf enumerator, with children everywhere a dependent
/// collector looks. Ids line up so every collector finds its parent.
fn fully_populated_client() -> MockAzureClient {
    let sub_guid = "00000000-0000-0000-0000-00000000aaaa";
    let sub_path = format!("/subscriptions/{sub_guid}");
    let mg_id = "/providers/Microsoft.Management/managementGroups/root";
    let rg_id = format!("{sub_path}/resourceGroups/web");
    let kv_id = format!("{sub_path}/providers/Microsoft.KeyVault/vaults/kv1");
    let vm_id = format!("{sub_path}/providers/Microsoft.Compute/virtualMachines/web01");

    let role_edges = vec![
        Ok(assignment(OWNER_ROLE_ID)),
        Ok(assignment(USER_ACCESS_ADMIN_ROLE_ID)),
    ];

    MockAzureClient::new()
        .with_tenant(azure::Tenant {
            tenant_id: "t1".into(),
            display_name: "contoso".into(),
            ..Default::default()
        })
        .with_apps(vec![Ok(azure::Application {
            id: "app-obj".into(),
            app_id: "app-client".into(),
            display_name: "billing".into(),
            ..Default::default()
        })])
        .with_app_owners("app-obj", vec![Ok(json!({"id": "u1"}))])
        .with_devices(vec![Ok(azure::Device {
            id: "dev-1".into(),
            display_name: "laptop".into(),
            ..Default::default()
        })])
        .with_device_owners("dev-1", vec![Ok(json!({"id": "u1"}))])
        .with_groups(vec![Ok(azure::Group {
            id: "grp-1".into(),
            display_name: "ops".into(),
            ..Default::default()
        })])
        .with_group_owners("grp-1", vec![Ok(json!({"id": "u1"}))])
        .with_group_members("grp-1", vec![Ok(json!({"id": "u2"}))])
        .with_service_principals(vec![Ok(azure::ServicePrincipal {
            id: "sp-1".into(),
            display_name: "automation".into(),
            ..Default::default()
        })])
        .with_service_principal_owners("sp-1", vec![Ok(json!({"id": "u1"}))])
        .with_users(vec![Ok(azure::User {
            id: "u1".into(),
            user_principal_name: "u1@contoso.com".into(),
            ..Default::default()
        })])
        .with_tenants(vec![Ok(azure::Tenant {
            tenant_id: "t1".into(),
            display_name: "contoso".into(),
            ..Default::default()
        })])
        .with_roles(vec![Ok(azure::Role {
            id: "role-1".into(),
            display_name: "Global Administrator".into(),
            ..Default::default()
        })])
        .with_role_assignments(
            "role-1",
            vec![Ok(azure::UnifiedRoleAssignment {
                id: "ura-1".into(),
                role_definition_id: "role-1".into(),
                principal_id: "u1".into(),
                ..Default::default()
            })],
        )
        .with_subscriptions(vec![Ok(azure::Subscription {
            id: sub_path.clone(),
            subscription_id: sub_guid.into(),
            display_name: "prod".into(),
            ..Default::default()
        })])
        .with_resource_groups(
            sub_guid,
            vec![Ok(azure::ResourceGroup {
                id: rg_id.clone(),
                name: "web".into(),
                ..Default::default()
            })],
        )
        .with_management_groups(vec![Ok(azure::ManagementGroup {
            id: mg_id.into(),
            name: "root".into(),
            ..Default::default()
        })])
        .with_management_group_descendants(
            mg_id,
            vec![Ok(azure::DescendantInfo {
                id: sub_path.clone(),
                name: sub_guid.into(),
                descendant_type: "/subscriptions".into(),
                ..Default::default()
            })],
        )
        .with_key_vaults(
            sub_guid,
            vec![Ok(azure::KeyVault {
                id: kv_id.clone(),
                name: "kv1".into(),
                ..Default::default()
            })],
        )
        .with_key_vault_access_policies(
            &kv_id,
            vec![Ok(azure::KeyVaultAccessPolicyEntry {
                object_id: "u1".into(),
                permissions: azure::KeyVaultPermissions {
                    certificates: vec!["Get".into()],
                    ..Default::default()
                },
                ..Default::default()
            })],
        )
        .with_virtual_machines(
            sub_guid,
            vec![Ok(azure::VirtualMachine {
                id: vm_id.clone(),
                name: "web01".into(),
                ..Default::default()
            })],
        )
        .with_resource_role_assignments(&sub_path, role_edges.clone())
        .with_resource_role_assignments(mg_id, role_edges.clone())
        .with_resource_role_assignments(&rg_id, role_edges.clone())
        .with_resource_role_assignments(&kv_id, role_edges.clone())
        .with_resource_role_assignments(&vm_id, role_edges)
}

#[tokio::test]
async fn full_dag_emits_every_configured_kind() {
    let client: Arc<dyn AzureClient> = Arc::new(fully_populated_client());
    let cancel = CancellationToken::new();
    let mut stream = list_all(&cancel, &client);

    let mut counts: HashMap<Kind, usize> = HashMap::new();
    while let Some(record) = timeout(DEADLINE, stream.recv()).await.unwrap() {
        *counts.entry(record.kind()).or_default() += 1;
    }

    let expected = [
        Kind::App,
        Kind::AppOwner,
        Kind::Device,
        Kind::DeviceOwner,
        Kind::Group,
        Kind::GroupMember,
        Kind::GroupOwner,
        Kind::KeyVault,
        Kind::KeyVaultAccessPolicy,
        Kind::KeyVaultContributor,
        Kind::KeyVaultOwner,
        Kind::KeyVaultUserAccessAdmin,
        Kind::ManagementGroup,
        Kind::ManagementGroupDescendant,
        Kind::ManagementGroupOwner,
        Kind::ManagementGroupUserAccessAdmin,
        Kind::ResourceGroup,
        Kind::ResourceGroupOwner,
        Kind::ResourceGroupUserAccessAdmin,
        Kind::Role,
        Kind::RoleAssignment,
        Kind::ServicePrincipal,
        Kind::ServicePrincipalOwner,
        Kind::Subscription,
        Kind::SubscriptionOwner,
        Kind::SubscriptionUserAccessAdmin,
        Kind::Tenant,
        Kind::User,
        Kind::VirtualMachine,
        Kind::VirtualMachineAdminLogin,
        Kind::VirtualMachineAvereContributor,
        Kind::VirtualMachineContributor,
        Kind::VirtualMachineOwner,
        Kind::VirtualMachineUserAccessAdmin,
        Kind::VirtualMachineVMContributor,
    ];
    let seen: HashSet<Kind> = counts.keys().copied().collect();
    for kind in expected {
        assert!(seen.contains(&kind), "missing kind {kind}");
        assert_eq!(counts[&kind], 1, "expected exactly one {kind}");
    }
    assert_eq!(seen.len(), expected.len());
}

#[tokio::test]
async fn aggregate_records_carry_their_parent_key() {
    let client: Arc<dyn AzureClient> = Arc::new(fully_populated_client());
    let cancel = CancellationToken::new();
    let mut stream = list_all(&cancel, &client);

    while let Some(record) = timeout(DEADLINE, stream.recv()).await.unwrap() {
        match record {
            Record::SubscriptionOwners(owners) => {
                assert_eq!(owners.subscription_id, "00000000-0000-0000-0000-00000000aaaa");
                assert_eq!(owners.owners.len(), 1);
                for child in &owners.owners {
                    assert_eq!(child.subscription_id, owners.subscription_id);
                }
            }
            Record::VirtualMachineOwners(owners) => {
                assert_eq!(owners.owners.len(), 1);
                for child in &owners.owners {
                    assert_eq!(child.virtual_machine_id, owners.virtual_machine_id);
                }
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn cancellation_closes_the_merged_stream_promptly() {
    let client: Arc<dyn AzureClient> = Arc::new(fully_populated_client());
    let cancel = CancellationToken::new();
    let mut stream = list_all(&cancel, &client);

    // Take one record, then cancel mid-run.
    let first = timeout(DEADLINE, stream.recv()).await.unwrap();
    assert!(first.is_some());
    cancel.cancel();

    // The stream must close within bounded time; a few already-buffered
    // records may still arrive, then a clean end.
    timeout(DEADLINE, async {
        while stream.recv().await.is_some() {}
    })
    .await
    .expect("stream did not close after cancellation");
    // Nothing is produced after the close.
    assert!(timeout(Duration::from_millis(100), stream.recv())
        .await
        .unwrap_or(None)
        .is_none());
}
