//! The `list` command: pre-flight, pipeline construction and drain.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use aw_client::{AzureClient, AzureRestClient};
use aw_collect::collectors as c;
use aw_collect::{orchestrator, RecordStream};
use clap::Subcommand;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::sink;

/// One collector per subcommand; bare `list` runs the whole DAG.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ListTarget {
    /// Lists Azure Active Directory applications
    Apps,
    /// Lists Azure Active Directory application owners
    AppOwners,
    /// Lists Azure Active Directory devices
    Devices,
    /// Lists registered owners of Azure Active Directory devices
    DeviceOwners,
    /// Lists Azure Active Directory groups
    Groups,
    /// Lists Azure Active Directory group owners
    GroupOwners,
    /// Lists Azure Active Directory group members
    GroupMembers,
    /// Lists Azure key vaults
    KeyVaults,
    /// Lists Azure key vault owners
    KeyVaultOwners,
    /// Lists Azure key vault access policies
    KeyVaultAccessPolicies,
    /// Lists Azure key vault contributors
    KeyVaultContributors,
    /// Lists Azure key vault user access admins
    KeyVaultUserAccessAdmins,
    /// Lists Azure management groups
    ManagementGroups,
    /// Lists Azure management group owners
    ManagementGroupOwners,
    /// Lists Azure management group descendants
    ManagementGroupDescendants,
    /// Lists Azure management group user access admins
    ManagementGroupUserAccessAdmins,
    /// Lists Azure resource groups
    ResourceGroups,
    /// Lists Azure resource group owners
    ResourceGroupOwners,
    /// Lists Azure resource group user access admins
    ResourceGroupUserAccessAdmins,
    /// Lists Azure Active Directory roles
    Roles,
    /// Lists Azure Active Directory role assignments
    RoleAssignments,
    /// Lists Azure Active Directory service principals
    ServicePrincipals,
    /// Lists Azure Active Directory service principal owners
    ServicePrincipalOwners,
    /// Lists Azure subscriptions
    Subscriptions,
    /// Lists Azure subscription owners
    SubscriptionOwners,
    /// Lists Azure subscription user access admins
    SubscriptionUserAccessAdmins,
    /// Lists Azure Active Directory tenants
    Tenants,
    /// Lists Azure Active Directory users
    Users,
    /// Lists Azure virtual machines
    VirtualMachines,
    /// Lists Azure virtual machine owners
    VirtualMachineOwners,
    /// Lists Azure virtual machine contributors
    VirtualMachineContributors,
    /// Lists Azure virtual machine avere contributors
    VirtualMachineAvereContributors,
    /// Lists Azure virtual machine admin logins
    VirtualMachineAdminLogins,
    /// Lists Azure virtual machine user access admins
    VirtualMachineUserAccessAdmins,
    /// Lists Azure virtual machine VM contributors
    VirtualMachineVmContributors,
}

pub async fn run_list(settings: Settings, target: Option<ListTarget>) -> Result<()> {
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    debug!("testing connections");
    let client = AzureRestClient::connect(settings.azure)
        .await
        .context("pre-flight check failed")?;
    client
        .test_connection()
        .await
        .context("pre-flight check failed")?;
    let client: Arc<dyn AzureClient> = Arc::new(client);

    info!("collecting azure objects...");
    let start = Instant::now();
    let stream = build_stream(&cancel, &client, target);
    sink::output_stream(stream, settings.output.as_deref()).await?;
    info!(duration = ?start.elapsed(), "collection completed");
    Ok(())
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut terminate) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = terminate.recv() => {}
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        info!("shutting down gracefully...");
        cancel.cancel();
    });
}

/// Builds the stream for one target, composing the upstream chain the
/// standalone subcommands need.
fn build_stream(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    target: Option<ListTarget>,
) -> RecordStream {
    let vm_role_assignments = |cancel: &CancellationToken, client: &Arc<dyn AzureClient>| {
        let subscriptions = c::list_subscriptions(cancel, client);
        let virtual_machines = c::list_virtual_machines(cancel, client, subscriptions);
        c::list_virtual_machine_role_assignments(cancel, client, virtual_machines)
    };

    match target {
        None => orchestrator::list_all(cancel, client),
        Some(ListTarget::Apps) => c::list_apps(cancel, client),
        Some(ListTarget::AppOwners) => {
            c::list_app_owners(cancel, client, c::list_apps(cancel, client))
        }
        Some(ListTarget::Devices) => c::list_devices(cancel, client),
        Some(ListTarget::DeviceOwners) => {
            c::list_device_owners(cancel, client, c::list_devices(cancel, client))
        }
        Some(ListTarget::Groups) => c::list_groups(cancel, client),
        Some(ListTarget::GroupOwners) => {
            c::list_group_owners(cancel, client, c::list_groups(cancel, client))
        }
        Some(ListTarget::GroupMembers) => {
            c::list_group_members(cancel, client, c::list_groups(cancel, client))
        }
        Some(ListTarget::KeyVaults) => {
            c::list_key_vaults(cancel, client, c::list_subscriptions(cancel, client))
        }
        Some(ListTarget::KeyVaultOwners) => {
            let key_vaults =
                c::list_key_vaults(cancel, client, c::list_subscriptions(cancel, client));
            c::list_key_vault_owners(cancel, client, key_vaults)
        }
        Some(ListTarget::KeyVaultAccessPolicies) => {
            let key_vaults =
                c::list_key_vaults(cancel, client, c::list_subscriptions(cancel, client));
            c::list_key_vault_access_policies(cancel, client, key_vaults)
        }
        Some(ListTarget::KeyVaultContributors) => {
            let key_vaults =
                c::list_key_vaults(cancel, client, c::list_subscriptions(cancel, client));
            c::list_key_vault_contributors(cancel, client, key_vaults)
        }
        Some(ListTarget::KeyVaultUserAccessAdmins) => {
            let key_vaults =
                c::list_key_vaults(cancel, client, c::list_subscriptions(cancel, client));
            c::list_key_vault_user_access_admins(cancel, client, key_vaults)
        }
        Some(ListTarget::ManagementGroups) => c::list_management_groups(cancel, client),
        Some(ListTarget::ManagementGroupOwners) => c::list_management_group_owners(
            cancel,
            client,
            c::list_management_groups(cancel, client),
        ),
        Some(ListTarget::ManagementGroupDescendants) => c::list_management_group_descendants(
            cancel,
            client,
            c::list_management_groups(cancel, client),
        ),
        Some(ListTarget::ManagementGroupUserAccessAdmins) => {
            c::list_management_group_user_access_admins(
                cancel,
                client,
                c::list_management_groups(cancel, client),
            )
        }
        Some(ListTarget::ResourceGroups) => {
            c::list_resource_groups(cancel, client, c::list_subscriptions(cancel, client))
        }
        Some(ListTarget::ResourceGroupOwners) => {
            let resource_groups =
                c::list_resource_groups(cancel, client, c::list_subscriptions(cancel, client));
            c::list_resource_group_owners(cancel, client, resource_groups)
        }
        Some(ListTarget::ResourceGroupUserAccessAdmins) => {
            let resource_groups =
                c::list_resource_groups(cancel, client, c::list_subscriptions(cancel, client));
            c::list_resource_group_user_access_admins(cancel, client, resource_groups)
        }
        Some(ListTarget::Roles) => c::list_roles(cancel, client),
        Some(ListTarget::RoleAssignments) => {
            c::list_role_assignments(cancel, client, c::list_roles(cancel, client))
        }
        Some(ListTarget::ServicePrincipals) => c::list_service_principals(cancel, client),
        Some(ListTarget::ServicePrincipalOwners) => c::list_service_principal_owners(
            cancel,
            client,
            c::list_service_principals(cancel, client),
        ),
        Some(ListTarget::Subscriptions) => c::list_subscriptions(cancel, client),
        Some(ListTarget::SubscriptionOwners) => {
            c::list_subscription_owners(cancel, client, c::list_subscriptions(cancel, client))
        }
        Some(ListTarget::SubscriptionUserAccessAdmins) => c::list_subscription_user_access_admins(
            cancel,
            client,
            c::list_subscriptions(cancel, client),
        ),
        Some(ListTarget::Tenants) => c::list_tenants(cancel, client),
        Some(ListTarget::Users) => c::list_users(cancel, client),
        Some(ListTarget::VirtualMachines) => {
            c::list_virtual_machines(cancel, client, c::list_subscriptions(cancel, client))
        }
        Some(ListTarget::VirtualMachineOwners) => {
            c::list_virtual_machine_owners(cancel, vm_role_assignments(cancel, client))
        }
        Some(ListTarget::VirtualMachineContributors) => {
            c::list_virtual_machine_contributors(cancel, vm_role_assignments(cancel, client))
        }
        Some(ListTarget::VirtualMachineAvereContributors) => {
            c::list_virtual_machine_avere_contributors(cancel, vm_role_assignments(cancel, client))
        }
        Some(ListTarget::VirtualMachineAdminLogins) => {
            c::list_virtual_machine_admin_logins(cancel, vm_role_assignments(cancel, client))
        }
        Some(ListTarget::VirtualMachineUserAccessAdmins) => {
            c::list_virtual_machine_user_access_admins(cancel, vm_role_assignments(cancel, client))
        }
        Some(ListTarget::VirtualMachineVmContributors) => {
            c::list_virtual_machine_vm_contributors(cancel, vm_role_assignments(cancel, client))
        }
    }
}

#[cfg(test)]
mod tests {
    use aw_client::mock::MockAzureClient;
    use aw_core::Record;

    use super::*;

    #[tokio::test]
    async fn single_collector_target_builds_a_working_stream() {
        let client: Arc<dyn AzureClient> = Arc::new(MockAzureClient::new().with_apps(vec![Ok(
            aw_core::azure::Application {
                id: "a1".into(),
                display_name: "billing".into(),
                ..Default::default()
            },
        )]));
        let cancel = CancellationToken::new();
        let mut stream = build_stream(&cancel, &client, Some(ListTarget::Apps));
        assert!(matches!(stream.recv().await, Some(Record::App(_))));
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn edge_target_composes_its_upstream_chain() {
        let client: Arc<dyn AzureClient> = Arc::new(MockAzureClient::new());
        let cancel = CancellationToken::new();
        // No subscriptions configured: the chained pipeline must still
        // close cleanly with no records.
        let mut stream = build_stream(
            &cancel,
            &client,
            Some(ListTarget::VirtualMachineOwners),
        );
        assert!(stream.recv().await.is_none());
    }
}
