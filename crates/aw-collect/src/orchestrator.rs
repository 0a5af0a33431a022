//! Wires every collector into the static dependency DAG and merges their
//! outputs into one stream.
//!
//! Tee arities are const generic, so adding a consumer without widening
//! the tee fails to compile instead of stalling at runtime.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::pipeline;
use tokio_util::sync::CancellationToken;

use crate::collectors as c;
use crate::support::RecordStream;

/// Runs every collector against the tenant and returns the merged stream
/// of records in arrival order.
pub fn list_all(cancel: &CancellationToken, client: &Arc<dyn AzureClient>) -> RecordStream {
    // Apps and app owners.
    let [apps, apps2] = pipeline::tee(cancel, c::list_apps(cancel, client));
    let app_owners = c::list_app_owners(cancel, client, apps2);

    // Devices and device owners.
    let [devices, devices2] = pipeline::tee(cancel, c::list_devices(cancel, client));
    let device_owners = c::list_device_owners(cancel, client, devices2);

    // Groups, group owners and group members.
    let [groups, groups2, groups3] = pipeline::tee(cancel, c::list_groups(cancel, client));
    let group_owners = c::list_group_owners(cancel, client, groups2);
    let group_members = c::list_group_members(cancel, client, groups3);

    // Subscriptions feed the output plus five dependent families.
    let [subscriptions, subscriptions2, subscriptions3, subscriptions4, subscriptions5, subscriptions6] =
        pipeline::tee(cancel, c::list_subscriptions(cancel, client));
    let subscription_owners = c::list_subscription_owners(cancel, client, subscriptions5);
    let subscription_user_access_admins =
        c::list_subscription_user_access_admins(cancel, client, subscriptions6);

    // Key vaults and their edges.
    let [key_vaults, key_vaults2, key_vaults3, key_vaults4, key_vaults5] =
        pipeline::tee(cancel, c::list_key_vaults(cancel, client, subscriptions2));
    let key_vault_owners = c::list_key_vault_owners(cancel, client, key_vaults2);
    let key_vault_access_policies = c::list_key_vault_access_policies(cancel, client, key_vaults3);
    let key_vault_user_access_admins =
        c::list_key_vault_user_access_admins(cancel, client, key_vaults4);
    let key_vault_contributors = c::list_key_vault_contributors(cancel, client, key_vaults5);

    // Management groups and their edges.
    let [management_groups, management_groups2, management_groups3, management_groups4] =
        pipeline::tee(cancel, c::list_management_groups(cancel, client));
    let management_group_owners =
        c::list_management_group_owners(cancel, client, management_groups2);
    let management_group_descendants =
        c::list_management_group_descendants(cancel, client, management_groups3);
    let management_group_user_access_admins =
        c::list_management_group_user_access_admins(cancel, client, management_groups4);

    // Resource groups and their edges.
    let [resource_groups, resource_groups2, resource_groups3] =
        pipeline::tee(cancel, c::list_resource_groups(cancel, client, subscriptions3));
    let resource_group_owners = c::list_resource_group_owners(cancel, client, resource_groups2);
    let resource_group_user_access_admins =
        c::list_resource_group_user_access_admins(cancel, client, resource_groups3);

    // Service principals and their owners.
    let [service_principals, service_principals2] =
        pipeline::tee(cancel, c::list_service_principals(cancel, client));
    let service_principal_owners =
        c::list_service_principal_owners(cancel, client, service_principals2);

    // Tenants and users flow straight to the output.
    let tenants = c::list_tenants(cancel, client);
    let users = c::list_users(cancel, client);

    // Roles and role assignments.
    let [roles, roles2] = pipeline::tee(cancel, c::list_roles(cancel, client));
    let role_assignments = c::list_role_assignments(cancel, client, roles2);

    // Virtual machines: one role-assignment enumeration per VM, teed to
    // all six edge collectors.
    let [virtual_machines, virtual_machines2] =
        pipeline::tee(cancel, c::list_virtual_machines(cancel, client, subscriptions4));
    let [vm_assignments1, vm_assignments2, vm_assignments3, vm_assignments4, vm_assignments5, vm_assignments6] =
        pipeline::tee(
            cancel,
            c::list_virtual_machine_role_assignments(cancel, client, virtual_machines2),
        );
    let virtual_machine_owners = c::list_virtual_machine_owners(cancel, vm_assignments1);
    let virtual_machine_avere_contributors =
        c::list_virtual_machine_avere_contributors(cancel, vm_assignments2);
    let virtual_machine_contributors =
        c::list_virtual_machine_contributors(cancel, vm_assignments3);
    let virtual_machine_admin_logins =
        c::list_virtual_machine_admin_logins(cancel, vm_assignments4);
    let virtual_machine_user_access_admins =
        c::list_virtual_machine_user_access_admins(cancel, vm_assignments5);
    let virtual_machine_vm_contributors =
        c::list_virtual_machine_vm_contributors(cancel, vm_assignments6);

    pipeline::mux(
        cancel,
        vec![
            app_owners,
            apps,
            device_owners,
            devices,
            group_members,
            group_owners,
            groups,
            key_vault_access_policies,
            key_vault_contributors,
            key_vault_owners,
            key_vault_user_access_admins,
            key_vaults,
            management_group_descendants,
            management_group_owners,
            management_group_user_access_admins,
            management_groups,
            resource_group_owners,
            resource_group_user_access_admins,
            resource_groups,
            role_assignments,
            roles,
            service_principal_owners,
            service_principals,
            subscription_owners,
            subscription_user_access_admins,
            subscriptions,
            tenants,
            users,
            virtual_machine_admin_logins,
            virtual_machine_avere_contributors,
            virtual_machine_contributors,
            virtual_machine_owners,
            virtual_machine_user_access_admins,
            virtual_machine_vm_contributors,
            virtual_machines,
        ],
    )
}
