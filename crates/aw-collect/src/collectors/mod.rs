//! Per-object-type collectors.
//!
//! Leaf collectors drive one enumerator and stop cleanly on the first
//! client error. Dependent collectors read a stream of parent records,
//! fan the parent ids out across a bounded worker pool, and emit either
//! one record per child or one aggregate per parent.

mod apps;
mod devices;
mod groups;
mod key_vaults;
mod management_groups;
mod resource_groups;
mod roles;
mod service_principals;
mod subscriptions;
mod tenants;
mod users;
mod virtual_machines;

pub use apps::{list_app_owners, list_apps};
pub use devices::{list_device_owners, list_devices};
pub use groups::{list_group_members, list_group_owners, list_groups};
pub use key_vaults::{
    list_key_vault_access_policies, list_key_vault_contributors, list_key_vault_owners,
    list_key_vault_user_access_admins, list_key_vaults,
};
pub use management_groups::{
    list_management_group_descendants, list_management_group_owners,
    list_management_group_user_access_admins, list_management_groups,
};
pub use resource_groups::{
    list_resource_group_owners, list_resource_group_user_access_admins, list_resource_groups,
};
pub use roles::{list_role_assignments, list_roles};
pub use service_principals::{list_service_principal_owners, list_service_principals};
pub use subscriptions::{
    list_subscription_owners, list_subscription_user_access_admins, list_subscriptions,
};
pub use tenants::list_tenants;
pub use users::list_users;
pub use virtual_machines::{
    list_virtual_machine_admin_logins, list_virtual_machine_avere_contributors,
    list_virtual_machine_contributors, list_virtual_machine_owners,
    list_virtual_machine_role_assignments, list_virtual_machine_user_access_admins,
    list_virtual_machine_vm_contributors, list_virtual_machines, VmRoleAssignmentStream,
};
