//! A configurable in-memory client for tests.
//!
//! Each enumerator replays a fixture list of ok/error items through the
//! same bounded, cancellable channels the real client uses, so collector
//! tests exercise the genuine streaming paths.

use std::collections::HashMap;

use async_trait::async_trait;
use aw_core::azure::{self, KeyVaultAccessType};
use aw_core::pipeline;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::{AzureClient, ItemStream};
use crate::error::{ClientError, ClientResult};

/// Mock client whose enumerators replay configured fixtures.
#[derive(Default)]
pub struct MockAzureClient {
    tenant: azure::Tenant,
    connection_error: Option<ClientError>,
    apps: Vec<ClientResult<azure::Application>>,
    app_owners: HashMap<String, Vec<ClientResult<Value>>>,
    devices: Vec<ClientResult<azure::Device>>,
    device_owners: HashMap<String, Vec<ClientResult<Value>>>,
    groups: Vec<ClientResult<azure::Group>>,
    group_owners: HashMap<String, Vec<ClientResult<Value>>>,
    group_members: HashMap<String, Vec<ClientResult<Value>>>,
    service_principals: Vec<ClientResult<azure::ServicePrincipal>>,
    service_principal_owners: HashMap<String, Vec<ClientResult<Value>>>,
    users: Vec<ClientResult<azure::User>>,
    tenants: Vec<ClientResult<azure::Tenant>>,
    roles: Vec<ClientResult<azure::Role>>,
    role_assignments: HashMap<String, Vec<ClientResult<azure::UnifiedRoleAssignment>>>,
    subscriptions: Vec<ClientResult<azure::Subscription>>,
    resource_groups: HashMap<String, Vec<ClientResult<azure::ResourceGroup>>>,
    management_groups: Vec<ClientResult<azure::ManagementGroup>>,
    management_group_descendants: HashMap<String, Vec<ClientResult<azure::DescendantInfo>>>,
    key_vaults: HashMap<String, Vec<ClientResult<azure::KeyVault>>>,
    key_vault_access_policies: HashMap<String, Vec<ClientResult<azure::KeyVaultAccessPolicyEntry>>>,
    virtual_machines: HashMap<String, Vec<ClientResult<azure::VirtualMachine>>>,
    resource_role_assignments: HashMap<String, Vec<ClientResult<azure::RoleAssignment>>>,
}

impl MockAzureClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant: azure::Tenant) -> Self {
        self.tenant = tenant;
        self
    }

    pub fn with_connection_error(mut self, error: ClientError) -> Self {
        self.connection_error = Some(error);
        self
    }

    pub fn with_apps(mut self, items: Vec<ClientResult<azure::Application>>) -> Self {
        self.apps = items;
        self
    }

    pub fn with_app_owners(mut self, app_id: &str, items: Vec<ClientResult<Value>>) -> Self {
        self.app_owners.insert(app_id.to_string(), items);
        self
    }

    pub fn with_devices(mut self, items: Vec<ClientResult<azure::Device>>) -> Self {
        self.devices = items;
        self
    }

    pub fn with_device_owners(mut self, device_id: &str, items: Vec<ClientResult<Value>>) -> Self {
        self.device_owners.insert(device_id.to_string(), items);
        self
    }

    pub fn with_groups(mut self, items: Vec<ClientResult<azure::Group>>) -> Self {
        self.groups = items;
        self
    }

    pub fn with_group_owners(mut self, group_id: &str, items: Vec<ClientResult<Value>>) -> Self {
        self.group_owners.insert(group_id.to_string(), items);
        self
    }

    pub fn with_group_members(mut self, group_id: &str, items: Vec<ClientResult<Value>>) -> Self {
        self.group_members.insert(group_id.to_string(), items);
        self
    }

    pub fn with_service_principals(
        mut self,
        items: Vec<ClientResult<azure::ServicePrincipal>>,
    ) -> Self {
        self.service_principals = items;
        self
    }

    pub fn with_service_principal_owners(
        mut self,
        service_principal_id: &str,
        items: Vec<ClientResult<Value>>,
    ) -> Self {
        self.service_principal_owners
            .insert(service_principal_id.to_string(), items);
        self
    }

    pub fn with_users(mut self, items: Vec<ClientResult<azure::User>>) -> Self {
        self.users = items;
        self
    }

    pub fn with_tenants(mut self, items: Vec<ClientResult<azure::Tenant>>) -> Self {
        self.tenants = items;
        self
    }

    pub fn with_roles(mut self, items: Vec<ClientResult<azure::Role>>) -> Self {
        self.roles = items;
        self
    }

    pub fn with_role_assignments(
        mut self,
        role_id: &str,
        items: Vec<ClientResult<azure::UnifiedRoleAssignment>>,
    ) -> Self {
        self.role_assignments.insert(role_id.to_string(), items);
        self
    }

    pub fn with_subscriptions(mut self, items: Vec<ClientResult<azure::Subscription>>) -> Self {
        self.subscriptions = items;
        self
    }

    pub fn with_resource_groups(
        mut self,
        subscription_id: &str,
        items: Vec<ClientResult<azure::ResourceGroup>>,
    ) -> Self {
        self.resource_groups
            .insert(subscription_id.to_string(), items);
        self
    }

    pub fn with_management_groups(
        mut self,
        items: Vec<ClientResult<azure::ManagementGroup>>,
    ) -> Self {
        self.management_groups = items;
        self
    }

    pub fn with_management_group_descendants(
        mut self,
        group_id: &str,
        items: Vec<ClientResult<azure::DescendantInfo>>,
    ) -> Self {
        self.management_group_descendants
            .insert(group_id.to_string(), items);
        self
    }

    pub fn with_key_vaults(
        mut self,
        subscription_id: &str,
        items: Vec<ClientResult<azure::KeyVault>>,
    ) -> Self {
        self.key_vaults.insert(subscription_id.to_string(), items);
        self
    }

    pub fn with_key_vault_access_policies(
        mut self,
        vault_id: &str,
        items: Vec<ClientResult<azure::KeyVaultAccessPolicyEntry>>,
    ) -> Self {
        self.key_vault_access_policies
            .insert(vault_id.to_string(), items);
        self
    }

    pub fn with_virtual_machines(
        mut self,
        subscription_id: &str,
        items: Vec<ClientResult<azure::VirtualMachine>>,
    ) -> Self {
        self.virtual_machines
            .insert(subscription_id.to_string(), items);
        self
    }

    pub fn with_resource_role_assignments(
        mut self,
        resource_id: &str,
        items: Vec<ClientResult<azure::RoleAssignment>>,
    ) -> Self {
        self.resource_role_assignments
            .insert(resource_id.to_string(), items);
        self
    }
}

fn replay<T: Send + 'static>(
    items: Vec<ClientResult<T>>,
    cancel: CancellationToken,
) -> ItemStream<T> {
    let (tx, rx) = pipeline::channel();
    tokio::spawn(async move {
        for item in items {
            if !pipeline::send_guarded(&cancel, &tx, item).await {
                return;
            }
        }
    });
    rx
}

fn keyed<T: Clone + Send + 'static>(
    map: &HashMap<String, Vec<ClientResult<T>>>,
    key: &str,
    cancel: CancellationToken,
) -> ItemStream<T> {
    replay(map.get(key).cloned().unwrap_or_default(), cancel)
}

#[async_trait]
impl AzureClient for MockAzureClient {
    fn tenant_info(&self) -> azure::Tenant {
        self.tenant.clone()
    }

    async fn test_connection(&self) -> ClientResult<()> {
        match &self.connection_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn list_azure_ad_apps(&self, cancel: CancellationToken) -> ItemStream<azure::Application> {
        replay(self.apps.clone(), cancel)
    }

    fn list_azure_ad_app_owners(
        &self,
        cancel: CancellationToken,
        app_id: &str,
    ) -> ItemStream<Value> {
        keyed(&self.app_owners, app_id, cancel)
    }

    fn list_azure_devices(&self, cancel: CancellationToken) -> ItemStream<azure::Device> {
        replay(self.devices.clone(), cancel)
    }

    fn list_azure_device_registered_owners(
        &self,
        cancel: CancellationToken,
        device_id: &str,
    ) -> ItemStream<Value> {
        keyed(&self.device_owners, device_id, cancel)
    }

    fn list_azure_ad_groups(&self, cancel: CancellationToken) -> ItemStream<azure::Group> {
        replay(self.groups.clone(), cancel)
    }

    fn list_azure_ad_group_owners(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<Value> {
        keyed(&self.group_owners, group_id, cancel)
    }

    fn list_azure_ad_group_members(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<Value> {
        keyed(&self.group_members, group_id, cancel)
    }

    fn list_azure_ad_service_principals(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::ServicePrincipal> {
        replay(self.service_principals.clone(), cancel)
    }

    fn list_azure_ad_service_principal_owners(
        &self,
        cancel: CancellationToken,
        service_principal_id: &str,
    ) -> ItemStream<Value> {
        keyed(&self.service_principal_owners, service_principal_id, cancel)
    }

    fn list_azure_ad_users(&self, cancel: CancellationToken) -> ItemStream<azure::User> {
        replay(self.users.clone(), cancel)
    }

    fn list_azure_ad_tenants(&self, cancel: CancellationToken) -> ItemStream<azure::Tenant> {
        replay(self.tenants.clone(), cancel)
    }

    fn list_azure_ad_roles(
        &self,
        cancel: CancellationToken,
        _tenant_id: &str,
    ) -> ItemStream<azure::Role> {
        replay(self.roles.clone(), cancel)
    }

    fn list_azure_ad_role_assignments(
        &self,
        cancel: CancellationToken,
        role_id: &str,
    ) -> ItemStream<azure::UnifiedRoleAssignment> {
        keyed(&self.role_assignments, role_id, cancel)
    }

    fn list_azure_subscriptions(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::Subscription> {
        replay(self.subscriptions.clone(), cancel)
    }

    fn list_azure_resource_groups(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::ResourceGroup> {
        keyed(&self.resource_groups, subscription_id, cancel)
    }

    fn list_azure_management_groups(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::ManagementGroup> {
        replay(self.management_groups.clone(), cancel)
    }

    fn list_azure_management_group_descendants(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<azure::DescendantInfo> {
        keyed(&self.management_group_descendants, group_id, cancel)
    }

    fn list_azure_key_vaults(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::KeyVault> {
        keyed(&self.key_vaults, subscription_id, cancel)
    }

    fn list_azure_key_vault_access_policies(
        &self,
        cancel: CancellationToken,
        vault_id: &str,
        filter: &[KeyVaultAccessType],
    ) -> ItemStream<azure::KeyVaultAccessPolicyEntry> {
        let items = self
            .key_vault_access_policies
            .get(vault_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|item| match item {
                Ok(entry) => filter.is_empty() || entry.grants_any(filter),
                Err(_) => true,
            })
            .collect();
        replay(items, cancel)
    }

    fn list_azure_virtual_machines(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::VirtualMachine> {
        keyed(&self.virtual_machines, subscription_id, cancel)
    }

    fn list_role_assignments_for_resource(
        &self,
        cancel: CancellationToken,
        resource_id: &str,
        _filter: &str,
    ) -> ItemStream<azure::RoleAssignment> {
        keyed(&self.resource_role_assignments, resource_id, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_fixtures_in_order() {
        let client = MockAzureClient::new().with_apps(vec![
            Ok(azure::Application {
                id: "a1".into(),
                ..Default::default()
            }),
            Err(ClientError::RequestFailed("boom".into())),
        ]);
        let mut stream = client.list_azure_ad_apps(CancellationToken::new());
        assert!(stream.recv().await.unwrap().is_ok());
        assert!(stream.recv().await.unwrap().is_err());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn unknown_parent_yields_empty_stream() {
        let client = MockAzureClient::new();
        let mut stream =
            client.list_azure_ad_app_owners(CancellationToken::new(), "missing");
        assert!(stream.recv().await.is_none());
    }
}
