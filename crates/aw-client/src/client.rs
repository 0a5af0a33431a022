//! The `AzureClient` capability trait and its REST implementation.
//!
//! Every enumerator takes the shared cancellation token and immediately
//! returns a bounded receiver; a background task pages through the API and
//! feeds items in. Pagination, retry and throttling live below in
//! [`Transport`]; collectors only ever see `Result` items.

use std::sync::Arc;

use async_trait::async_trait;
use aw_core::azure::{self, KeyVaultAccessType};
use aw_core::pipeline;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::AzureConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::Transport;
use crate::pages::{ArmPage, ODataPage, Page};

/// A lazy stream of enumerator items.
pub type ItemStream<T> = mpsc::Receiver<ClientResult<T>>;

const ARM_TENANT_API_VERSION: &str = "2020-01-01";
const ARM_SUBSCRIPTION_API_VERSION: &str = "2020-01-01";
const ARM_RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";
const ARM_MANAGEMENT_GROUP_API_VERSION: &str = "2020-05-01";
const ARM_KEY_VAULT_API_VERSION: &str = "2022-07-01";
const ARM_VIRTUAL_MACHINE_API_VERSION: &str = "2023-03-01";
const ARM_ROLE_ASSIGNMENT_API_VERSION: &str = "2022-04-01";

/// The narrow client capability the collectors depend on.
///
/// Operation names follow the APIs they wrap. Every enumerator honours the
/// cancellation token: the stream closes promptly and in-flight requests
/// are abandoned once it fires.
#[async_trait]
pub trait AzureClient: Send + Sync {
    /// The tenant this client is bound to, resolved at connect time.
    fn tenant_info(&self) -> azure::Tenant;

    /// Pre-flight probe of the Graph and ARM endpoints.
    async fn test_connection(&self) -> ClientResult<()>;

    fn list_azure_ad_apps(&self, cancel: CancellationToken) -> ItemStream<azure::Application>;
    fn list_azure_ad_app_owners(
        &self,
        cancel: CancellationToken,
        app_id: &str,
    ) -> ItemStream<Value>;
    fn list_azure_devices(&self, cancel: CancellationToken) -> ItemStream<azure::Device>;
    fn list_azure_device_registered_owners(
        &self,
        cancel: CancellationToken,
        device_id: &str,
    ) -> ItemStream<Value>;
    fn list_azure_ad_groups(&self, cancel: CancellationToken) -> ItemStream<azure::Group>;
    fn list_azure_ad_group_owners(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<Value>;
    fn list_azure_ad_group_members(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<Value>;
    fn list_azure_ad_service_principals(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::ServicePrincipal>;
    fn list_azure_ad_service_principal_owners(
        &self,
        cancel: CancellationToken,
        service_principal_id: &str,
    ) -> ItemStream<Value>;
    fn list_azure_ad_users(&self, cancel: CancellationToken) -> ItemStream<azure::User>;
    fn list_azure_ad_tenants(&self, cancel: CancellationToken) -> ItemStream<azure::Tenant>;
    fn list_azure_ad_roles(
        &self,
        cancel: CancellationToken,
        tenant_id: &str,
    ) -> ItemStream<azure::Role>;
    fn list_azure_ad_role_assignments(
        &self,
        cancel: CancellationToken,
        role_id: &str,
    ) -> ItemStream<azure::UnifiedRoleAssignment>;
    fn list_azure_subscriptions(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::Subscription>;
    fn list_azure_resource_groups(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::ResourceGroup>;
    fn list_azure_management_groups(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::ManagementGroup>;
    fn list_azure_management_group_descendants(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<azure::DescendantInfo>;
    fn list_azure_key_vaults(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::KeyVault>;
    fn list_azure_key_vault_access_policies(
        &self,
        cancel: CancellationToken,
        vault_id: &str,
        filter: &[KeyVaultAccessType],
    ) -> ItemStream<azure::KeyVaultAccessPolicyEntry>;
    fn list_azure_virtual_machines(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::VirtualMachine>;
    fn list_role_assignments_for_resource(
        &self,
        cancel: CancellationToken,
        resource_id: &str,
        filter: &str,
    ) -> ItemStream<azure::RoleAssignment>;
}

/// Shape of one entry of the Graph `/organization` listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OrganizationProfile {
    id: String,
    display_name: String,
    verified_domains: Vec<VerifiedDomain>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VerifiedDomain {
    name: String,
    is_default: Option<bool>,
}

/// Production client against Microsoft Graph and Azure Resource Manager.
pub struct AzureRestClient {
    transport: Arc<Transport>,
    graph_url: String,
    management_url: String,
    tenant: azure::Tenant,
}

impl AzureRestClient {
    /// Builds the transport, acquires tokens for both audiences and
    /// resolves the tenant organization profile.
    ///
    /// # Errors
    ///
    /// Any failure here is a pre-flight failure: the caller must exit
    /// before starting the pipeline.
    #[instrument(skip(config), fields(tenant = %config.tenant_id))]
    pub async fn connect(config: AzureConfig) -> ClientResult<Self> {
        let transport = Arc::new(Transport::new(&config)?);
        let graph_url = config.graph_url.trim_end_matches('/').to_string();
        let management_url = config.management_url.trim_end_matches('/').to_string();

        let url = format!("{graph_url}/v1.0/organization");
        let page: ODataPage<OrganizationProfile> = transport.get_json(&graph_url, &url).await?;
        let org = page.value.into_iter().next().ok_or_else(|| {
            ClientError::InvalidResponse("organization listing returned no entries".into())
        })?;
        debug!(tenant = %org.display_name, "resolved tenant organization");

        let tenant = azure::Tenant {
            id: format!("/tenants/{}", org.id),
            tenant_id: org.id,
            display_name: org.display_name,
            default_domain: org
                .verified_domains
                .iter()
                .find(|d| d.is_default.unwrap_or(false))
                .map(|d| d.name.clone()),
            ..Default::default()
        };

        Ok(Self {
            transport,
            graph_url,
            management_url,
            tenant,
        })
    }

    /// Spawns a task that walks a paginated listing, forwarding each item.
    /// On a request failure the error is forwarded once and the stream
    /// closes; pagination cannot continue past a failed page.
    fn spawn_paged<T, P>(
        &self,
        cancel: CancellationToken,
        resource: String,
        first_url: String,
    ) -> ItemStream<T>
    where
        T: Send + 'static,
        P: Page<T> + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let (tx, rx) = pipeline::channel();
        tokio::spawn(async move {
            let mut next = Some(first_url);
            while let Some(url) = next.take() {
                let page = tokio::select! {
                    _ = cancel.cancelled() => return,
                    page = transport.get_json::<P>(&resource, &url) => page,
                };
                match page {
                    Ok(page) => {
                        let (items, next_link) = page.into_parts();
                        for item in items {
                            if !pipeline::send_guarded(&cancel, &tx, Ok(item)).await {
                                return;
                            }
                        }
                        next = next_link;
                    }
                    Err(err) => {
                        let _ = pipeline::send_guarded(&cancel, &tx, Err(err)).await;
                        return;
                    }
                }
            }
        });
        rx
    }

    fn graph_list<T>(&self, cancel: CancellationToken, path: String) -> ItemStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}/v1.0{}", self.graph_url, path);
        self.spawn_paged::<T, ODataPage<T>>(cancel, self.graph_url.clone(), url)
    }

    fn arm_list<T>(&self, cancel: CancellationToken, path_and_query: String) -> ItemStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}{}", self.management_url, path_and_query);
        self.spawn_paged::<T, ArmPage<T>>(cancel, self.management_url.clone(), url)
    }
}

#[async_trait]
impl AzureClient for AzureRestClient {
    fn tenant_info(&self) -> azure::Tenant {
        self.tenant.clone()
    }

    async fn test_connection(&self) -> ClientResult<()> {
        let url = format!("{}/v1.0/organization", self.graph_url);
        let _: ODataPage<OrganizationProfile> =
            self.transport.get_json(&self.graph_url, &url).await?;
        let url = format!(
            "{}/tenants?api-version={}",
            self.management_url, ARM_TENANT_API_VERSION
        );
        let _: ArmPage<azure::Tenant> = self
            .transport
            .get_json(&self.management_url, &url)
            .await?;
        Ok(())
    }

    fn list_azure_ad_apps(&self, cancel: CancellationToken) -> ItemStream<azure::Application> {
        self.graph_list(cancel, "/applications".to_string())
    }

    fn list_azure_ad_app_owners(
        &self,
        cancel: CancellationToken,
        app_id: &str,
    ) -> ItemStream<Value> {
        self.graph_list(cancel, format!("/applications/{app_id}/owners"))
    }

    fn list_azure_devices(&self, cancel: CancellationToken) -> ItemStream<azure::Device> {
        self.graph_list(cancel, "/devices".to_string())
    }

    fn list_azure_device_registered_owners(
        &self,
        cancel: CancellationToken,
        device_id: &str,
    ) -> ItemStream<Value> {
        self.graph_list(cancel, format!("/devices/{device_id}/registeredOwners"))
    }

    fn list_azure_ad_groups(&self, cancel: CancellationToken) -> ItemStream<azure::Group> {
        self.graph_list(cancel, "/groups".to_string())
    }

    fn list_azure_ad_group_owners(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<Value> {
        self.graph_list(cancel, format!("/groups/{group_id}/owners"))
    }

    fn list_azure_ad_group_members(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<Value> {
        self.graph_list(cancel, format!("/groups/{group_id}/members"))
    }

    fn list_azure_ad_service_principals(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::ServicePrincipal> {
        self.graph_list(cancel, "/servicePrincipals".to_string())
    }

    fn list_azure_ad_service_principal_owners(
        &self,
        cancel: CancellationToken,
        service_principal_id: &str,
    ) -> ItemStream<Value> {
        self.graph_list(
            cancel,
            format!("/servicePrincipals/{service_principal_id}/owners"),
        )
    }

    fn list_azure_ad_users(&self, cancel: CancellationToken) -> ItemStream<azure::User> {
        self.graph_list(cancel, "/users".to_string())
    }

    fn list_azure_ad_tenants(&self, cancel: CancellationToken) -> ItemStream<azure::Tenant> {
        self.arm_list(
            cancel,
            format!("/tenants?api-version={ARM_TENANT_API_VERSION}"),
        )
    }

    fn list_azure_ad_roles(
        &self,
        cancel: CancellationToken,
        tenant_id: &str,
    ) -> ItemStream<azure::Role> {
        // The Graph token is already tenant-scoped; the id is contract only.
        debug!(tenant_id, "listing directory role definitions");
        self.graph_list(cancel, "/roleManagement/directory/roleDefinitions".to_string())
    }

    fn list_azure_ad_role_assignments(
        &self,
        cancel: CancellationToken,
        role_id: &str,
    ) -> ItemStream<azure::UnifiedRoleAssignment> {
        let filter = urlencoding::encode(&format!("roleDefinitionId eq '{role_id}'")).into_owned();
        self.graph_list(
            cancel,
            format!("/roleManagement/directory/roleAssignments?$filter={filter}"),
        )
    }

    fn list_azure_subscriptions(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::Subscription> {
        self.arm_list(
            cancel,
            format!("/subscriptions?api-version={ARM_SUBSCRIPTION_API_VERSION}"),
        )
    }

    fn list_azure_resource_groups(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::ResourceGroup> {
        self.arm_list(
            cancel,
            format!(
                "/subscriptions/{subscription_id}/resourcegroups?api-version={ARM_RESOURCE_GROUP_API_VERSION}"
            ),
        )
    }

    fn list_azure_management_groups(
        &self,
        cancel: CancellationToken,
    ) -> ItemStream<azure::ManagementGroup> {
        self.arm_list(
            cancel,
            format!(
                "/providers/Microsoft.Management/managementGroups?api-version={ARM_MANAGEMENT_GROUP_API_VERSION}"
            ),
        )
    }

    fn list_azure_management_group_descendants(
        &self,
        cancel: CancellationToken,
        group_id: &str,
    ) -> ItemStream<azure::DescendantInfo> {
        self.arm_list(
            cancel,
            format!("{group_id}/descendants?api-version={ARM_MANAGEMENT_GROUP_API_VERSION}"),
        )
    }

    fn list_azure_key_vaults(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::KeyVault> {
        self.arm_list(
            cancel,
            format!(
                "/subscriptions/{subscription_id}/providers/Microsoft.KeyVault/vaults?api-version={ARM_KEY_VAULT_API_VERSION}"
            ),
        )
    }

    fn list_azure_key_vault_access_policies(
        &self,
        cancel: CancellationToken,
        vault_id: &str,
        filter: &[KeyVaultAccessType],
    ) -> ItemStream<azure::KeyVaultAccessPolicyEntry> {
        // Access policies are carried on the vault resource itself; fetch
        // the vault once and stream the matching entries.
        let transport = Arc::clone(&self.transport);
        let resource = self.management_url.clone();
        let url = format!(
            "{}{vault_id}?api-version={ARM_KEY_VAULT_API_VERSION}",
            self.management_url
        );
        let filter = filter.to_vec();
        let (tx, rx) = pipeline::channel();
        tokio::spawn(async move {
            let vault = tokio::select! {
                _ = cancel.cancelled() => return,
                vault = transport.get_json::<azure::KeyVault>(&resource, &url) => vault,
            };
            match vault {
                Ok(vault) => {
                    for entry in vault.properties.access_policies {
                        if filter.is_empty() || entry.grants_any(&filter) {
                            if !pipeline::send_guarded(&cancel, &tx, Ok(entry)).await {
                                return;
                            }
                        }
                    }
                }
                Err(err) => {
                    let _ = pipeline::send_guarded(&cancel, &tx, Err(err)).await;
                }
            }
        });
        rx
    }

    fn list_azure_virtual_machines(
        &self,
        cancel: CancellationToken,
        subscription_id: &str,
    ) -> ItemStream<azure::VirtualMachine> {
        self.arm_list(
            cancel,
            format!(
                "/subscriptions/{subscription_id}/providers/Microsoft.Compute/virtualMachines?api-version={ARM_VIRTUAL_MACHINE_API_VERSION}"
            ),
        )
    }

    fn list_role_assignments_for_resource(
        &self,
        cancel: CancellationToken,
        resource_id: &str,
        filter: &str,
    ) -> ItemStream<azure::RoleAssignment> {
        let mut path = format!(
            "{resource_id}/providers/Microsoft.Authorization/roleAssignments?api-version={ARM_ROLE_ASSIGNMENT_API_VERSION}"
        );
        if !filter.is_empty() {
            path.push_str("&$filter=");
            path.push_str(&urlencoding::encode(filter));
        }
        self.arm_list(cancel, path)
    }
}
