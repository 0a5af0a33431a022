//! Resource group collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::constants::{OWNER_ROLE_ID, USER_ACCESS_ADMIN_ROLE_ID};
use aw_core::models::{
    ResourceGroup, ResourceGroupOwner, ResourceGroupOwners, ResourceGroupUserAccessAdmin,
    ResourceGroupUserAccessAdmins,
};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::support::{fan_out, parent_keys, resource_role_edge, RecordStream};

/// Emits one [`Record::ResourceGroup`] per resource group of each upstream
/// subscription.
pub fn list_resource_groups(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    subscriptions: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, subscriptions, "resource groups", |record| {
        match record {
            Record::Subscription(s) => Some(s.subscription.subscription_id.clone()),
            _ => None,
        }
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all resource groups",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items = client.list_azure_resource_groups(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(resource_group) => {
                            count += 1;
                            let record = Record::ResourceGroup(ResourceGroup {
                                resource_group,
                                subscription_id: id.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, subscription_id = %id, "unable to continue processing resource groups for this subscription");
                        }
                    }
                }
                debug!(subscription_id = %id, count, "finished listing resource groups");
            }
        },
    )
}

fn resource_group_scope(record: &Record) -> Option<(String, String)> {
    match record {
        Record::ResourceGroup(rg) => Some((
            rg.resource_group.id.clone(),
            rg.resource_group.id.clone(),
        )),
        _ => None,
    }
}

/// Emits one aggregate [`Record::ResourceGroupOwners`] per resource group.
pub fn list_resource_group_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    resource_groups: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        resource_groups,
        "resource group owners",
        "finished listing all resource group owners",
        OWNER_ROLE_ID,
        resource_group_scope,
        |key, matched| {
            Record::ResourceGroupOwners(ResourceGroupOwners {
                resource_group_id: key.to_string(),
                owners: matched
                    .into_iter()
                    .map(|owner| ResourceGroupOwner {
                        owner,
                        resource_group_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::ResourceGroupUserAccessAdmins`] per
/// resource group.
pub fn list_resource_group_user_access_admins(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    resource_groups: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        resource_groups,
        "resource group user access admins",
        "finished listing all resource group user access admins",
        USER_ACCESS_ADMIN_ROLE_ID,
        resource_group_scope,
        |key, matched| {
            Record::ResourceGroupUserAccessAdmins(ResourceGroupUserAccessAdmins {
                resource_group_id: key.to_string(),
                user_access_admins: matched
                    .into_iter()
                    .map(|user_access_admin| ResourceGroupUserAccessAdmin {
                        user_access_admin,
                        resource_group_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}
