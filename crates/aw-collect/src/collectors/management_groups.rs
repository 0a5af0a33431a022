//! Management group collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::constants::{OWNER_ROLE_ID, USER_ACCESS_ADMIN_ROLE_ID};
use aw_core::models::{
    ManagementGroup, ManagementGroupDescendant, ManagementGroupOwner, ManagementGroupOwners,
    ManagementGroupUserAccessAdmin, ManagementGroupUserAccessAdmins,
};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{fan_out, parent_keys, resource_role_edge, RecordStream};

/// Emits one [`Record::ManagementGroup`] per management group.
pub fn list_management_groups(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let mut items = client.list_azure_management_groups(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(management_group) => {
                    debug!(management_group = %management_group.name, "found management group");
                    count += 1;
                    let record = Record::ManagementGroup(ManagementGroup { management_group });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing management groups");
                    return;
                }
            }
        }
        info!(count, "finished listing all management groups");
    });
    rx
}

/// Emits one [`Record::ManagementGroupDescendant`] per descendant of each
/// upstream management group.
pub fn list_management_group_descendants(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    management_groups: RecordStream,
) -> RecordStream {
    let ids = parent_keys(
        cancel,
        management_groups,
        "management group descendants",
        |record| match record {
            Record::ManagementGroup(mg) => Some(mg.management_group.id.clone()),
            _ => None,
        },
    );
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all management group descendants",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items =
                    client.list_azure_management_group_descendants(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(descendant) => {
                            count += 1;
                            let record =
                                Record::ManagementGroupDescendant(ManagementGroupDescendant {
                                    management_group_id: id.clone(),
                                    descendant,
                                });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, management_group_id = %id, "unable to continue processing descendants for this management group");
                        }
                    }
                }
                debug!(management_group_id = %id, count, "finished listing management group descendants");
            }
        },
    )
}

fn management_group_scope(record: &Record) -> Option<(String, String)> {
    match record {
        Record::ManagementGroup(mg) => Some((
            mg.management_group.id.clone(),
            mg.management_group.id.clone(),
        )),
        _ => None,
    }
}

/// Emits one aggregate [`Record::ManagementGroupOwners`] per management
/// group.
pub fn list_management_group_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    management_groups: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        management_groups,
        "management group owners",
        "finished listing all management group owners",
        OWNER_ROLE_ID,
        management_group_scope,
        |key, matched| {
            Record::ManagementGroupOwners(ManagementGroupOwners {
                management_group_id: key.to_string(),
                owners: matched
                    .into_iter()
                    .map(|owner| ManagementGroupOwner {
                        owner,
                        management_group_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::ManagementGroupUserAccessAdmins`] per
/// management group.
pub fn list_management_group_user_access_admins(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    management_groups: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        management_groups,
        "management group user access admins",
        "finished listing all management group user access admins",
        USER_ACCESS_ADMIN_ROLE_ID,
        management_group_scope,
        |key, matched| {
            Record::ManagementGroupUserAccessAdmins(ManagementGroupUserAccessAdmins {
                management_group_id: key.to_string(),
                user_access_admins: matched
                    .into_iter()
                    .map(|user_access_admin| ManagementGroupUserAccessAdmin {
                        user_access_admin,
                        management_group_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use aw_client::mock::MockAzureClient;
    use aw_core::azure;

    use super::*;

    #[tokio::test]
    async fn descendants_are_emitted_per_item() {
        let mg = azure::ManagementGroup {
            id: "/providers/Microsoft.Management/managementGroups/root".into(),
            name: "root".into(),
            ..Default::default()
        };
        let descendant = azure::DescendantInfo {
            id: "/subscriptions/s1".into(),
            name: "s1".into(),
            descendant_type: "/subscriptions".into(),
            ..Default::default()
        };
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_management_groups(vec![Ok(mg)])
                .with_management_group_descendants(
                    "/providers/Microsoft.Management/managementGroups/root",
                    vec![Ok(descendant)],
                ),
        );
        let cancel = CancellationToken::new();
        let mut stream = list_management_group_descendants(
            &cancel,
            &client,
            list_management_groups(&cancel, &client),
        );

        match stream.recv().await.unwrap() {
            Record::ManagementGroupDescendant(d) => {
                assert_eq!(d.descendant.name, "s1");
                assert!(d.management_group_id.ends_with("/root"));
            }
            other => panic!("unexpected record: {:?}", other.kind()),
        }
        assert!(stream.recv().await.is_none());
    }
}
