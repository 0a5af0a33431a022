//! Azure AD group collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::models::{Group, GroupMember, GroupOwner};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{fan_out, parent_keys, RecordStream};

/// Emits one [`Record::Group`] per group in the tenant.
pub fn list_groups(cancel: &CancellationToken, client: &Arc<dyn AzureClient>) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let tenant = client.tenant_info();
        let mut items = client.list_azure_ad_groups(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(group) => {
                    debug!(group = %group.display_name, "found group");
                    count += 1;
                    let record = Record::Group(Group {
                        group,
                        tenant_id: tenant.tenant_id.clone(),
                        tenant_name: tenant.display_name.clone(),
                    });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing groups");
                    return;
                }
            }
        }
        info!(count, "finished listing all groups");
    });
    rx
}

/// Emits one [`Record::GroupOwner`] per owner of each upstream group.
pub fn list_group_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    groups: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, groups, "group owners", |record| match record {
        Record::Group(group) => Some(group.group.id.clone()),
        _ => None,
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all group owners",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items = client.list_azure_ad_group_owners(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(owner) => {
                            count += 1;
                            let record = Record::GroupOwner(GroupOwner {
                                owner,
                                group_id: id.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, group_id = %id, "unable to continue processing owners for this group");
                        }
                    }
                }
                debug!(group_id = %id, count, "finished listing group owners");
            }
        },
    )
}

/// Emits one [`Record::GroupMember`] per member of each upstream group.
pub fn list_group_members(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    groups: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, groups, "group members", |record| match record {
        Record::Group(group) => Some(group.group.id.clone()),
        _ => None,
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all group members",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items = client.list_azure_ad_group_members(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(member) => {
                            count += 1;
                            let record = Record::GroupMember(GroupMember {
                                member,
                                group_id: id.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, group_id = %id, "unable to continue processing members for this group");
                        }
                    }
                }
                debug!(group_id = %id, count, "finished listing group members");
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use aw_client::mock::MockAzureClient;
    use aw_core::azure;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn members_and_owners_share_the_same_upstream_shape() {
        let group = azure::Group {
            id: "g1".into(),
            display_name: "ops".into(),
            ..Default::default()
        };
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_groups(vec![Ok(group)])
                .with_group_owners("g1", vec![Ok(json!({"id": "owner-1"}))])
                .with_group_members(
                    "g1",
                    vec![Ok(json!({"id": "member-1"})), Ok(json!({"id": "member-2"}))],
                ),
        );
        let cancel = CancellationToken::new();

        let mut owners = list_group_owners(&cancel, &client, list_groups(&cancel, &client));
        let mut owner_count = 0;
        while let Some(record) = owners.recv().await {
            assert!(matches!(record, Record::GroupOwner(_)));
            owner_count += 1;
        }
        assert_eq!(owner_count, 1);

        let mut members = list_group_members(&cancel, &client, list_groups(&cancel, &client));
        let mut member_count = 0;
        while let Some(record) = members.recv().await {
            assert!(matches!(record, Record::GroupMember(_)));
            member_count += 1;
        }
        assert_eq!(member_count, 2);
    }
}
