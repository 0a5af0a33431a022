//! Subscription collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::constants::{OWNER_ROLE_ID, USER_ACCESS_ADMIN_ROLE_ID};
use aw_core::models::{
    Subscription, SubscriptionOwner, SubscriptionOwners, SubscriptionUserAccessAdmin,
    SubscriptionUserAccessAdmins,
};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{resource_role_edge, RecordStream};

/// Emits one [`Record::Subscription`] per subscription.
pub fn list_subscriptions(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let mut items = client.list_azure_subscriptions(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(subscription) => {
                    debug!(subscription = %subscription.display_name, "found subscription");
                    count += 1;
                    let record = Record::Subscription(Subscription { subscription });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing subscriptions");
                    return;
                }
            }
        }
        info!(count, "finished listing all subscriptions");
    });
    rx
}

fn subscription_scope(record: &Record) -> Option<(String, String)> {
    match record {
        Record::Subscription(s) => Some((
            s.subscription.id.clone(),
            s.subscription.subscription_id.clone(),
        )),
        _ => None,
    }
}

/// Emits one aggregate [`Record::SubscriptionOwners`] per subscription,
/// containing its Owner role assignments.
pub fn list_subscription_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    subscriptions: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        subscriptions,
        "subscription owners",
        "finished listing all subscription owners",
        OWNER_ROLE_ID,
        subscription_scope,
        |key, matched| {
            Record::SubscriptionOwners(SubscriptionOwners {
                subscription_id: key.to_string(),
                owners: matched
                    .into_iter()
                    .map(|owner| SubscriptionOwner {
                        owner,
                        subscription_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::SubscriptionUserAccessAdmins`] per
/// subscription, containing its User Access Administrator assignments.
pub fn list_subscription_user_access_admins(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    subscriptions: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        subscriptions,
        "subscription user access admins",
        "finished listing all subscription user access admins",
        USER_ACCESS_ADMIN_ROLE_ID,
        subscription_scope,
        |key, matched| {
            Record::SubscriptionUserAccessAdmins(SubscriptionUserAccessAdmins {
                subscription_id: key.to_string(),
                user_access_admins: matched
                    .into_iter()
                    .map(|user_access_admin| SubscriptionUserAccessAdmin {
                        user_access_admin,
                        subscription_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aw_client::mock::MockAzureClient;
    use aw_client::ClientError;
    use aw_core::azure;
    use aw_core::constants::OWNER_ROLE_ID;

    use super::*;

    fn subscription(guid: &str) -> azure::Subscription {
        azure::Subscription {
            id: format!("/subscriptions/{guid}"),
            subscription_id: guid.to_string(),
            display_name: format!("sub {guid}"),
            ..Default::default()
        }
    }

    fn assignment(role_id: &str) -> azure::RoleAssignment {
        azure::RoleAssignment {
            id: "ra".into(),
            properties: azure::RoleAssignmentProperties {
                role_definition_id: format!(
                    "/providers/Microsoft.Authorization/roleDefinitions/{role_id}"
                ),
                principal_id: Some("p".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn user_access_admins_filter_and_aggregate_per_subscription() {
        // S1: two matches and one unrelated role. S2: one match and a
        // client error that is logged and skipped.
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_subscriptions(vec![Ok(subscription("s1")), Ok(subscription("s2"))])
                .with_resource_role_assignments(
                    "/subscriptions/s1",
                    vec![
                        Ok(assignment(USER_ACCESS_ADMIN_ROLE_ID)),
                        Ok(assignment(USER_ACCESS_ADMIN_ROLE_ID)),
                        Ok(assignment(OWNER_ROLE_ID)),
                    ],
                )
                .with_resource_role_assignments(
                    "/subscriptions/s2",
                    vec![
                        Ok(assignment(USER_ACCESS_ADMIN_ROLE_ID)),
                        Err(ClientError::RequestFailed("boom".into())),
                    ],
                ),
        );
        let cancel = CancellationToken::new();
        let mut stream = list_subscription_user_access_admins(
            &cancel,
            &client,
            list_subscriptions(&cancel, &client),
        );

        let mut by_subscription = HashMap::new();
        while let Some(record) = stream.recv().await {
            match record {
                Record::SubscriptionUserAccessAdmins(admins) => {
                    by_subscription
                        .insert(admins.subscription_id.clone(), admins.user_access_admins.len());
                }
                other => panic!("unexpected record: {:?}", other.kind()),
            }
        }
        assert_eq!(by_subscription.len(), 2);
        assert_eq!(by_subscription["s1"], 2);
        assert_eq!(by_subscription["s2"], 1);
    }

    #[tokio::test]
    async fn empty_upstream_closes_cleanly() {
        let client: Arc<dyn AzureClient> = Arc::new(MockAzureClient::new());
        let cancel = CancellationToken::new();
        let mut stream =
            list_subscription_owners(&cancel, &client, list_subscriptions(&cancel, &client));
        assert!(stream.recv().await.is_none());
    }
}
