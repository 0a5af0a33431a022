//! Key vault collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::azure::KeyVaultAccessType;
use aw_core::constants::{KEY_VAULT_CONTRIBUTOR_ROLE_ID, OWNER_ROLE_ID, USER_ACCESS_ADMIN_ROLE_ID};
use aw_core::models::{
    KeyVault, KeyVaultAccessPolicy, KeyVaultContributor, KeyVaultContributors, KeyVaultOwner,
    KeyVaultOwners, KeyVaultUserAccessAdmin, KeyVaultUserAccessAdmins,
};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::support::{fan_out, parent_keys, resource_role_edge, RecordStream};

/// Access policy capabilities that yield an edge record.
const ACCESS_POLICY_FILTER: &[KeyVaultAccessType] =
    &[KeyVaultAccessType::GetCerts, KeyVaultAccessType::GetKeys];

/// Emits one [`Record::KeyVault`] per key vault of each upstream
/// subscription.
pub fn list_key_vaults(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    subscriptions: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, subscriptions, "key vaults", |record| match record {
        Record::Subscription(s) => Some(s.subscription.subscription_id.clone()),
        _ => None,
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all key vaults",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items = client.list_azure_key_vaults(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(key_vault) => {
                            count += 1;
                            let record = Record::KeyVault(KeyVault {
                                key_vault,
                                subscription_id: id.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, subscription_id = %id, "unable to continue processing key vaults for this subscription");
                        }
                    }
                }
                debug!(subscription_id = %id, count, "finished listing key vaults");
            }
        },
    )
}

/// Emits one [`Record::KeyVaultAccessPolicy`] per access policy entry that
/// grants `Get` on certificates or keys.
pub fn list_key_vault_access_policies(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    key_vaults: RecordStream,
) -> RecordStream {
    let ids = parent_keys(
        cancel,
        key_vaults,
        "key vault access policies",
        |record| match record {
            Record::KeyVault(kv) => Some(kv.key_vault.id.clone()),
            _ => None,
        },
    );
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all key vault access policies",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items = client.list_azure_key_vault_access_policies(
                    emitter.cancellation(),
                    &id,
                    ACCESS_POLICY_FILTER,
                );
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(access_policy) => {
                            count += 1;
                            let record = Record::KeyVaultAccessPolicy(KeyVaultAccessPolicy {
                                key_vault_id: id.clone(),
                                access_policy,
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, key_vault_id = %id, "unable to continue processing access policies for this key vault");
                        }
                    }
                }
                debug!(key_vault_id = %id, count, "finished listing key vault access policies");
            }
        },
    )
}

fn key_vault_scope(record: &Record) -> Option<(String, String)> {
    match record {
        Record::KeyVault(kv) => Some((kv.key_vault.id.clone(), kv.key_vault.id.clone())),
        _ => None,
    }
}

/// Emits one aggregate [`Record::KeyVaultOwners`] per key vault.
pub fn list_key_vault_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    key_vaults: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        key_vaults,
        "key vault owners",
        "finished listing all key vault owners",
        OWNER_ROLE_ID,
        key_vault_scope,
        |key, matched| {
            Record::KeyVaultOwners(KeyVaultOwners {
                key_vault_id: key.to_string(),
                owners: matched
                    .into_iter()
                    .map(|owner| KeyVaultOwner {
                        owner,
                        key_vault_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::KeyVaultContributors`] per key vault,
/// containing its Key Vault Contributor role assignments.
pub fn list_key_vault_contributors(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    key_vaults: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        key_vaults,
        "key vault contributors",
        "finished listing all key vault contributors",
        KEY_VAULT_CONTRIBUTOR_ROLE_ID,
        key_vault_scope,
        |key, matched| {
            Record::KeyVaultContributors(KeyVaultContributors {
                key_vault_id: key.to_string(),
                contributors: matched
                    .into_iter()
                    .map(|contributor| KeyVaultContributor {
                        contributor,
                        key_vault_id: key.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::KeyVaultUserAccessAdmins`] per key vault.
pub fn list_key_vault_user_access_admins(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    key_vaults: RecordStream,
) -> RecordStream {
    resource_role_edge(
        cancel,
        client,
        key_vaults,
        "key vault user access admins",
        "finished listing all key vault user access admins",
        USER_ACCESS_ADMIN_ROLE_ID,
        key_vault_scope,
        |key, matched| {
            Record::KeyVaultUserAccessAdmins(KeyVaultUserAccessAdmins {
                key_vault_id: key.to_string(),
                user_access_admins: matched
                    .into_iter()
                    .map(|user_access_admin| KeyVaultUserAccessAdmin {
                        user_access_admin,
                        key_vault_id: key.to_string(),
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
    use crate::collectors::list_subscriptions;

    fn vault(id: &str) -> azure::KeyVault {
        azure::KeyVault {
            id: id.to_string(),
            name: "kv".into(),
            ..Default::default()
        }
    }

    fn policy(object_id: &str, certificates: &[&str], keys: &[&str]) -> azure::KeyVaultAccessPolicyEntry {
        azure::KeyVaultAccessPolicyEntry {
            object_id: object_id.to_string(),
            permissions: azure::KeyVaultPermissions {
                certificates: certificates.iter().map(|s| s.to_string()).collect(),
                keys: keys.iter().map(|s| s.to_string()).collect(),
                secrets: Vec::new(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn access_policies_filter_on_get_certs_and_keys() {
        let subscription = azure::Subscription {
            id: "/subscriptions/s1".into(),
            subscription_id: "s1".into(),
            ..Default::default()
        };
        let vault_id = "/subscriptions/s1/providers/Microsoft.KeyVault/vaults/kv1";
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_subscriptions(vec![Ok(subscription)])
                .with_key_vaults("s1", vec![Ok(vault(vault_id))])
                .with_key_vault_access_policies(
                    vault_id,
                    vec![
                        Ok(policy("reader", &["Get"], &[])),
                        Ok(policy("lister", &["List"], &["List"])),
                        Ok(policy("key-reader", &[], &["Get"])),
                    ],
                ),
        );
        let cancel = CancellationToken::new();
        let vaults = list_key_vaults(&cancel, &client, list_subscriptions(&cancel, &client));
        let mut stream = list_key_vault_access_policies(&cancel, &client, vaults);

        let mut object_ids = Vec::new();
        while let Some(record) = stream.recv().await {
            match record {
                Record::KeyVaultAccessPolicy(policy) => {
                    assert_eq!(policy.key_vault_id, vault_id);
                    object_ids.push(policy.access_policy.object_id.clone());
                }
                other => panic!("unexpected record: {:?}", other.kind()),
            }
        }
        object_ids.sort();
        assert_eq!(object_ids, vec!["key-reader", "reader"]);
    }
}
