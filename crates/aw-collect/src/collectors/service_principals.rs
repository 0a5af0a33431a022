//! Service principal collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::models::{ServicePrincipal, ServicePrincipalOwner, ServicePrincipalOwners};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{fan_out, parent_keys, RecordStream};

/// Emits one [`Record::ServicePrincipal`] per service principal.
pub fn list_service_principals(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let tenant = client.tenant_info();
        let mut items = client.list_azure_ad_service_principals(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(service_principal) => {
                    debug!(service_principal = %service_principal.display_name, "found service principal");
                    count += 1;
                    let record = Record::ServicePrincipal(ServicePrincipal {
                        service_principal,
                        tenant_id: tenant.tenant_id.clone(),
                        tenant_name: tenant.display_name.clone(),
                    });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing service principals");
                    return;
                }
            }
        }
        info!(count, "finished listing all service principals");
    });
    rx
}

/// Emits one aggregate [`Record::ServicePrincipalOwners`] per upstream
/// service principal, carrying every owner discovered for it. A principal
/// with no owners still yields an aggregate with an empty child list.
pub fn list_service_principal_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    service_principals: RecordStream,
) -> RecordStream {
    let ids = parent_keys(
        cancel,
        service_principals,
        "service principal owners",
        |record| match record {
            Record::ServicePrincipal(sp) => Some(sp.service_principal.id.clone()),
            _ => None,
        },
    );
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all service principal owners",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut owners = ServicePrincipalOwners {
                    service_principal_id: id.clone(),
                    owners: Vec::new(),
                };
                let mut items =
                    client.list_azure_ad_service_principal_owners(emitter.cancellation(), &id);
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(owner) => {
                            owners.owners.push(ServicePrincipalOwner {
                                owner,
                                service_principal_id: id.clone(),
                            });
                        }
                        Err(err) => {
                            error!(error = %err, service_principal_id = %id, "unable to continue processing owners for this service principal");
                        }
                    }
                }
                let count = owners.owners.len();
                if !emitter.emit(Record::ServicePrincipalOwners(owners)).await {
                    return;
                }
                debug!(service_principal_id = %id, count, "finished listing service principal owners");
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aw_client::mock::MockAzureClient;
    use aw_core::azure;
    use serde_json::json;

    use super::*;

    fn service_principal(id: &str) -> azure::ServicePrincipal {
        azure::ServicePrincipal {
            id: id.to_string(),
            display_name: format!("sp {id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn aggregates_cover_every_parent_including_empty_ones() {
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_service_principals(vec![
                    Ok(service_principal("sp1")),
                    Ok(service_principal("sp2")),
                ])
                .with_service_principal_owners(
                    "sp1",
                    vec![
                        Ok(json!({"id": "o1"})),
                        Ok(json!({"id": "o2"})),
                        Ok(json!({"id": "o3"})),
                    ],
                ),
        );
        let cancel = CancellationToken::new();
        let mut stream = list_service_principal_owners(
            &cancel,
            &client,
            list_service_principals(&cancel, &client),
        );

        let mut by_parent = HashMap::new();
        while let Some(record) = stream.recv().await {
            match record {
                Record::ServicePrincipalOwners(owners) => {
                    by_parent.insert(owners.service_principal_id.clone(), owners.owners.len());
                }
                other => panic!("unexpected record: {:?}", other.kind()),
            }
        }
        assert_eq!(by_parent.len(), 2);
        assert_eq!(by_parent["sp1"], 3);
        assert_eq!(by_parent["sp2"], 0);
    }
}
