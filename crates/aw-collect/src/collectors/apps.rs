//! Azure AD application collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::models::{App, AppOwner};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{fan_out, parent_keys, RecordStream};

/// Emits one [`Record::App`] per application registration in the tenant.
pub fn list_apps(cancel: &CancellationToken, client: &Arc<dyn AzureClient>) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let tenant = client.tenant_info();
        let mut items = client.list_azure_ad_apps(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(application) => {
                    debug!(app = %application.display_name, "found application");
                    count += 1;
                    let record = Record::App(App {
                        application,
                        tenant_id: tenant.tenant_id.clone(),
                        tenant_name: tenant.display_name.clone(),
                    });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing applications");
                    return;
                }
            }
        }
        info!(count, "finished listing all apps");
    });
    rx
}

/// Emits one [`Record::AppOwner`] per owner of each upstream application.
pub fn list_app_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    apps: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, apps, "app owners", |record| match record {
        Record::App(app) => Some(app.application.id.clone()),
        _ => None,
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all app owners",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items = client.list_azure_ad_app_owners(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(owner) => {
                            count += 1;
                            let record = Record::AppOwner(AppOwner {
                                owner,
                                app_id: id.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, app_id = %id, "unable to continue processing owners for this application");
                        }
                    }
                }
                debug!(app_id = %id, count, "finished listing app owners");
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use aw_client::mock::MockAzureClient;
    use aw_client::ClientError;
    use aw_core::azure;
    use serde_json::json;

    use super::*;

    fn app(id: &str) -> azure::Application {
        azure::Application {
            id: id.to_string(),
            app_id: format!("client-{id}"),
            display_name: format!("app {id}"),
            ..Default::default()
        }
    }

    async fn drain(mut stream: RecordStream) -> Vec<Record> {
        let mut records = Vec::new();
        while let Some(record) = stream.recv().await {
            records.push(record);
        }
        records
    }

    #[tokio::test]
    async fn leaf_stops_cleanly_on_first_error() {
        let apps: Vec<_> = (0..10).map(|i| Ok(app(&format!("a{i}")))).collect();
        let mut fixtures = apps;
        fixtures.push(Err(ClientError::RequestFailed("boom".into())));
        fixtures.push(Ok(app("after-error")));

        let client: Arc<dyn AzureClient> = Arc::new(MockAzureClient::new().with_apps(fixtures));
        let cancel = CancellationToken::new();
        let records = drain(list_apps(&cancel, &client)).await;

        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| matches!(r, Record::App(_))));
    }

    #[tokio::test]
    async fn owners_are_emitted_per_item() {
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_apps(vec![Ok(app("a1"))])
                .with_app_owners("a1", vec![Ok(json!({"id": "u1"})), Ok(json!({"id": "u2"}))]),
        );
        let cancel = CancellationToken::new();
        let apps = list_apps(&cancel, &client);
        let records = drain(list_app_owners(&cancel, &client, apps)).await;

        assert_eq!(records.len(), 2);
        for record in &records {
            match record {
                Record::AppOwner(owner) => assert_eq!(owner.app_id, "a1"),
                other => panic!("unexpected record: {:?}", other.kind()),
            }
        }
    }

    #[tokio::test]
    async fn wrong_typed_upstream_closes_cleanly() {
        let client: Arc<dyn AzureClient> = Arc::new(MockAzureClient::new());
        let cancel = CancellationToken::new();
        let (tx, upstream) = pipeline::channel();
        tokio::spawn(async move {
            let _ = tx
                .send(Record::Tenant(aw_core::models::Tenant {
                    tenant: azure::Tenant::default(),
                }))
                .await;
        });
        let records = drain(list_app_owners(&cancel, &client, upstream)).await;
        assert!(records.is_empty());
    }
}
