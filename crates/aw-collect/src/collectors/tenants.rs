//! Tenant collector.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::models::Tenant;
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::RecordStream;

/// Emits one [`Record::Tenant`] per tenant visible to the principal.
pub fn list_tenants(cancel: &CancellationToken, client: &Arc<dyn AzureClient>) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let mut items = client.list_azure_ad_tenants(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(tenant) => {
                    debug!(tenant = %tenant.display_name, "found tenant");
                    count += 1;
                    let record = Record::Tenant(Tenant { tenant });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing tenants");
                    return;
                }
            }
        }
        info!(count, "finished listing all tenants");
    });
    rx
}
