//! Azure AD user collector.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::models::User;
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::RecordStream;

/// Emits one [`Record::User`] per user in the tenant.
pub fn list_users(cancel: &CancellationToken, client: &Arc<dyn AzureClient>) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let tenant = client.tenant_info();
        let mut items = client.list_azure_ad_users(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(user) => {
                    debug!(user = %user.user_principal_name, "found user");
                    count += 1;
                    let record = Record::User(User {
                        user,
                        tenant_id: tenant.tenant_id.clone(),
                        tenant_name: tenant.display_name.clone(),
                    });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing users");
                    return;
                }
            }
        }
        info!(count, "finished listing all users");
    });
    rx
}
