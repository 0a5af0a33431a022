//! Azure AD device collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::models::{Device, DeviceOwner};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{fan_out, parent_keys, RecordStream};

/// Emits one [`Record::Device`] per device in the tenant.
pub fn list_devices(cancel: &CancellationToken, client: &Arc<dyn AzureClient>) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let tenant = client.tenant_info();
        let mut items = client.list_azure_devices(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(device) => {
                    debug!(device = %device.display_name, "found device");
                    count += 1;
                    let record = Record::Device(Device {
                        device,
                        tenant_id: tenant.tenant_id.clone(),
                        tenant_name: tenant.display_name.clone(),
                    });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing devices");
                    return;
                }
            }
        }
        info!(count, "finished listing all devices");
    });
    rx
}

/// Emits one [`Record::DeviceOwner`] per registered owner of each device.
pub fn list_device_owners(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    devices: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, devices, "device owners", |record| match record {
        Record::Device(device) => Some(device.device.id.clone()),
        _ => None,
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all device owners",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items =
                    client.list_azure_device_registered_owners(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(owner) => {
                            count += 1;
                            let record = Record::DeviceOwner(DeviceOwner {
                                owner,
                                device_id: id.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, device_id = %id, "unable to continue processing owners for this device");
                        }
                    }
                }
                debug!(device_id = %id, count, "finished listing device owners");
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
    async fn device_owner_error_skips_only_that_parent() {
        let device = |id: &str| azure::Device {
            id: id.to_string(),
            display_name: format!("host-{id}"),
            ..Default::default()
        };
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_devices(vec![Ok(device("d1")), Ok(device("d2"))])
                .with_device_owners(
                    "d1",
                    vec![Err(aw_client::ClientError::RequestFailed("boom".into()))],
                )
                .with_device_owners("d2", vec![Ok(json!({"id": "u9"}))]),
        );
        let cancel = CancellationToken::new();
        let devices = list_devices(&cancel, &client);
        let mut stream = list_device_owners(&cancel, &client, devices);

        let mut owners = Vec::new();
        while let Some(record) = stream.recv().await {
            match record {
                Record::DeviceOwner(owner) => owners.push(owner),
                other => panic!("unexpected record: {:?}", other.kind()),
            }
        }
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].device_id, "d2");
    }
}
