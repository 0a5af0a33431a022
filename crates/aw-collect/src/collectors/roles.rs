//! Directory role collectors.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::models::{Role, RoleAssignment};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{fan_out, parent_keys, RecordStream};

/// Emits one [`Record::Role`] per directory role definition.
pub fn list_roles(cancel: &CancellationToken, client: &Arc<dyn AzureClient>) -> RecordStream {
    let (tx, rx) = pipeline::channel();
    let cancel = cancel.clone();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let tenant = client.tenant_info();
        let mut items = client.list_azure_ad_roles(cancel.clone(), &tenant.tenant_id);
        let mut count = 0u64;
        while let Some(item) = items.recv().await {
            match item {
                Ok(role) => {
                    debug!(role = %role.display_name, "found role");
                    count += 1;
                    let record = Record::Role(Role {
                        role,
                        tenant_id: tenant.tenant_id.clone(),
                        tenant_name: tenant.display_name.clone(),
                    });
                    if !send_guarded(&cancel, &tx, record).await {
                        return;
                    }
                }
                Err(err) => {
                    error!(error = %err, "unable to continue processing roles");
                    return;
                }
            }
        }
        info!(count, "finished listing all roles");
    });
    rx
}

/// Emits one [`Record::RoleAssignment`] per assignment of each upstream role.
pub fn list_role_assignments(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    roles: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, roles, "role assignments", |record| match record {
        Record::Role(role) => Some(role.role.id.clone()),
        _ => None,
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all role assignments",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let tenant = client.tenant_info();
                let mut items =
                    client.list_azure_ad_role_assignments(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(assignment) => {
                            count += 1;
                            let record = Record::RoleAssignment(RoleAssignment {
                                assignment,
                                tenant_id: tenant.tenant_id.clone(),
                                tenant_name: tenant.display_name.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, role_id = %id, "unable to continue processing assignments for this role");
                        }
                    }
                }
                debug!(role_id = %id, count, "finished listing role assignments");
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use aw_client::mock::MockAzureClient;
    use aw_core::azure;

    use super::*;

    #[tokio::test]
    async fn assignments_follow_their_role() {
        let role = azure::Role {
            id: "r1".into(),
            display_name: "Global Administrator".into(),
            ..Default::default()
        };
        let assignment = azure::UnifiedRoleAssignment {
            id: "ra1".into(),
            role_definition_id: "r1".into(),
            principal_id: "u1".into(),
            ..Default::default()
        };
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_roles(vec![Ok(role)])
                .with_role_assignments("r1", vec![Ok(assignment)]),
        );
        let cancel = CancellationToken::new();
        let mut stream = list_role_assignments(&cancel, &client, list_roles(&cancel, &client));

        let record = stream.recv().await.unwrap();
        match record {
            Record::RoleAssignment(ra) => assert_eq!(ra.assignment.principal_id, "u1"),
            other => panic!("unexpected record: {:?}", other.kind()),
        }
        assert!(stream.recv().await.is_none());
    }
}
