//! Virtual machine collectors.
//!
//! Role assignments are enumerated once per VM and batched into
//! [`VirtualMachineRoleAssignments`]; the batch stream is teed to the six
//! edge collectors, which filter it without further client calls.

use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::azure;
use aw_core::constants::{
    AVERE_CONTRIBUTOR_ROLE_ID, CONTRIBUTOR_ROLE_ID, OWNER_ROLE_ID, USER_ACCESS_ADMIN_ROLE_ID,
    VM_ADMIN_LOGIN_ROLE_ID, VM_CONTRIBUTOR_ROLE_ID,
};
use aw_core::models::{
    VirtualMachine, VirtualMachineAdminLogin, VirtualMachineAdminLogins,
    VirtualMachineAvereContributor, VirtualMachineAvereContributors, VirtualMachineContributor,
    VirtualMachineContributors, VirtualMachineOwner, VirtualMachineOwners,
    VirtualMachineRoleAssignments, VirtualMachineUserAccessAdmin, VirtualMachineUserAccessAdmins,
    VirtualMachineVMContributor, VirtualMachineVMContributors,
};
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::support::{fan_out, parent_keys, RecordStream};

/// Stream of per-VM role assignment batches.
pub type VmRoleAssignmentStream = mpsc::Receiver<VirtualMachineRoleAssignments>;

/// Emits one [`Record::VirtualMachine`] per VM of each upstream
/// subscription.
pub fn list_virtual_machines(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    subscriptions: RecordStream,
) -> RecordStream {
    let ids = parent_keys(cancel, subscriptions, "virtual machines", |record| {
        match record {
            Record::Subscription(s) => Some(s.subscription.subscription_id.clone()),
            _ => None,
        }
    });
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all virtual machines",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut items = client.list_azure_virtual_machines(emitter.cancellation(), &id);
                let mut count = 0u64;
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(virtual_machine) => {
                            count += 1;
                            let record = Record::VirtualMachine(VirtualMachine {
                                virtual_machine,
                                subscription_id: id.clone(),
                            });
                            if !emitter.emit(record).await {
                                return;
                            }
                        }
                        Err(err) => {
                            error!(error = %err, subscription_id = %id, "unable to continue processing virtual machines for this subscription");
                        }
                    }
                }
                debug!(subscription_id = %id, count, "finished listing virtual machines");
            }
        },
    )
}

/// Enumerates every role assignment scoped to each upstream VM and emits
/// one batch per VM for the edge collectors to filter.
pub fn list_virtual_machine_role_assignments(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    virtual_machines: RecordStream,
) -> VmRoleAssignmentStream {
    let ids = parent_keys(
        cancel,
        virtual_machines,
        "virtual machine role assignments",
        |record| match record {
            Record::VirtualMachine(vm) => Some(vm.virtual_machine.id.clone()),
            _ => None,
        },
    );
    let client = Arc::clone(client);
    fan_out(
        cancel,
        ids,
        "finished listing all virtual machine role assignments",
        move |id: String, emitter| {
            let client = Arc::clone(&client);
            async move {
                let mut batch = VirtualMachineRoleAssignments {
                    virtual_machine_id: id.clone(),
                    role_assignments: Vec::new(),
                };
                let mut items = client.list_role_assignments_for_resource(
                    emitter.cancellation(),
                    &id,
                    "",
                );
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(assignment) => batch.role_assignments.push(assignment),
                        Err(err) => {
                            error!(error = %err, virtual_machine_id = %id, "unable to continue processing role assignments for this virtual machine");
                        }
                    }
                }
                let count = batch.role_assignments.len();
                if !emitter.emit(batch).await {
                    return;
                }
                debug!(virtual_machine_id = %id, count, "finished listing virtual machine role assignments");
            }
        },
    )
}

/// Filters each VM batch by one role GUID and emits an aggregate record.
fn vm_role_edge<B>(
    cancel: &CancellationToken,
    upstream: VmRoleAssignmentStream,
    role_id: &'static str,
    done_message: &'static str,
    build: B,
) -> RecordStream
where
    B: Fn(&str, Vec<azure::RoleAssignment>) -> Record + Send + 'static,
{
    let (tx, rx) = pipeline::channel();
    let mut upstream = pipeline::or_done(cancel, upstream);
    let cancel = cancel.clone();
    tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(batch) = upstream.recv().await {
            let matched: Vec<_> = batch
                .role_assignments
                .iter()
                .filter(|assignment| assignment.matches_role(role_id))
                .cloned()
                .collect();
            count += 1;
            let record = build(&batch.virtual_machine_id, matched);
            if !send_guarded(&cancel, &tx, record).await {
                return;
            }
        }
        info!(count, "{}", done_message);
    });
    rx
}

/// Emits one aggregate [`Record::VirtualMachineOwners`] per VM.
pub fn list_virtual_machine_owners(
    cancel: &CancellationToken,
    role_assignments: VmRoleAssignmentStream,
) -> RecordStream {
    vm_role_edge(
        cancel,
        role_assignments,
        OWNER_ROLE_ID,
        "finished listing all virtual machine owners",
        |vm_id, matched| {
            Record::VirtualMachineOwners(VirtualMachineOwners {
                virtual_machine_id: vm_id.to_string(),
                owners: matched
                    .into_iter()
                    .map(|owner| VirtualMachineOwner {
                        owner,
                        virtual_machine_id: vm_id.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::VirtualMachineContributors`] per VM.
pub fn list_virtual_machine_contributors(
    cancel: &CancellationToken,
    role_assignments: VmRoleAssignmentStream,
) -> RecordStream {
    vm_role_edge(
        cancel,
        role_assignments,
        CONTRIBUTOR_ROLE_ID,
        "finished listing all virtual machine contributors",
        |vm_id, matched| {
            Record::VirtualMachineContributors(VirtualMachineContributors {
                virtual_machine_id: vm_id.to_string(),
                contributors: matched
                    .into_iter()
                    .map(|contributor| VirtualMachineContributor {
                        contributor,
                        virtual_machine_id: vm_id.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::VirtualMachineAvereContributors`] per VM.
pub fn list_virtual_machine_avere_contributors(
    cancel: &CancellationToken,
    role_assignments: VmRoleAssignmentStream,
) -> RecordStream {
    vm_role_edge(
        cancel,
        role_assignments,
        AVERE_CONTRIBUTOR_ROLE_ID,
        "finished listing all virtual machine avere contributors",
        |vm_id, matched| {
            Record::VirtualMachineAvereContributors(VirtualMachineAvereContributors {
                virtual_machine_id: vm_id.to_string(),
                avere_contributors: matched
                    .into_iter()
                    .map(|avere_contributor| VirtualMachineAvereContributor {
                        avere_contributor,
                        virtual_machine_id: vm_id.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::VirtualMachineAdminLogins`] per VM.
pub fn list_virtual_machine_admin_logins(
    cancel: &CancellationToken,
    role_assignments: VmRoleAssignmentStream,
) -> RecordStream {
    vm_role_edge(
        cancel,
        role_assignments,
        VM_ADMIN_LOGIN_ROLE_ID,
        "finished listing all virtual machine admin logins",
        |vm_id, matched| {
            Record::VirtualMachineAdminLogins(VirtualMachineAdminLogins {
                virtual_machine_id: vm_id.to_string(),
                admin_logins: matched
                    .into_iter()
                    .map(|admin_login| VirtualMachineAdminLogin {
                        admin_login,
                        virtual_machine_id: vm_id.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::VirtualMachineUserAccessAdmins`] per VM.
pub fn list_virtual_machine_user_access_admins(
    cancel: &CancellationToken,
    role_assignments: VmRoleAssignmentStream,
) -> RecordStream {
    vm_role_edge(
        cancel,
        role_assignments,
        USER_ACCESS_ADMIN_ROLE_ID,
        "finished listing all virtual machine user access admins",
        |vm_id, matched| {
            Record::VirtualMachineUserAccessAdmins(VirtualMachineUserAccessAdmins {
                virtual_machine_id: vm_id.to_string(),
                user_access_admins: matched
                    .into_iter()
                    .map(|user_access_admin| VirtualMachineUserAccessAdmin {
                        user_access_admin,
                        virtual_machine_id: vm_id.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

/// Emits one aggregate [`Record::VirtualMachineVMContributors`] per VM.
pub fn list_virtual_machine_vm_contributors(
    cancel: &CancellationToken,
    role_assignments: VmRoleAssignmentStream,
) -> RecordStream {
    vm_role_edge(
        cancel,
        role_assignments,
        VM_CONTRIBUTOR_ROLE_ID,
        "finished listing all virtual machine vm contributors",
        |vm_id, matched| {
            Record::VirtualMachineVMContributors(VirtualMachineVMContributors {
                virtual_machine_id: vm_id.to_string(),
                vm_contributors: matched
                    .into_iter()
                    .map(|vm_contributor| VirtualMachineVMContributor {
                        vm_contributor,
                        virtual_machine_id: vm_id.to_string(),
                    })
                    .collect(),
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use aw_client::mock::MockAzureClient;

    use super::*;
    use crate::collectors::list_subscriptions;

    fn subscription(guid: &str) -> azure::Subscription {
        azure::Subscription {
            id: format!("/subscriptions/{guid}"),
            subscription_id: guid.to_string(),
            ..Default::default()
        }
    }

    fn vm(id: &str) -> azure::VirtualMachine {
        azure::VirtualMachine {
            id: id.to_string(),
            name: "vm".into(),
            ..Default::default()
        }
    }

    fn assignment(role_id: &str) -> azure::RoleAssignment {
        azure::RoleAssignment {
            properties: azure::RoleAssignmentProperties {
                role_definition_id: format!(
                    "/providers/Microsoft.Authorization/roleDefinitions/{role_id}"
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn vm_edges_filter_one_shared_enumeration() {
        let vm_id = "/subscriptions/s1/providers/Microsoft.Compute/virtualMachines/web01";
        let client: Arc<dyn AzureClient> = Arc::new(
            MockAzureClient::new()
                .with_subscriptions(vec![Ok(subscription("s1"))])
                .with_virtual_machines("s1", vec![Ok(vm(vm_id))])
                .with_resource_role_assignments(
                    vm_id,
                    vec![
                        Ok(assignment(OWNER_ROLE_ID)),
                        Ok(assignment(VM_ADMIN_LOGIN_ROLE_ID)),
                        Ok(assignment(VM_ADMIN_LOGIN_ROLE_ID)),
                    ],
                ),
        );
        let cancel = CancellationToken::new();
        let vms = list_virtual_machines(&cancel, &client, list_subscriptions(&cancel, &client));
        let batches = list_virtual_machine_role_assignments(&cancel, &client, vms);
        let [for_owners, for_logins] = pipeline::tee(&cancel, batches);

        let mut owners = list_virtual_machine_owners(&cancel, for_owners);
        match owners.recv().await.unwrap() {
            Record::VirtualMachineOwners(o) => {
                assert_eq!(o.virtual_machine_id, vm_id);
                assert_eq!(o.owners.len(), 1);
            }
            other => panic!("unexpected record: {:?}", other.kind()),
        }
        assert!(owners.recv().await.is_none());

        let mut logins = list_virtual_machine_admin_logins(&cancel, for_logins);
        match logins.recv().await.unwrap() {
            Record::VirtualMachineAdminLogins(l) => {
                assert_eq!(l.admin_logins.len(), 2);
            }
            other => panic!("unexpected record: {:?}", other.kind()),
        }
        assert!(logins.recv().await.is_none());
    }
}
