//! Machine deletion
//!
//! The driver only returns once the machine is gone, otherwise the kubelet
//! could re-register a node the machine controller already removed.

use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use super::{
    check_request, ignition_secret_name, DeleteMachineRequest, DeleteMachineResponse,
    IroncoreDriver,
};
use crate::domain::ports::MachineStore;
use crate::error::{Error, Result};

impl IroncoreDriver {
    pub(super) async fn delete(&self, req: &DeleteMachineRequest) -> Result<DeleteMachineResponse> {
        let (machine, _, secret) = check_request(
            req.machine.as_ref(),
            req.machine_class.as_ref(),
            req.secret.as_ref(),
        )?;
        info!(machine = %machine.name, "Machine deletion request has been received");

        let (store, namespace) = self.resolve(secret).await?;

        store
            .delete_secret(&namespace, &ignition_secret_name(&machine.name))
            .await
            .map_err(|e| Error::Unknown(format!("error deleting ignition secret: {e}")))?;

        match store.delete_machine(&namespace, &machine.name).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(Error::NotFound(format!(
                    "machine {namespace}/{} not found",
                    machine.name
                )))
            }
            Err(e) => return Err(Error::Unknown(format!("error deleting machine: {e}"))),
        }

        self.wait_until_deleted(store.as_ref(), &namespace, &machine.name)
            .await?;

        info!(machine = %machine.name, "Machine deletion request has been processed");
        Ok(DeleteMachineResponse {})
    }

    async fn wait_until_deleted(
        &self,
        store: &dyn MachineStore,
        namespace: &str,
        name: &str,
    ) -> Result<()> {
        let result = timeout(self.config.delete_timeout, async {
            loop {
                match store.get_machine(namespace, name).await {
                    Ok(None) => return Ok(()),
                    Ok(Some(_)) => debug!(machine = %name, "Waiting for machine to be deleted"),
                    Err(e) => return Err(Error::Unknown(e.to_string())),
                }
                sleep(self.config.delete_poll_interval).await;
            }
        })
        .await;

        match result {
            Ok(done) => done,
            Err(_) => Err(Error::DeadlineExceeded(format!(
                "machine {namespace}/{name} still exists after {:?}",
                self.config.delete_timeout
            ))),
        }
    }
}
