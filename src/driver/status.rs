//! Machine status

use tracing::info;

use super::{
    check_request, provider_id, GetMachineStatusRequest, GetMachineStatusResponse, IroncoreDriver,
};
use crate::error::{Error, Result};

impl IroncoreDriver {
    pub(super) async fn status(
        &self,
        req: &GetMachineStatusRequest,
    ) -> Result<GetMachineStatusResponse> {
        let (machine, _, secret) = check_request(
            req.machine.as_ref(),
            req.machine_class.as_ref(),
            req.secret.as_ref(),
        )?;
        info!(machine = %machine.name, "Machine status request has been received");

        let (store, namespace) = self.resolve(secret).await?;
        let found = store
            .get_machine(&namespace, &machine.name)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?
            .ok_or_else(|| {
                Error::NotFound(format!("machine {namespace}/{} not found", machine.name))
            })?;

        let name = found.metadata.name.unwrap_or_else(|| machine.name.clone());
        Ok(GetMachineStatusResponse {
            provider_id: provider_id(&namespace, &name),
            node_name: name,
        })
    }
}
