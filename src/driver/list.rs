//! Machine listing

use tracing::info;

use super::{
    check_provider, provider_id, IroncoreDriver, ListMachinesRequest, ListMachinesResponse,
};
use crate::error::{Error, Result};

impl IroncoreDriver {
    pub(super) async fn list(&self, req: &ListMachinesRequest) -> Result<ListMachinesResponse> {
        let class = req
            .machine_class
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("received empty request".to_string()))?;
        check_provider(class)?;
        info!(machine_class = %class.name, "Machine list request has been received");

        let invalid = |e: Error| {
            Error::InvalidArgument(format!(
                "provider spec for requested provider '{}' is invalid: {e}",
                class.provider
            ))
        };
        let spec = self.provider_spec(class, req.secret.as_ref()).map_err(invalid)?;
        // A valid spec implies a secret.
        let secret = req
            .secret
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("received empty request".to_string()))?;

        let (store, namespace) = self.resolve(secret).await?;
        let machines = store
            .list_machines(&namespace, &spec.labels)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        let machine_list = machines
            .iter()
            .filter_map(|m| m.metadata.name.as_deref())
            .map(|name| (provider_id(&namespace, name), name.to_string()))
            .collect();

        info!(machine_class = %class.name, "Machine list request has been processed");
        Ok(ListMachinesResponse { machine_list })
    }
}
