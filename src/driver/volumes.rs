//! Volume IDs of persistent volumes provisioned by the IronCore CSI driver

use tracing::{debug, info};

use super::{GetVolumeIdsRequest, GetVolumeIdsResponse, IroncoreDriver};

impl IroncoreDriver {
    pub(super) fn volume_ids(&self, req: &GetVolumeIdsRequest) -> GetVolumeIdsResponse {
        let volume_ids: Vec<String> = req
            .pv_specs
            .iter()
            .filter_map(|pv| pv.csi.as_ref())
            .filter(|csi| csi.driver == self.config.csi_driver && !csi.volume_handle.is_empty())
            .map(|csi| csi.volume_handle.clone())
            .collect();

        info!(
            found = volume_ids.len(),
            total = req.pv_specs.len(),
            "Get volume IDs request has been processed"
        );
        debug!(?volume_ids, "Volume IDs");
        GetVolumeIdsResponse { volume_ids }
    }
}
