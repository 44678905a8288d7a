use serde::{Deserialize, Serialize};

/// Network-identifying parameters for a genesis ceremony. The VRF/VDF
/// seeds are the root seeds every participant derives per-window seeds
/// from via `kronos_consensus::lottery::slot_seed`; they are public and
/// fixed at network launch, not secret.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    pub network_name: String,
    pub vrf_seed: Vec<u8>,
    pub vdf_seed: Vec<u8>,
}

impl GenesisParams {
    /// Parameters for the default production network.
    pub fn default_network() -> Self {
        Self {
            network_name: "kronos-mainnet".to_string(),
            vrf_seed: b"kronos-genesis-vrf-seed".to_vec(),
            vdf_seed: b"kronos-genesis-vdf-seed".to_vec(),
        }
    }
}
