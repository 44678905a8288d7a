use kronos_core::types::{ParticipantTier, Slot, VrfOutput};
use kronos_crypto::vrf_output_to_unit_interval;

/// Scale factor for the fixed-point lottery comparison. Both the VRF
/// output's unit-interval mapping and every participant's weight are
/// quantized to this many parts before the win/lose comparison is made in
/// pure integer arithmetic, so the verdict cannot diverge across hosts
/// with different floating-point rounding behavior.
pub const FIXED_POINT_SCALE: u128 = 1_000_000_000;

fn to_fixed(value: f64) -> u128 {
    (value.max(0.0) * FIXED_POINT_SCALE as f64).round() as u128
}

/// A participant's effective lottery weight for one slot: composite
/// reputation score, scaled by their participation tier's lottery weight
/// and any influx-safeguard multiplier in effect for them this window.
pub fn effective_weight(composite_score: f64, tier: ParticipantTier, safeguard_multiplier: f64) -> f64 {
    composite_score * tier.lottery_weight() * safeguard_multiplier
}

/// The VRF seed for a slot: the previous finality checkpoint hash
/// concatenated with the big-endian slot index.
pub fn slot_seed(previous_checkpoint_hash: &[u8; 32], slot: Slot) -> Vec<u8> {
    let mut seed = previous_checkpoint_hash.to_vec();
    seed.extend_from_slice(&slot.to_be_bytes());
    seed
}

/// Whether a participant with effective `weight` (out of `total_weight`
/// summed across every eligible participant) wins the slot lottery, given
/// their own VRF output for the slot seed. The participant wins if
/// `beta / 2^256 < weight / total_weight`, evaluated in fixed point.
///
/// Multiple participants may self-elect in the same slot; that is
/// resolved at block acceptance time by the DAG ordering rule, not here.
pub fn wins_lottery(vrf_output: &VrfOutput, weight: f64, total_weight: f64) -> bool {
    if weight <= 0.0 || total_weight <= 0.0 {
        return false;
    }

    let beta_fp = to_fixed(vrf_output_to_unit_interval(vrf_output));
    let weight_fp = to_fixed(weight);
    let total_fp = to_fixed(total_weight);

    // beta/SCALE < weight/total  <=>  beta * total < weight * SCALE
    beta_fp.saturating_mul(total_fp) < weight_fp.saturating_mul(FIXED_POINT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weight_never_wins() {
        let output = VrfOutput([0u8; 32]);
        assert!(!wins_lottery(&output, 0.0, 10.0));
    }

    #[test]
    fn zero_vrf_output_always_wins_with_nonzero_weight() {
        let output = VrfOutput([0u8; 32]);
        assert!(wins_lottery(&output, 1.0, 10.0));
    }

    #[test]
    fn max_vrf_output_never_wins() {
        let output = VrfOutput([0xffu8; 32]);
        assert!(!wins_lottery(&output, 1.0, 1.0));
    }

    #[test]
    fn larger_share_wins_more_often() {
        let mut small_wins = 0;
        let mut large_wins = 0;
        for b in 0u8..=255 {
            let mut bytes = [0u8; 32];
            bytes[0] = b;
            let output = VrfOutput(bytes);
            if wins_lottery(&output, 1.0, 100.0) {
                small_wins += 1;
            }
            if wins_lottery(&output, 50.0, 100.0) {
                large_wins += 1;
            }
        }
        assert!(large_wins > small_wins);
    }

    #[test]
    fn effective_weight_applies_tier_and_safeguard() {
        let w = effective_weight(0.5, ParticipantTier::Tier2, 0.1);
        assert!((w - (0.5 * 0.20 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn slot_seed_changes_with_slot_index() {
        let checkpoint = [1u8; 32];
        assert_ne!(slot_seed(&checkpoint, 0), slot_seed(&checkpoint, 1));
    }
}
