use kronos_core::constants::{HALVING_INTERVAL_BLOCKS, INITIAL_BLOCK_REWARD, TOTAL_SUPPLY_BASE_UNITS};
use kronos_core::error::KronosError;
use kronos_core::types::Amount;

/// The block reward at `height`, halving every `HALVING_INTERVAL_BLOCKS`
/// accepted blocks until it reaches zero. There is no pre-allocation: the
/// entire supply enters circulation through this schedule.
pub fn block_reward(height: u64) -> Amount {
    let halvings = height / HALVING_INTERVAL_BLOCKS;
    if halvings >= u128::BITS as u64 {
        return 0;
    }
    INITIAL_BLOCK_REWARD >> halvings
}

/// Total issuance the schedule allows up to and including block `height`
/// (exclusive of genesis, which mints nothing), capped at the supply
/// ceiling.
pub fn cumulative_schedule(height: u64) -> Amount {
    let mut total: Amount = 0;
    let mut remaining = height;
    let mut epoch_start = 0u64;

    while remaining > 0 {
        let reward = block_reward(epoch_start);
        if reward == 0 {
            break;
        }
        let blocks_in_epoch = remaining.min(HALVING_INTERVAL_BLOCKS);
        total = total.saturating_add(reward.saturating_mul(blocks_in_epoch as u128));
        if total >= TOTAL_SUPPLY_BASE_UNITS {
            return TOTAL_SUPPLY_BASE_UNITS;
        }
        remaining -= blocks_in_epoch;
        epoch_start += HALVING_INTERVAL_BLOCKS;
    }

    total.min(TOTAL_SUPPLY_BASE_UNITS)
}

/// Verify that `cumulative_issued` (the sum of every coinbase output ever
/// accepted) does not exceed what the schedule permits at `height`, nor
/// the total supply cap. Run by the consensus worker after each
/// checkpoint; generalizes the teacher's genesis-time supply check into a
/// running invariant.
pub fn verify_issuance_invariant(cumulative_issued: Amount, height: u64) -> Result<(), KronosError> {
    let ceiling = cumulative_schedule(height);
    if cumulative_issued > ceiling || cumulative_issued > TOTAL_SUPPLY_BASE_UNITS {
        return Err(KronosError::SupplyCapExceeded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_halves_at_interval_boundary() {
        assert_eq!(block_reward(0), INITIAL_BLOCK_REWARD);
        assert_eq!(block_reward(HALVING_INTERVAL_BLOCKS - 1), INITIAL_BLOCK_REWARD);
        assert_eq!(block_reward(HALVING_INTERVAL_BLOCKS), INITIAL_BLOCK_REWARD / 2);
        assert_eq!(block_reward(HALVING_INTERVAL_BLOCKS * 2), INITIAL_BLOCK_REWARD / 4);
    }

    #[test]
    fn cumulative_schedule_matches_flat_reward_below_first_halving() {
        assert_eq!(cumulative_schedule(100), INITIAL_BLOCK_REWARD * 100);
    }

    #[test]
    fn cumulative_schedule_never_exceeds_cap() {
        assert!(cumulative_schedule(HALVING_INTERVAL_BLOCKS * 100) <= TOTAL_SUPPLY_BASE_UNITS);
    }

    #[test]
    fn invariant_rejects_over_issuance() {
        let ceiling = cumulative_schedule(10);
        assert!(verify_issuance_invariant(ceiling, 10).is_ok());
        assert!(verify_issuance_invariant(ceiling + 1, 10).is_err());
    }
}
