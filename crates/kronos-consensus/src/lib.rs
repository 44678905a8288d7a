pub mod finality;
pub mod issuance;
pub mod lottery;
pub mod production;
pub mod state_machine;

pub use finality::{choose_fork, emit_checkpoint, finality_tier, reorg_allowed, FinalityTier};
pub use issuance::{block_reward, cumulative_schedule, verify_issuance_invariant};
pub use lottery::{effective_weight, slot_seed, wins_lottery, FIXED_POINT_SCALE};
pub use production::{collect_transactions, produce_block, select_parents};
pub use state_machine::{ParticipantState, ParticipantStateMachine};
