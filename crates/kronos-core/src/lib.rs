pub mod block;
pub mod checkpoint;
pub mod constants;
pub mod error;
pub mod heartbeat;
pub mod transaction;
pub mod types;

pub use block::*;
pub use checkpoint::*;
pub use constants::*;
pub use error::KronosError;
pub use heartbeat::*;
pub use transaction::*;
pub use types::*;
