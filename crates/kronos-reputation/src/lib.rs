pub mod error;
pub mod geography;
pub mod registry;
pub mod score;

pub use error::ReputationError;
pub use geography::RegionRegistry;
pub use registry::RegistrationLog;
pub use score::{try_bond, EventKind, Location, ReputationEvent, ReputationRecord};
