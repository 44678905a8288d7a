pub mod clock;
pub mod error;
pub mod vdf;

pub use clock::{
    boundary_of, check_tolerance, current_timestamp, current_window, seconds_to_next_boundary,
    window_of,
};
pub use error::TemporalError;
pub use vdf::{prove, verify, VdfProof};
