pub mod db;
pub mod engine;

pub use db::StateDb;
pub use engine::{AcceptOutcome, StateEngine};
