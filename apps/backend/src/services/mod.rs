pub mod finalize;
pub mod match_coordinator;
