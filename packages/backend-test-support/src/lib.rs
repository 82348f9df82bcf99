//! Backend test support utilities
//!
//! This crate provides utilities specifically for backend integration tests:
//! unified logging initialization, problem-details assertions, and
//! generators for unique game ids and player addresses.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
