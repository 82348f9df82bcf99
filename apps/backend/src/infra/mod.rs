//! Infrastructure: time source and application state assembly.

pub mod clock;
pub mod state;
