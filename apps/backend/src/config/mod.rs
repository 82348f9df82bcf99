pub mod app;
pub mod timers;

pub use app::Config;
