//! Debounced update scheduling: leading-edge execution, one coalesced
//! trailing execution per cooldown window.

pub mod engine;
pub mod state;
pub mod types;

pub use engine::DebounceScheduler;
pub use types::{Decision, Phase, SchedulerConfig, UpdateJob};
