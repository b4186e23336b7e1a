pub mod executor;
pub mod rename;
pub mod shutdown;
pub mod target;

#[cfg(test)]
pub(crate) mod mock;

pub use executor::{TargetOutcome, UpdateExecutor, UpdateReport};
pub use rename::{ChannelRenamer, RenameError, RenameErrorKind};
pub use shutdown::shutdown_flush;
pub use target::{ChannelInfo, CounterTarget, TargetKey, TargetTable, render_label};
