pub mod client;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod types;

pub use client::{DiscordClient, classify_failure};
pub use errors::{DiscordError, GatewayError};
pub use events::{GatewayEvent, parse_dispatch};
pub use gateway::GatewayClient;
