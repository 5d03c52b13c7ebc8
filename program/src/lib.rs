// Verifiably random raffle with keeper-driven draws and a mock VRF coordinator

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

pub use processor::process_instruction;
pub use solana_program;
