// Mock VRF coordinator for local clusters and program tests. Consumers request
// words through a CPI and receive them in a callback signed by the state PDA.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

/// Upper bound on words per request
pub const MAX_NUM_WORDS: u32 = 500;

/// Upper bound on consumers per subscription
pub const MAX_CONSUMERS: usize = 100;
