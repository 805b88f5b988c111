extern crate bincode;
extern crate config;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate rand;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate uuid;

mod net_node;
pub mod configurations;
pub mod engine;
pub mod learner;
pub mod message;
pub mod proposer;

/// The number of proposer ids the ballot arithmetic reserves room for. Proposer ids must lie in
/// `[0, MAX_PROPOSERS)`.
pub const MAX_PROPOSERS: u64 = 10;

/// Capacity of the proposer's instance ring. Must stay above the pre-execution window, with slack
/// for slots that retire out of order.
pub const PROPOSER_ARRAY_SIZE: usize = 2048;

/// Capacity of the learner's tally ring.
pub const LEARNER_ARRAY_SIZE: usize = 2048;

/// How many instances are kept in Phase 1 ahead of client load.
pub const PROPOSER_PREEXEC_WIN_SIZE: usize = 128;

/// The largest value, in bytes, a client may submit.
pub const PAXOS_MAX_VALUE_SIZE: usize = 8192;
