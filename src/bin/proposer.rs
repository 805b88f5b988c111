//! The binary used to start one proposer, which will infinitely listen to incoming messages
//! (either from clients or acceptors).
//!
//! You can run this binary as follows
//!     RUST_LOG=paxos_proposer=info cargo run --bin proposer -- <proposer_id> Config
//! where <proposer_id> is a number in [0, MAX_PROPOSERS) which should be unique among the
//! proposers and indexes the proposer address list of the configuration file.

extern crate env_logger;
#[macro_use]
extern crate log;
extern crate paxos_proposer;

use std::env;

use paxos_proposer::configurations::get_config;
use paxos_proposer::engine::{ProposerNode, Runnable};
use paxos_proposer::MAX_PROPOSERS;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    info!("{:?}", args);

    match args.len() {
        3 => {
            let id = &args[1];
            let id: usize = match id.parse() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: second argument not an usize");
                    return;
                }
            };

            if id as u64 >= MAX_PROPOSERS {
                eprintln!("Error: proposer id must be below {}", MAX_PROPOSERS);
                return;
            }

            let config_file_name = &args[2];
            let config = get_config(config_file_name);

            if id >= config.proposers.len() {
                eprintln!("Error: no address configured for proposer {}", id);
                return;
            }

            let mut proposer = ProposerNode::new(id, &config);
            info!("Proposer {:?} ({:?}) starting...", id, proposer.uuid());
            proposer.run();
        }
        _ => {
            panic!("Expected 2 arguments (excluding file name)");
        }
    }
}
