//! The binary used to start one client, which infinitely reads values from the standard input or,
//! if more than two command-line arguments are passed, submits the 3rd, 4th, etc., arguments as
//! the values.
//!
//! You can run this binary as follows
//!     RUST_LOG=paxos_proposer=info cargo run --bin client -- <client_id> Config
//! if you want to run this client interactively (i.e. provide one value at a time), or
//!     RUST_LOG=paxos_proposer=info cargo run --bin client -- <client_id> Config v1 v2 ...
//! where v1, v2, etc., are the values to submit.

extern crate env_logger;
#[macro_use]
extern crate log;
extern crate paxos_proposer;
extern crate rand;
#[macro_use]
extern crate text_io;

use std::env;
use std::io;
use std::io::prelude::*;

use rand::Rng;

use paxos_proposer::configurations::get_config;
use paxos_proposer::engine::Client;
use paxos_proposer::message::Value;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    info!("{:?}", args);

    match args.len() {
        len if len >= 3 => {
            let id = &args[1];
            let id: usize = match id.parse() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: second argument not an usize");
                    return;
                }
            };

            let config_file_name = &args[2];
            let config = get_config(config_file_name);

            if id >= config.clients.len() {
                eprintln!("Error: no address configured for client {}", id);
                return;
            }

            // Any proposer will do; pick one at random so that clients spread their load.
            let proposer_address =
                config.proposers[rand::thread_rng().gen_range(0, config.proposers.len())];

            let client = Client::new(id, config.clients[id], proposer_address);
            info!("Client {:?} ({:?}) starting...", id, client.uuid());

            if len == 3 {
                loop {
                    print!("Enter the value: ");
                    io::stdout().flush().ok().expect("Could not flush stdout"); // print! is not very clever.
                    let value: String = read!();
                    client.submit(Value::from(value.into_bytes()));
                }
            } else {
                for value in args.iter().skip(3) {
                    client.submit(Value::from(value.as_bytes()));
                }
            }
        }
        _ => {
            panic!("Expected at least 2 arguments (excluding file name)");
        }
    }
}
