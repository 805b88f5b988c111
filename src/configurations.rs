//! A module that contains functions required to read, parse and return the cluster layout from a
//! configuration file, e.g. `Config.toml` at the root of this crate.

use std::collections::HashMap;
use std::net::SocketAddrV4;
use std::str::FromStr;

use config::{Config, File};

use crate::MAX_PROPOSERS;

/// The resolved cluster layout: one listening address per node, ordered so that a node's id is an
/// index into its role's list.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub proposers: Vec<SocketAddrV4>,
    pub acceptors: Vec<SocketAddrV4>,
    pub clients: Vec<SocketAddrV4>,
}

impl ClusterConfig {
    /// The number of acceptors whose answers suffice to decide anything: a majority.
    pub fn quorum(&self) -> usize {
        self.acceptors.len() / 2 + 1
    }
}

pub fn get_config(file_name: &str) -> ClusterConfig {
    let c = read_config(file_name);
    parse_config(&c)
}

fn read_config(file_name: &str) -> HashMap<String, Vec<String>> {
    let mut c = Config::default();
    c.merge(File::with_name(file_name)).unwrap();
    c.try_into::<HashMap<String, Vec<String>>>()
        .expect("Could not try_into")
}

fn parse_config(c: &HashMap<String, Vec<String>>) -> ClusterConfig {
    let config = ClusterConfig {
        proposers: parse_addresses(c, "proposers"),
        acceptors: parse_addresses(c, "acceptors"),
        clients: parse_addresses(c, "clients"),
    };

    assert!(
        !config.acceptors.is_empty(),
        "at least one acceptor is required"
    );
    assert!(
        config.proposers.len() as u64 <= MAX_PROPOSERS,
        "at most {} proposers are supported",
        MAX_PROPOSERS
    );

    config
}

fn parse_addresses(c: &HashMap<String, Vec<String>>, role: &str) -> Vec<SocketAddrV4> {
    c.get(role)
        .unwrap_or_else(|| panic!("role {:?} is missing from the configuration", role))
        .iter()
        .map(|address| {
            SocketAddrV4::from_str(address)
                .unwrap_or_else(|_| panic!("{:?} is not a valid ip:port address", address))
        })
        .collect()
}
