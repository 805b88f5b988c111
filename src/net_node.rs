//! A module which contains the definition of a struct which can be used to send or receive the
//! engine's messages using UDP sockets.

use std::net::{SocketAddrV4, UdpSocket};

use bincode::{deserialize, serialize};

use crate::message::Message;
use crate::PAXOS_MAX_VALUE_SIZE;

/// One node's network endpoint: an anonymous socket used for sending and a socket bound to the
/// node's configured address used for receiving.
pub struct NetNode {
    udp_socket_sender: UdpSocket,

    udp_socket_receiver: UdpSocket,
}

impl NetNode {
    pub fn new(listen_address: &SocketAddrV4) -> Self {
        // The sending socket does not have to bind to a specific port, but just to one available,
        // hence we use 0 as the port.
        let udp_socket_sender = UdpSocket::bind("0.0.0.0:0").expect("Could not bind to address");

        let udp_socket_receiver =
            UdpSocket::bind(listen_address).expect("Could not bind to the listen address");

        NetNode {
            udp_socket_sender,
            udp_socket_receiver,
        }
    }

    /// Sends the message m to the node listening on destination_address. A failed send is logged
    /// and the peer is skipped; the engine keeps running as long as a quorum of acceptors is
    /// reachable.
    pub fn send(&self, m: &Message, destination_address: &SocketAddrV4) {
        let encoded: Vec<u8> = serialize(m).expect("Could not serialize the message m");

        if let Err(e) = self
            .udp_socket_sender
            .send_to(&encoded[..], destination_address)
        {
            warn!("Could not send to {:?}: {:?}.", destination_address, e);
        }
    }

    /// Sends the message m to every address in destinations.
    pub fn broadcast(&self, m: &Message, destinations: &[SocketAddrV4]) {
        for destination_address in destinations {
            self.send(m, destination_address);
        }
    }

    /// Blocks until a well-formed message arrives on the receiving socket. Datagrams that fail to
    /// decode are logged and skipped.
    pub fn receive(&self) -> Message {
        // Large enough for the biggest legal value plus the fields around it.
        let mut data_received = vec![0; PAXOS_MAX_VALUE_SIZE + 8192];

        loop {
            let (number_of_bytes, _src_addr) = self
                .udp_socket_receiver
                .recv_from(&mut data_received)
                .expect("Could not receive data");

            match deserialize(&data_received[..number_of_bytes]) {
                Ok(m) => return m,
                Err(e) => warn!(
                    "Dropping an undecodable datagram of {:?} bytes: {:?}.",
                    number_of_bytes, e
                ),
            }
        }
    }
}
