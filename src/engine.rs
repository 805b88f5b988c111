//! The module that contains the network-facing shells of the replication engine: the proposer
//! event loop, which demultiplexes incoming messages into the core's entry points, and the client
//! handle used to submit values.

use std::net::SocketAddrV4;

use log::Level;
use uuid::Uuid;

use crate::configurations::ClusterConfig;
use crate::message::{AcceptAck, Message, PrepareAck, Submit, Value};
use crate::net_node::NetNode;
use crate::proposer::Proposer;
use crate::{PAXOS_MAX_VALUE_SIZE, PROPOSER_PREEXEC_WIN_SIZE};

/// Implement this trait if you are a process which needs to run in a infinite loop, while
/// receiving and sending messages.
pub trait Runnable {
    fn run(&mut self);
}

/// The struct representing a client of the replication engine.
pub struct Client {
    // Every process has an associated universal unique identifier number.
    uuid: Uuid,

    id: usize,

    node: NetNode,

    proposer_address: SocketAddrV4,
}

impl Client {
    pub fn new(id: usize, client_address: SocketAddrV4, proposer_address: SocketAddrV4) -> Self {
        Client {
            uuid: Uuid::new_v4(),
            id,
            node: NetNode::new(&client_address),
            proposer_address,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Submits one value for ordering. Oversized values are refused here, before they reach the
    /// wire.
    pub fn submit(&self, value: Value) {
        if value.len() > PAXOS_MAX_VALUE_SIZE {
            warn!(
                "[C={:?}] Refusing a value of {:?} bytes, the limit is {:?}.",
                self.id,
                value.len(),
                PAXOS_MAX_VALUE_SIZE
            );
            return;
        }

        let m = Message::Submit(Submit { value });

        self.node.send(&m, &self.proposer_address);

        if log_enabled!(Level::Info) {
            info!(
                "[C={:?}] {:?} sent to {:?}.",
                self.id, m, self.proposer_address
            );
        }
    }
}

/// The struct representing a proposer of the replication engine: the core state machine together
/// with its socket and the addresses of all acceptors.
pub struct ProposerNode {
    uuid: Uuid,

    id: usize,

    core: Proposer,

    node: NetNode,

    acceptors: Vec<SocketAddrV4>,
}

impl ProposerNode {
    pub fn new(id: usize, config: &ClusterConfig) -> Self {
        let listen_address = config.proposers[id];

        ProposerNode {
            uuid: Uuid::new_v4(),
            id,
            core: Proposer::new(id, config.acceptors.len()),
            node: NetNode::new(&listen_address),
            acceptors: config.acceptors.clone(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    // Pipeline maintenance

    /// Opens one more Phase 1 slot and broadcasts the prepare to all acceptors.
    fn do_prepare(&mut self) {
        let req = self.core.prepare();
        self.node
            .broadcast(&Message::PrepareReq(req), &self.acceptors);
    }

    /// Opens `count` Phase 1 slots ahead of client load, so that Phase 2 can fire as soon as
    /// values arrive.
    fn preexecute(&mut self, count: usize) {
        for _ in 0..count {
            self.do_prepare();
        }

        if log_enabled!(Level::Info) {
            info!("[P={:?}] Opened {:?} new instances.", self.id, count);
        }
    }

    /// Starts Phase 2 for every slot that is ready and has a value to carry, topping the window
    /// back up with one fresh Phase 1 per started Phase 2.
    fn try_accept(&mut self) {
        while let Some(req) = self.core.accept() {
            self.node
                .broadcast(&Message::AcceptReq(req), &self.acceptors);
            self.do_prepare();
        }
    }

    // Handlers

    /// Handles a value submitted by a client.
    fn handle_submit(&mut self, submit: Submit) {
        if submit.value.len() > PAXOS_MAX_VALUE_SIZE {
            warn!(
                "[P={:?}] Refusing a value of {:?} bytes, the limit is {:?}.",
                self.id,
                submit.value.len(),
                PAXOS_MAX_VALUE_SIZE
            );
            return;
        }

        if log_enabled!(Level::Info) {
            info!(
                "[P={:?}] I will handle a submit of {:?} bytes.",
                self.id,
                submit.value.len()
            );
        }

        self.core.propose(submit.value);
        self.try_accept();
    }

    /// Handles the promise sent by an acceptor to this proposer.
    fn handle_prepare_ack(&mut self, ack: PrepareAck) {
        if log_enabled!(Level::Info) {
            info!("[P={:?}] I will handle {:?}.", self.id, ack);
        }

        self.core.receive_prepare_ack(&ack);
        self.try_accept();
    }

    /// Handles the accepted-notification sent by an acceptor to this proposer.
    fn handle_accept_ack(&mut self, ack: AcceptAck) {
        if log_enabled!(Level::Info) {
            info!("[P={:?}] I will handle {:?}.", self.id, ack);
        }

        self.core.receive_accept_ack(&ack);
    }
}

impl Runnable for ProposerNode {
    fn run(&mut self) {
        self.preexecute(PROPOSER_PREEXEC_WIN_SIZE);

        loop {
            if log_enabled!(Level::Info) {
                info!("[P={:?}] Proposer waiting...", self.id);
            }

            let m = self.node.receive();

            match m {
                Message::Submit(submit) => self.handle_submit(submit),
                Message::PrepareAck(ack) => self.handle_prepare_ack(ack),
                Message::AcceptAck(ack) => self.handle_accept_ack(ack),
                _ => info!(
                    "[P={:?}] Unexpected message received. I'll ignore it.",
                    self.id
                ),
            }
        }
    }
}
