//! A minimal learner, limited to what the proposer needs to retire slots: it tallies the
//! accepted-notifications of each instance and hands back chosen outcomes in strictly ascending
//! instance order, each exactly once. Its internal structure mirrors the proposer's instance
//! table.

use std::collections::HashMap;

use crate::message::{AcceptAck, AcceptorId, Ballot, Iid, Value};
use crate::LEARNER_ARRAY_SIZE;

/// The per-instance tally: the latest `(ballot, value)` each acceptor reported, and the chosen
/// outcome once a quorum agrees.
struct LearnerInstance {
    iid: Iid,

    accepts: HashMap<AcceptorId, (Ballot, Value)>,

    chosen: Option<AcceptAck>,
}

impl LearnerInstance {
    fn new(iid: Iid) -> Self {
        LearnerInstance {
            iid,
            accepts: HashMap::new(),
            chosen: None,
        }
    }
}

/// Tracks which value, if any, has been chosen for each instance. An instance is chosen once a
/// quorum of acceptors have accepted the same `(ballot, value)` pair.
pub struct Learner {
    quorum: usize,

    slots: Vec<Option<LearnerInstance>>,

    // The next iid deliver_next will hand out. Everything below it has been delivered.
    next_deliver_iid: Iid,
}

impl Learner {
    pub fn new(acceptors_count: usize) -> Self {
        Learner::with_capacity(acceptors_count, LEARNER_ARRAY_SIZE)
    }

    fn with_capacity(acceptors_count: usize, capacity: usize) -> Self {
        assert!(acceptors_count > 0, "at least one acceptor is required");
        assert!(capacity > 0, "the learner table cannot be empty");

        Learner {
            quorum: acceptors_count / 2 + 1,
            slots: (0..capacity).map(|_| None).collect(),
            next_deliver_iid: 1,
        }
    }

    fn index(&self, iid: Iid) -> usize {
        (iid % self.slots.len() as u64) as usize
    }

    /// Folds one accepted-notification into the instance's tally, closing the instance when the
    /// notification completes a quorum on its `(ballot, value)` pair.
    pub fn receive_accept(&mut self, ack: &AcceptAck) {
        if ack.iid < self.next_deliver_iid {
            debug!(
                "Accepted-notification dropped, iid {:?} already delivered.",
                ack.iid
            );
            return;
        }

        let i = self.index(ack.iid);
        match &self.slots[i] {
            Some(slot) if slot.iid == ack.iid => {}
            Some(slot) => {
                warn!(
                    "Learner window exceeded, dropping accepted-notification for iid {:?} (slot held by iid {:?}).",
                    ack.iid, slot.iid
                );
                return;
            }
            None => {
                self.slots[i] = Some(LearnerInstance::new(ack.iid));
            }
        }

        let quorum = self.quorum;
        let slot = self.slots[i].as_mut().expect("slot just created or checked");

        if slot.chosen.is_some() {
            // Already closed; extra notifications change nothing.
            return;
        }

        if let Some((ballot, _)) = slot.accepts.get(&ack.acceptor_id) {
            if *ballot >= ack.ballot {
                debug!(
                    "Dropping duplicate accepted-notification from {:?} for iid {:?}.",
                    ack.acceptor_id, ack.iid
                );
                return;
            }
        }
        slot.accepts
            .insert(ack.acceptor_id, (ack.ballot, ack.value.clone()));

        let votes = slot
            .accepts
            .values()
            .filter(|(ballot, value)| *ballot == ack.ballot && *value == ack.value)
            .count();

        if votes >= quorum {
            slot.chosen = Some(ack.clone());
            debug!("Instance {:?} closed.", ack.iid);
        }
    }

    /// Returns the chosen outcome of the next undelivered instance, or `None` while that instance
    /// is still open. Delivery is gap-filling: instance `n + 1` is never handed out before
    /// instance `n`.
    pub fn deliver_next(&mut self) -> Option<AcceptAck> {
        let i = self.index(self.next_deliver_iid);

        let closed = match &self.slots[i] {
            Some(slot) => slot.iid == self.next_deliver_iid && slot.chosen.is_some(),
            None => false,
        };
        if !closed {
            return None;
        }

        let slot = self.slots[i].take().expect("slot checked closed");
        self.next_deliver_iid += 1;
        slot.chosen
    }
}
