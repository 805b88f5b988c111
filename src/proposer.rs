//! The module that contains the proposer core of the replication engine: the value queue, the
//! instance table and the state machine that drives each log slot through Phase 1 and Phase 2.
//! The enclosing event loop drives it through exactly five entry points: `propose`, `prepare`,
//! `receive_prepare_ack`, `accept` and `receive_accept_ack`.

use std::collections::{HashSet, VecDeque};

use crate::learner::Learner;
use crate::message::{AcceptAck, AcceptReq, AcceptorId, Ballot, Iid, PrepareAck, PrepareReq, Value};
use crate::{MAX_PROPOSERS, PROPOSER_ARRAY_SIZE};

/// Ballots of proposer `id` form the sequence `MAX_PROPOSERS + id`, `2 * MAX_PROPOSERS + id`, ...
/// so that no two proposers ever share a ballot. Passing 0 starts the sequence.
fn next_ballot(id: usize, b: Ballot) -> Ballot {
    if b > 0 {
        b + MAX_PROPOSERS
    } else {
        MAX_PROPOSERS + id as Ballot
    }
}

/// The FIFO of client-submitted values awaiting a log slot. A value leaves the queue when it is
/// assigned as some slot's Phase 2 value; it comes back at the tail when a competing value wins
/// that slot.
struct ValueQueue {
    values: VecDeque<Value>,
}

impl ValueQueue {
    fn new() -> Self {
        ValueQueue {
            values: VecDeque::new(),
        }
    }

    fn push_back(&mut self, value: Value) {
        self.values.push_back(value);
    }

    fn pop_front(&mut self) -> Option<Value> {
        self.values.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// A value learned from a promise, tagged with the ballot it was accepted at. The proposer must
/// keep only the learned value with the highest such ballot.
struct PromisedValue {
    ballot: Ballot,
    value: Value,
}

/// Where an instance stands. Each variant carries only the fields meaningful in that phase, so a
/// slot cannot, say, keep collecting promises while Phase 2 is running.
enum Phase {
    /// Phase 1 in flight: collecting promises at the instance's current ballot.
    P1Pending {
        promises: HashSet<AcceptorId>,
        p1_value: Option<PromisedValue>,
    },
    /// A quorum of distinct promises is in; the slot waits for `accept` to open Phase 2.
    P1Ready { p1_value: Option<PromisedValue> },
    /// Phase 2 in flight with the instance's `p2_value`.
    P2Pending,
}

/// The per-slot consensus state.
struct Instance {
    iid: Iid,

    my_ballot: Ballot,

    phase: Phase,

    // The value this proposer pushes through Phase 2 for this slot. It sits next to `phase`
    // rather than inside `P2Pending` because it must survive a later Phase 1 re-run of the same
    // slot.
    p2_value: Option<Value>,
}

impl Instance {
    fn new(iid: Iid, ballot: Ballot) -> Self {
        Instance {
            iid,
            my_ballot: ballot,
            phase: Phase::P1Pending {
                promises: HashSet::new(),
                p1_value: None,
            },
            p2_value: None,
        }
    }
}

/// A fixed-capacity ring of instances addressed by `iid mod capacity`. Instances retire roughly
/// in log order, so the ring is large enough as long as the pre-execution window is smaller than
/// its capacity; wrapping onto a slot whose occupant has not retired is a configuration error.
struct InstanceTable {
    slots: Vec<Option<Instance>>,
}

impl InstanceTable {
    fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "the instance table cannot be empty");
        InstanceTable {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    fn index(&self, iid: Iid) -> usize {
        (iid % self.slots.len() as u64) as usize
    }

    /// The instance currently stored for `iid`. A slot holding a different iid means `iid` is not
    /// stored (retired long ago, or never created).
    fn get(&self, iid: Iid) -> Option<&Instance> {
        let i = self.index(iid);
        self.slots[i].as_ref().filter(|inst| inst.iid == iid)
    }

    fn get_mut(&mut self, iid: Iid) -> Option<&mut Instance> {
        let i = self.index(iid);
        self.slots[i].as_mut().filter(|inst| inst.iid == iid)
    }

    fn insert(&mut self, inst: Instance) {
        let i = self.index(inst.iid);
        if let Some(old) = &self.slots[i] {
            panic!(
                "instance window exceeded, slot for iid {} still held by iid {}",
                inst.iid, old.iid
            );
        }
        self.slots[i] = Some(inst);
    }

    /// Releases the slot holding `iid`, if any, making it available for the window to reuse.
    fn clear(&mut self, iid: Iid) {
        let i = self.index(iid);
        if self.slots[i].as_ref().map_or(false, |inst| inst.iid == iid) {
            self.slots[i] = None;
        }
    }
}

/// The proposer state machine. It owns the value queue, the instance table and the learner
/// adapter; all anomalies in incoming acks are absorbed locally, so none of the entry points
/// returns an error.
pub struct Proposer {
    id: usize,

    quorum: usize,

    // Highest iid a prepare was issued for; the pre-execution window grows past it.
    next_prepare_iid: Iid,

    // Highest iid a Phase 2 was opened for. Never overtakes next_prepare_iid.
    next_accept_iid: Iid,

    values: ValueQueue,

    instances: InstanceTable,

    learner: Learner,

    // Optional hook fired when a value this proposer pushed through Phase 2 is chosen.
    on_chosen: Option<Box<dyn FnMut(Iid, &Value)>>,
}

impl Proposer {
    pub fn new(id: usize, acceptors_count: usize) -> Self {
        assert!(
            (id as u64) < MAX_PROPOSERS,
            "invalid proposer id {}, must be below {}",
            id,
            MAX_PROPOSERS
        );
        assert!(acceptors_count > 0, "at least one acceptor is required");

        Proposer {
            id,
            quorum: acceptors_count / 2 + 1,
            next_prepare_iid: 0,
            next_accept_iid: 0,
            values: ValueQueue::new(),
            instances: InstanceTable::new(PROPOSER_ARRAY_SIZE),
            learner: Learner::new(acceptors_count),
            on_chosen: None,
        }
    }

    /// Registers a callback invoked with `(iid, value)` whenever a value this proposer proposed
    /// is chosen for a slot. Nothing depends on a callback being registered.
    pub fn on_value_chosen<F>(&mut self, f: F)
    where
        F: FnMut(Iid, &Value) + 'static,
    {
        self.on_chosen = Some(Box::new(f));
    }

    /// Queues a client value; it will be proposed for the first slot that reaches a promise
    /// quorum with no inherited value.
    pub fn propose(&mut self, value: Value) {
        self.values.push_back(value);
        debug!(
            "[P={:?}] Value queued, {:?} now waiting for a slot.",
            self.id,
            self.values.len()
        );
    }

    /// Opens (or re-runs) Phase 1 for the slot just past the pre-execution window and returns the
    /// request to broadcast to all acceptors.
    pub fn prepare(&mut self) -> PrepareReq {
        let iid = self.next_prepare_iid + 1;
        let id = self.id;

        match self.instances.get_mut(iid) {
            None => {
                self.instances.insert(Instance::new(iid, next_ballot(id, 0)));
            }
            Some(inst) => {
                if let Phase::P1Pending { .. } = inst.phase {
                    // Phase 1 is being retried: everything collected at the previous ballot is
                    // forgotten and the ballot advances.
                    inst.phase = Phase::P1Pending {
                        promises: HashSet::new(),
                        p1_value: None,
                    };
                    inst.my_ballot = next_ballot(id, inst.my_ballot);
                }
            }
        }

        self.next_prepare_iid = iid;

        let inst = self.instances.get(iid).expect("prepared slot must be stored");
        debug!(
            "[P={:?}] Prepare for iid {:?} at ballot {:?}.",
            self.id, iid, inst.my_ballot
        );

        PrepareReq {
            iid,
            ballot: inst.my_ballot,
        }
    }

    /// Merges one acceptor's promise into the slot's Phase 1 state; the slot becomes ready for
    /// Phase 2 once a quorum of distinct acceptors has promised.
    pub fn receive_prepare_ack(&mut self, ack: &PrepareAck) {
        let quorum = self.quorum;

        let inst = match self.instances.get_mut(ack.iid) {
            Some(inst) => inst,
            None => {
                debug!("Promise dropped, iid {:?} not stored (too old).", ack.iid);
                return;
            }
        };

        let ready = match &mut inst.phase {
            Phase::P1Pending { promises, p1_value } => {
                if !promises.insert(ack.acceptor_id) {
                    debug!(
                        "Dropping duplicate promise from {:?} for iid {:?}.",
                        ack.acceptor_id, ack.iid
                    );
                    return;
                }
                merge_promised_value(p1_value, ack);
                promises.len() >= quorum
            }
            _ => {
                debug!("Promise dropped, iid {:?} is past Phase 1.", ack.iid);
                return;
            }
        };

        if ready {
            let p1_value = match &mut inst.phase {
                Phase::P1Pending { p1_value, .. } => p1_value.take(),
                _ => None,
            };
            inst.phase = Phase::P1Ready { p1_value };
            debug!("Quorum for iid {:?} reached.", ack.iid);
        }
    }

    /// Tries to open Phase 2 for the next slot in log order. Returns the request to broadcast, or
    /// `None` while that slot has no promise quorum yet or no value is waiting for a slot.
    pub fn accept(&mut self) -> Option<AcceptReq> {
        let iid = self.next_accept_iid + 1;

        match self.instances.get(iid) {
            Some(inst) => match inst.phase {
                Phase::P1Ready { .. } => {}
                _ => return None,
            },
            None => return None,
        }
        if self.values.is_empty() {
            return None;
        }

        let inst = self
            .instances
            .get_mut(iid)
            .expect("ready slot must be stored");

        let p1_value = match &mut inst.phase {
            Phase::P1Ready { p1_value } => p1_value.take(),
            _ => None,
        };

        // Pick the value Phase 2 will carry. A value learned during Phase 1 was possibly chosen
        // at a lower ballot, so it always takes the slot over anything of ours.
        match (p1_value, inst.p2_value.take()) {
            (None, None) => {
                // Phase 1 completed without learning a value; a fresh client value gets the slot.
                inst.p2_value = Some(self.values.pop_front().expect("queue checked non-empty"));
            }
            (Some(p1), None) => {
                inst.p2_value = Some(p1.value);
            }
            (None, Some(p2)) => {
                // Phase 2 re-run with the value this slot already carried.
                inst.p2_value = Some(p2);
            }
            (Some(p1), Some(p2)) => {
                if p1.value == p2 {
                    inst.p2_value = Some(p2);
                } else {
                    // The learned value takes the slot; ours goes back to the tail for a later
                    // slot.
                    self.values.push_back(p2);
                    inst.p2_value = Some(p1.value);
                }
            }
        }

        inst.phase = Phase::P2Pending;
        self.next_accept_iid = iid;

        let value = inst.p2_value.clone().expect("p2 value just assigned");
        debug!(
            "[P={:?}] Accept for iid {:?} at ballot {:?}.",
            self.id, iid, inst.my_ballot
        );

        Some(AcceptReq {
            iid,
            ballot: inst.my_ballot,
            value,
        })
    }

    /// Hands the accepted-notification to the learner, then drains every newly chosen outcome in
    /// log order, retiring the corresponding slots.
    pub fn receive_accept_ack(&mut self, ack: &AcceptAck) {
        self.learner.receive_accept(ack);
        while let Some(chosen) = self.learner.deliver_next() {
            self.learn(&chosen);
        }
    }

    /// Applies one chosen outcome: if a competing value won the slot, our value goes back to the
    /// tail of the queue; either way the slot retires and its ring entry is released.
    fn learn(&mut self, ack: &AcceptAck) {
        debug!("Learning outcome of instance {:?}.", ack.iid);

        if self.instances.get(ack.iid).is_none() {
            // Not stored, probably retired already.
            return;
        }

        let mine = self
            .instances
            .get_mut(ack.iid)
            .and_then(|inst| inst.p2_value.take());

        match mine {
            Some(ref value) if *value == ack.value => {
                // Our value was chosen for this slot.
                if let Some(notify) = self.on_chosen.as_mut() {
                    notify(ack.iid, value);
                }
            }
            Some(value) => {
                // A competing value won the slot.
                self.values.push_back(value);
            }
            None => {
                // We never assigned a value to this slot; it was driven by somebody else.
            }
        }

        self.instances.clear(ack.iid);
    }
}

/// The promise-merge rule: keep the learned value accepted at the highest ballot seen so far,
/// folding in whatever this promise reports.
fn merge_promised_value(current: &mut Option<PromisedValue>, ack: &PrepareAck) {
    let value = match &ack.value {
        Some(value) => value,
        None => return, // the promise carries no value
    };

    let current_ballot = current.as_ref().map_or(0, |p| p.ballot);
    if current_ballot >= ack.value_ballot {
        debug!(
            "Promised value ignored, value ballot {:?} does not beat {:?}.",
            ack.value_ballot, current_ballot
        );
        return;
    }

    if let Some(p) = current {
        if p.value == *value {
            // Same bytes, seen at a higher ballot.
            p.ballot = ack.value_ballot;
            return;
        }
    }

    *current = Some(PromisedValue {
        ballot: ack.value_ballot,
        value: value.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    // Three acceptors, so two form a quorum.
    const ACCEPTORS: usize = 3;

    fn proposer() -> Proposer {
        Proposer::new(0, ACCEPTORS)
    }

    fn value(bytes: &[u8]) -> Value {
        Value::from(bytes)
    }

    fn empty_promise(iid: Iid, ballot: Ballot, acceptor_id: AcceptorId) -> PrepareAck {
        PrepareAck {
            acceptor_id,
            iid,
            ballot,
            value_ballot: 0,
            value: None,
        }
    }

    fn promise_with_value(
        iid: Iid,
        ballot: Ballot,
        acceptor_id: AcceptorId,
        value_ballot: Ballot,
        bytes: &[u8],
    ) -> PrepareAck {
        PrepareAck {
            acceptor_id,
            iid,
            ballot,
            value_ballot,
            value: Some(value(bytes)),
        }
    }

    fn accepted(iid: Iid, ballot: Ballot, acceptor_id: AcceptorId, bytes: &[u8]) -> AcceptAck {
        AcceptAck {
            acceptor_id,
            iid,
            ballot,
            value: value(bytes),
        }
    }

    /// Drives `iid` to a promise quorum with empty promises from acceptors 0 and 1.
    fn reach_quorum(p: &mut Proposer, iid: Iid, ballot: Ballot) {
        p.receive_prepare_ack(&empty_promise(iid, ballot, 0));
        p.receive_prepare_ack(&empty_promise(iid, ballot, 1));
    }

    /// Delivers a quorum of accepted-notifications for `iid`.
    fn choose(p: &mut Proposer, iid: Iid, ballot: Ballot, bytes: &[u8]) {
        p.receive_accept_ack(&accepted(iid, ballot, 0, bytes));
        p.receive_accept_ack(&accepted(iid, ballot, 1, bytes));
    }

    #[test]
    fn prepare_opens_instances_in_order() {
        let mut p = proposer();
        let r1 = p.prepare();
        let r2 = p.prepare();
        assert_eq!(r1.iid, 1);
        assert_eq!(r2.iid, 2);
        // First ballot of proposer 0.
        assert_eq!(r1.ballot, MAX_PROPOSERS);
        assert_eq!(r2.ballot, MAX_PROPOSERS);
    }

    #[test]
    fn first_ballots_of_distinct_proposers_are_disjoint() {
        let mut a = Proposer::new(1, ACCEPTORS);
        let mut b = Proposer::new(2, ACCEPTORS);
        assert_ne!(a.prepare().ballot, b.prepare().ballot);
    }

    #[test]
    fn chooses_submitted_values_in_order() {
        let mut p = proposer();
        let r1 = p.prepare();
        let r2 = p.prepare();
        p.propose(value(b"A"));
        p.propose(value(b"B"));

        reach_quorum(&mut p, 1, r1.ballot);
        reach_quorum(&mut p, 2, r2.ballot);

        let a1 = p.accept().expect("iid 1 has quorum and a value");
        assert_eq!(a1.iid, 1);
        assert_eq!(a1.ballot, r1.ballot);
        assert_eq!(a1.value, value(b"A"));

        let a2 = p.accept().expect("iid 2 has quorum and a value");
        assert_eq!(a2.iid, 2);
        assert_eq!(a2.value, value(b"B"));

        // Nothing left to open Phase 2 for.
        assert!(p.accept().is_none());

        choose(&mut p, 1, a1.ballot, b"A");
        choose(&mut p, 2, a2.ballot, b"B");
        assert!(p.instances.get(1).is_none());
        assert!(p.instances.get(2).is_none());
        assert!(p.values.is_empty());
    }

    #[test]
    fn quorum_of_empty_promises_takes_the_client_value() {
        let mut p = proposer();
        let r = p.prepare();
        reach_quorum(&mut p, 1, r.ballot);
        p.propose(value(b"X"));

        let a = p.accept().expect("quorum reached");
        assert_eq!(a.iid, 1);
        assert_eq!(a.ballot, r.ballot);
        assert_eq!(a.value, value(b"X"));
        assert!(p.values.is_empty());
    }

    #[test]
    fn learned_value_preempts_client_value() {
        let mut p = proposer();
        let r = p.prepare();
        p.receive_prepare_ack(&promise_with_value(1, r.ballot, 0, 2, b"Y"));
        p.receive_prepare_ack(&empty_promise(1, r.ballot, 1));
        p.propose(value(b"X"));

        let a = p.accept().expect("quorum reached");
        assert_eq!(a.value, value(b"Y"));
        // The client value keeps its place at the head of the queue.
        assert_eq!(p.values.len(), 1);
    }

    #[test]
    fn reproposes_value_lost_to_competing_proposer() {
        let mut p = proposer();
        let r1 = p.prepare();
        let r2 = p.prepare();
        p.propose(value(b"X"));
        reach_quorum(&mut p, 1, r1.ballot);

        let a1 = p.accept().expect("iid 1 ready");
        assert_eq!(a1.value, value(b"X"));

        // Another proposer's value Z is chosen for iid 1.
        let other_ballot = MAX_PROPOSERS + 1;
        choose(&mut p, 1, other_ballot, b"Z");

        assert!(p.instances.get(1).is_none());
        assert_eq!(p.values.len(), 1);

        // X gets another chance in the next ready slot.
        reach_quorum(&mut p, 2, r2.ballot);
        let a2 = p.accept().expect("iid 2 ready");
        assert_eq!(a2.iid, 2);
        assert_eq!(a2.value, value(b"X"));
    }

    #[test]
    fn duplicate_promises_are_dropped() {
        let mut p = proposer();
        let r = p.prepare();
        p.propose(value(b"A"));

        p.receive_prepare_ack(&empty_promise(1, r.ballot, 0));
        p.receive_prepare_ack(&empty_promise(1, r.ballot, 0));
        assert!(p.accept().is_none(), "one acceptor is not a quorum");

        p.receive_prepare_ack(&empty_promise(1, r.ballot, 2));
        assert!(p.accept().is_some());
    }

    #[test]
    fn stale_prepare_ack_is_dropped() {
        let mut p = proposer();
        let r = p.prepare();
        p.propose(value(b"A"));
        reach_quorum(&mut p, 1, r.ballot);
        let a = p.accept().unwrap();
        choose(&mut p, 1, a.ballot, b"A");
        assert!(p.instances.get(1).is_none());

        // A late promise for the retired slot changes nothing.
        p.receive_prepare_ack(&empty_promise(1, r.ballot, 2));
        assert!(p.instances.get(1).is_none());
        assert!(p.values.is_empty());
    }

    #[test]
    fn promise_after_phase_2_opened_is_dropped() {
        let mut p = proposer();
        let r = p.prepare();
        p.propose(value(b"A"));
        reach_quorum(&mut p, 1, r.ballot);
        p.accept().unwrap();

        p.receive_prepare_ack(&empty_promise(1, r.ballot, 2));

        let inst = p.instances.get(1).unwrap();
        match inst.phase {
            Phase::P2Pending => {}
            _ => panic!("slot left Phase 2"),
        }
        assert_eq!(inst.p2_value.as_ref().unwrap(), &value(b"A"));
    }

    #[test]
    fn no_accept_without_promise_quorum() {
        let mut p = proposer();
        let r = p.prepare();
        p.propose(value(b"A"));
        p.receive_prepare_ack(&empty_promise(1, r.ballot, 0));
        assert!(p.accept().is_none());
    }

    #[test]
    fn accept_waits_for_client_value_even_with_learned_value() {
        let mut p = proposer();
        let r = p.prepare();
        p.receive_prepare_ack(&promise_with_value(1, r.ballot, 0, 2, b"Y"));
        p.receive_prepare_ack(&empty_promise(1, r.ballot, 1));

        assert!(p.accept().is_none(), "empty queue holds Phase 2 back");

        p.propose(value(b"X"));
        let a = p.accept().expect("value queued");
        assert_eq!(a.value, value(b"Y"));
    }

    #[test]
    fn phase_1_retry_advances_ballot_and_resets_promises() {
        let mut p = proposer();
        let r1 = p.prepare();
        p.receive_prepare_ack(&empty_promise(1, r1.ballot, 0));

        // Roll the window back so the same slot is prepared again.
        p.next_prepare_iid = 0;
        let r2 = p.prepare();
        assert_eq!(r2.iid, 1);
        assert_eq!(r2.ballot, r1.ballot + MAX_PROPOSERS);

        // The promise collected at the old ballot no longer counts.
        match &p.instances.get(1).unwrap().phase {
            Phase::P1Pending { promises, p1_value } => {
                assert!(promises.is_empty());
                assert!(p1_value.is_none());
            }
            _ => panic!("slot left Phase 1"),
        }
    }

    #[test]
    fn highest_value_ballot_wins_promise_merge() {
        let mut p = proposer();
        let r = p.prepare();
        p.receive_prepare_ack(&promise_with_value(1, r.ballot, 0, 5, b"Y"));
        p.receive_prepare_ack(&promise_with_value(1, r.ballot, 1, 3, b"W"));
        p.propose(value(b"X"));

        let a = p.accept().expect("quorum reached");
        assert_eq!(a.value, value(b"Y"));
    }

    #[test]
    fn equal_value_with_higher_ballot_updates_ballot_only() {
        let mut p = proposer();
        let r = p.prepare();
        p.receive_prepare_ack(&promise_with_value(1, r.ballot, 0, 2, b"Y"));
        p.receive_prepare_ack(&promise_with_value(1, r.ballot, 1, 4, b"Y"));

        match &p.instances.get(1).unwrap().phase {
            Phase::P1Ready {
                p1_value: Some(promised),
            } => {
                assert_eq!(promised.ballot, 4);
                assert_eq!(promised.value, value(b"Y"));
            }
            _ => panic!("expected a ready slot carrying the learned value"),
        }
    }

    #[test]
    fn promise_order_does_not_change_phase_2_value() {
        let acks = [
            promise_with_value(1, MAX_PROPOSERS, 0, 5, b"Y"),
            promise_with_value(1, MAX_PROPOSERS, 1, 3, b"W"),
        ];

        let mut forward = proposer();
        forward.prepare();
        forward.receive_prepare_ack(&acks[0]);
        forward.receive_prepare_ack(&acks[1]);
        forward.propose(value(b"X"));

        let mut backward = proposer();
        backward.prepare();
        backward.receive_prepare_ack(&acks[1]);
        backward.receive_prepare_ack(&acks[0]);
        backward.propose(value(b"X"));

        assert_eq!(forward.accept().unwrap().value, backward.accept().unwrap().value);
    }

    #[test]
    fn reenqueued_value_goes_to_the_tail() {
        let mut p = proposer();
        let r1 = p.prepare();
        let r2 = p.prepare();
        let r3 = p.prepare();

        p.propose(value(b"X"));
        reach_quorum(&mut p, 1, r1.ballot);
        let a1 = p.accept().unwrap();
        assert_eq!(a1.value, value(b"X"));

        // Q is queued before X loses its slot, so Q keeps its place.
        p.propose(value(b"Q"));
        choose(&mut p, 1, MAX_PROPOSERS + 1, b"Z");

        reach_quorum(&mut p, 2, r2.ballot);
        reach_quorum(&mut p, 3, r3.ballot);
        assert_eq!(p.accept().unwrap().value, value(b"Q"));
        assert_eq!(p.accept().unwrap().value, value(b"X"));
    }

    #[test]
    #[should_panic(expected = "window exceeded")]
    fn wrapping_onto_live_instance_is_fatal() {
        let mut table = InstanceTable::new(4);
        table.insert(Instance::new(1, MAX_PROPOSERS));
        // Same ring slot, different iid, previous occupant not retired.
        table.insert(Instance::new(5, MAX_PROPOSERS));
    }

    #[test]
    #[should_panic(expected = "invalid proposer id")]
    fn out_of_range_proposer_id_is_refused() {
        Proposer::new(MAX_PROPOSERS as usize, ACCEPTORS);
    }

    #[test]
    fn observer_fires_only_for_our_chosen_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut p = proposer();
        p.on_value_chosen(move |iid, v| sink.borrow_mut().push((iid, v.clone())));

        let r1 = p.prepare();
        let r2 = p.prepare();
        p.propose(value(b"A"));
        p.propose(value(b"B"));
        reach_quorum(&mut p, 1, r1.ballot);
        reach_quorum(&mut p, 2, r2.ballot);

        let a1 = p.accept().unwrap();
        p.accept().unwrap();

        // Our value wins slot 1; a competing value wins slot 2.
        choose(&mut p, 1, a1.ballot, b"A");
        choose(&mut p, 2, MAX_PROPOSERS + 1, b"Z");

        assert_eq!(*seen.borrow(), vec![(1, value(b"A"))]);
    }

    #[test]
    fn window_stays_ahead_of_accepts() {
        let mut p = proposer();
        // Window of two instances.
        let r1 = p.prepare();
        p.prepare();

        p.propose(value(b"A"));
        reach_quorum(&mut p, 1, r1.ballot);
        assert!(p.accept().is_some());
        // The driver opens one fresh Phase 1 per started Phase 2.
        p.prepare();

        assert_eq!(p.next_prepare_iid - p.next_accept_iid, 2);
    }
}
