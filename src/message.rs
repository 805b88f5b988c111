//! A module which contains the definition of the messages exchanged between clients, proposers and
//! acceptors, together with the identifier types and the opaque value payload they carry.

/// The instance id, i.e. the number of the log slot an instance of consensus decides. Instance ids
/// are 1-based; 0 never appears on the wire.
pub type Iid = u64;

/// The ballot number of a proposer's attempt at an instance. Ballot 0 is reserved to mean "none";
/// real ballots have the form `k * MAX_PROPOSERS + proposer_id` with `k >= 1`, which keeps the
/// ballots of distinct proposers disjoint.
pub type Ballot = u64;

/// The index of an acceptor in the configured acceptor list.
pub type AcceptorId = usize;

/// The payload that clients ask the proposers to totally order. The proposer never looks inside
/// it: equality is byte-wise and the only limit is `PAXOS_MAX_VALUE_SIZE`, enforced at admission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Value(Vec<u8>);

impl Value {
    pub fn new(bytes: Vec<u8>) -> Self {
        Value(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value(bytes.to_vec())
    }
}

/// An enum which contains all types of messages which nodes of the replication engine can
/// exchange. The enum tag doubles as the wire type tag; the datagram boundary is the frame
/// boundary.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Message {
    Submit(Submit),
    PrepareReq(PrepareReq),
    PrepareAck(PrepareAck),
    AcceptReq(AcceptReq),
    AcceptAck(AcceptAck),
}

/// A client hands a value to a proposer, which will assign it to some log slot.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Submit {
    pub value: Value,
}

/// In Phase 1a, a proposer asks all acceptors to promise not to accept ballots below `ballot` for
/// the instance `iid`, and to report any value they already accepted for it.
#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct PrepareReq {
    pub iid: Iid,

    pub ballot: Ballot,
}

/// In Phase 1b, an acceptor answers a `PrepareReq` with a promise. If the acceptor already
/// accepted a value for this instance, the value rides along tagged with the ballot it was
/// accepted at, so the proposer can carry it into Phase 2.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrepareAck {
    pub acceptor_id: AcceptorId,

    pub iid: Iid,

    // The ballot being promised, i.e. the one carried by the PrepareReq.
    pub ballot: Ballot,

    // The ballot at which `value` was accepted, or 0 when the promise carries no value.
    pub value_ballot: Ballot,

    pub value: Option<Value>,
}

/// In Phase 2a, a proposer asks all acceptors to accept `value` at `ballot` for instance `iid`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AcceptReq {
    pub iid: Iid,

    pub ballot: Ballot,

    pub value: Value,
}

/// In Phase 2b, an acceptor reports that it accepted `value` at `ballot` for instance `iid`. A
/// quorum of matching `AcceptAck`s makes the value chosen for that slot.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AcceptAck {
    pub acceptor_id: AcceptorId,

    pub iid: Iid,

    pub ballot: Ballot,

    pub value: Value,
}
