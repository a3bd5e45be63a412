//! Ballot - Single-administrator plurality voting
//!
//! One administrator registers voters and drives a six-phase workflow;
//! registered voters submit proposals, cast one vote each, and the
//! administrator tallies a plurality winner.
//!
//! Layers:
//! - `ballot`: the workflow core (access gate, phases, registries, tally, audit records)
//! - `service`: hosts one ballot, serializes calls and commits them atomically
//! - `store`: snapshot persistence (in-memory or single CBOR file)
//! - `serialization`: CBOR encoding shared by the stores

pub mod ballot;
pub mod serialization;
pub mod service;
pub mod store;
