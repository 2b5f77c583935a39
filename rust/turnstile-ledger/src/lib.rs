#![warn(missing_docs)]

//! Distributed counting for the Turnstile trust layer.
//!
//! Two components live here:
//!
//! - [ShardedCounter]: an eventually consistent counter spread across up to
//!   a thousand storage rows, so that concurrent writers contend on a random
//!   shard instead of a single row. Reads sum all shards and are therefore
//!   not linearizable with respect to in-flight increments.
//! - [TokenLedger]: exact, per-token use accounting for claim sets that
//!   declare a maximum-use budget. Each token's count is a single row and
//!   every check-then-increment is atomic, so a token with one remaining use
//!   can never be spent twice.
//!
//! The two make opposite trades on purpose: the counter buys write
//! throughput with read precision, the ledger buys exactness with per-token
//! write throughput.

mod counter;
pub use counter::*;

mod error;
pub use error::*;

mod ledger;
pub use ledger::*;

mod position;
