#![warn(missing_docs)]

//! Keyed, optimistically concurrent storage for the Turnstile trust layer.
//!
//! This crate is the substrate every other Turnstile component builds on. It
//! deliberately models a very small slice of a datastore:
//!
//! - [StorageBackend]: plain keyed reads and writes.
//! - [TransactionalBackend]: per-row editions plus an atomic multi-key
//!   commit, enabling optimistic concurrency control.
//! - [StorageScan]: key-only prefix queries, used to enumerate the rows that
//!   structurally descend from another row.
//! - [Transaction]: a snapshot read-set/write-set handle over a
//!   [TransactionalBackend]. Reads record the edition they observed; the
//!   commit validates every observed edition and applies the whole write set
//!   or none of it.
//!
//! There is no in-process caching of mutable rows across requests: a cached
//! row would hand later transactions a stale conflict baseline.

mod error;
pub use error::*;

mod backend;
pub use backend::*;

mod transaction;
pub use transaction::*;

mod deadline;
pub use deadline::*;
