#![warn(missing_docs)]

//! Principal accounts for the Turnstile trust layer.
//!
//! An [Account] is the stored record behind an authenticated principal:
//! identity, role set, credential hash, timestamps. Accounts live in a
//! [turnstile_storage::TransactionalBackend] behind the [AccountStore],
//! which enforces three properties end to end:
//!
//! - **Provenance**: only instances that came through the store (register or
//!   load) may be saved back; a hand-built instance is rejected before any
//!   storage access.
//! - **Optimistic concurrency**: saves and removals compare the stored row
//!   against the state the caller last observed and fail with a conflict
//!   rather than silently overwriting a competing writer.
//! - **Identity discipline**: the identity key is derived deterministically
//!   from the external identity, and the only sanctioned way to change it is
//!   the atomic [AccountStore::rename_identity].
//!
//! The two sentinel principals — [Principal::Super] and [Principal::Nobody]
//! — exist outside the store as tagged variants, so no code path ever
//! confuses them with a stored account by value comparison.

mod account;
pub use account::*;

mod error;
pub use error::*;

mod key;
pub use key::*;

mod password;
pub use password::*;

mod store;
pub use store::*;
