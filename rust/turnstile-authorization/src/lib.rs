#![warn(missing_docs)]

//! Layered authorization for the Turnstile trust layer.
//!
//! This crate composes the other Turnstile components into the per-request
//! authorization flow:
//!
//! 1. The [Authenticator] reads the signing secret from a [ConfigSource],
//!    decodes the presented bearer token, charges the consumable-token
//!    ledger once if the token declares a use budget, and resolves the
//!    token's subject against the account store (the two sentinel subjects
//!    skip the lookup).
//! 2. The outcome lands in an [AuthContext] — an explicit request-scoped
//!    struct, not an opaque context bag — alongside the route parameters
//!    the transport extracted.
//! 3. A [Checker] evaluates an ordered list of [AuthCheck] predicates under
//!    ANY or ALL combination semantics and either runs the downstream
//!    handler or yields the failing check's exact [AccessError].
//!
//! Denials are always specific: the transport collaborator receives a
//! stable [ErrorCode] per failure kind, never a generic forbidden.
//!
//! ```ignore
//! let checker = Checker::any()
//!     .check(SuperOnly)
//!     .check(HasRole::new("admin"));
//!
//! let cx = authenticator.authenticate(bearer).await;
//! checker.then(cx, |cx| list_accounts(cx)).await?;
//! ```

mod authenticate;
pub use authenticate::*;

mod check;
pub use check::*;

mod checker;
pub use checker::*;

mod config;
pub use config::*;

mod context;
pub use context::*;

mod error;
pub use error::*;
