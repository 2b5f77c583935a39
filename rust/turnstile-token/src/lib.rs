#![warn(missing_docs)]

//! Bearer-token encoding and verification for the Turnstile trust layer.
//!
//! A Turnstile bearer token is a compact, self-contained credential: three
//! base64url segments (`header "." payload "." signature`) where the
//! signature is an HMAC-SHA256 over the first two segments using a shared
//! symmetric secret.
//!
//! The verification flow:
//!
//! 1. A presented token equal to the secret itself (compared in constant
//!    time) authenticates the Super sentinel — the bootstrap path for a
//!    fresh deployment.
//! 2. An empty token authenticates the Nobody sentinel.
//! 3. Anything else must be structurally a three-segment token.
//! 4. The header must declare `alg: HS256` and `typ: JWT`.
//! 5. The signature must match a freshly computed MAC, compared in constant
//!    time.
//! 6. The claim set must not be expired.
//! 7. Reserved claim names are stripped from the private-claims bag before
//!    the claim set is exposed.
//!
//! Every failure mode has its own [TokenError] kind; callers can always tell
//! an expired token from a forged one.

mod claims;
pub use claims::*;

mod codec;
pub use codec::*;

mod error;
pub use error::*;

mod time;
pub use time::*;
