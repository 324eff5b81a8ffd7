//! Session timing, filter eligibility and plan quota rules.
//!
//! Everything in this crate is pure: records come in already fetched,
//! derived values go out. Wall-clock time is injected through [`clock::Clock`].

pub mod clock;
pub mod draft;
pub mod eligibility;
pub mod error;
pub mod filter;
pub mod lenient;
pub mod quota;
pub mod session;
pub mod timing;
pub mod types;
