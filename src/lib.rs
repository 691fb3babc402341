//! Operator CLI for the contributor moderation policy.
//!
//! The policy itself lives in `gp-moderation-policy`; this crate loads its
//! configuration and exposes evaluation, authorization and notice previews.

pub mod cli;
