//! Agrcheck CLI library.
//!
//! Command implementations behind the `agrcheck` binary: sweeping a scene
//! snapshot against the requirement catalogues, listing the rule set and
//! listing the entries of a delivered bundle.

pub mod commands;
