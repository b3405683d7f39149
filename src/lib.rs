//! Execution engine for boolean-token Petri nets.
//!
//! [`net`] holds the model and its firing semantics, [`config`] the TOML
//! execution defaults and [`options`] the command-line surface of `pn-sim`.

pub mod config;
pub mod net;
pub mod options;
