//! Interactive console for a single measurement-device session.
//!
//! The binary asks for a transport, runs a [`dsc::CommandLoop`] against the
//! simulated backend and renders every [`dsc::Notice`] to stdout.

pub mod app;
pub mod cli;
pub mod config;
pub mod input;
pub mod logging;
pub mod output;
