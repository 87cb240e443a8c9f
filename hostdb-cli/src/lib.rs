//! hostdb CLI - Operator tool for tenant database provisioning.
//!
//! Wraps [`hostdb_core::HostDb`] for provisioning, password rotation,
//! ad-hoc queries and firewall checks from the shell.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
