//! CLI module for feedr - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running the loop and
//! checking which configuration it would run with.

pub mod commands;

pub use commands::Cli;
