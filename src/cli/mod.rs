// SPDX-License-Identifier: MIT

//! Command-line interface for Parlor

mod args;

pub use args::{Cli, Commands, SendArgs, ShowArgs};
