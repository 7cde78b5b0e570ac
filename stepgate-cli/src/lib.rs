// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `stepgate` command-line tool.
//!
//! This crate is not meant to be used as a library: its API is unstable.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};
