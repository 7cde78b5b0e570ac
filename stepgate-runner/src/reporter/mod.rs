// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report classified outcome events in a line-oriented format.
//!
//! The main type here is [`SessionReporter`], which is constructed via a [`ReporterBuilder`].

mod compat;
mod displayer;
mod imp;
mod tally;

pub use compat::*;
pub use displayer::StatusLevel;
pub use imp::*;
pub use tally::SessionTally;
