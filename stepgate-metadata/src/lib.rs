// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to stepgate's machine-readable output.
//!
//! This crate is kept deliberately small so that tools consuming stepgate results don't need to
//! depend on the full reporting core.

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
