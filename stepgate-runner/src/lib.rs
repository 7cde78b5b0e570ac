// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core reporting and dependency-gating logic for stepgate.
//!
//! A test runner drives this crate through a small set of lifecycle callbacks: session start,
//! one report per test phase, and session finish. The flow for each test is:
//!
//! 1. [`session::TestSession::before_setup`] consults the [`incremental::IncrementalGuard`] and
//!    may convert the test into an expected failure before it runs.
//! 2. Every phase's [`events::RawOutcomeEvent`] is classified by [`classify::classify`].
//! 3. The [`reporter::SessionReporter`] prints one line per event and, at the end, a summary.
//!
//! Sessions recorded as JSON lines can be fed back through the same flow with [`replay`].

pub mod classify;
pub mod config;
pub mod errors;
pub mod events;
pub mod incremental;
pub mod replay;
pub mod reporter;
pub mod session;
