// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod fixtures;
mod gating;
mod scenarios;
