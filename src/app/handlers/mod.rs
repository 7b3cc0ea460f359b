// SPDX-License-Identifier: GPL-3.0-only

//! Command handlers
//!
//! Handlers are grouped by functional domain. Every handler reports through
//! the console and leaves session state untouched when the driver fails.

mod device;
mod session;
mod settings;
mod streams;
