// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Odoo.sh console wire types
//!
//! The console speaks JSON-RPC 2.0 for its model calls and a long-polling
//! bus for server-pushed events. None of it is documented or versioned, so
//! these types only describe the fields the client reads and ignore the
//! rest. They are shared between the client and its mock transport.

pub mod error;
pub mod notification;
pub mod rpc;
pub mod types;

pub use error::*;
pub use notification::*;
pub use rpc::*;
pub use types::*;
