//! Snap Runtime - transport, channel and errors
//!
//! This crate provides the low-level infrastructure for talking to a
//! Snapmaker 2.0 controller over its HTTP control API:
//!
//! - **Transport**: raw request/response over HTTP ([`HttpTransport`])
//! - **Channel**: token attachment and typed JSON decoding
//! - **Errors**: the error taxonomy shared by every layer above
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   snap-rs   │  Session, gate, poller, operations
//! └──────┬──────┘
//!        │ uses Channel
//! ┌──────▼──────┐
//! │ snap-runtime│  This crate
//! │  ┌────────┐ │
//! │  │Channel │ │  token + decoding
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  reqwest / scripted
//! │  └────────┘ │
//! └─────────────┘
//! ```
//!
//! The session layer only depends on the [`Transport`] trait, so it can be
//! driven by an in-memory device in tests.

pub mod channel;
pub mod error;
pub mod transport;

pub use channel::Channel;
pub use error::{Error, Result, Subsystem};
pub use transport::{HttpTransport, Params, Transport, Upload, base_url_for};
