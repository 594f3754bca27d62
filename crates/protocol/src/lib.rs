//! Wire types for the Snapmaker 2.0 HTTP control API.
//!
//! This crate contains the serde-serializable shapes of every JSON body the
//! machine returns, plus the decoder for the untagged module records found in
//! `module_info` responses. These types represent the "protocol layer": no
//! networking, no session state.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond (de)serialization and lookups
//! - **Tolerant**: Missing fields decode to zero values, unknown module
//!   shapes decode to [`ModulePayload::Unknown`]
//! - **Stable**: Changes only when the device firmware changes its bodies
//!
//! The session layer built on top lives in `snap-rs`.

pub mod endpoints;
pub mod module;
pub mod types;

pub use module::*;
pub use types::*;
