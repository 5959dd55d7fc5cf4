//! Implementation of the MultiWii Serial Protocol (MSP) in Rust.
//!
//! This crate covers everything about the protocol that does not need I/O:
//! framing and checksums ([`frame`]), the message code table ([`codes`]), and
//! a [`Registry`] of payload schemas whose layout depends on the API version
//! the device reports.

#![no_std]

extern crate alloc;

pub mod codes;
pub mod field;
pub mod frame;
pub mod registry;
pub mod schemas;
pub mod select;

mod checksum;
mod decode;
mod encode;
mod version;

pub use checksum::frame_checksum;
pub use decode::{Decode, DecodeError, DecodeErrorKind};
pub use encode::{Encode, MessageEncoder};
pub use field::{FromValue, Record, Value, WireType};
pub use frame::{ChecksumMode, Direction, Frame, FrameError, Preamble};
pub use registry::{Access, Capability, Registry, RegistryError, Schema};
pub use select::{ProfileKind, ProfileRangeError, ProfileSelection, Profiles};
pub use version::ProtocolVersion;
