//! Isolated image decoding and metadata extraction for frame payloads.
//!
//! [`Inspector::inspect`] turns payload bytes into [`ImageMetadata`] or an
//! [`InspectError`] describing why they could not be decoded. Nothing that
//! happens inside the codec escapes this boundary, so one corrupt frame
//! never aborts the stream around it.

pub mod chunks;
pub mod config;
pub mod error;
pub mod inspector;
pub mod metadata;

pub use config::InspectConfig;
pub use error::{InspectError, Result};
pub use inspector::{inspect, Inspector};
pub use metadata::{ColorMode, ImageMetadata};
