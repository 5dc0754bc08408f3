//! # Weft Protocols
//!
//! Interface definitions for the weft workflow engine.
//! Contains only the capability contract - no orchestration logic.
//!
//! A *capability* is a named external operation the engine can invoke with
//! JSON parameters, receiving a structured result record in return. Email
//! senders, chat integrations, subprocess wrappers and the like all sit
//! behind this single seam; the engine never knows how they work.

pub mod capability;
pub mod error;

pub use capability::{AbortSignal, Capability, CapabilityContext};
pub use error::CapabilityError;
