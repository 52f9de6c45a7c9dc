//! RTP capability negotiation for a WebRTC Selective Forwarding Unit.
//!
//! A [`Router`](router::Router) computes its RTP capabilities out of a list of media codecs,
//! producers get their RTP parameters mapped into router payload types and SSRCs, and consumers
//! get RTP parameters tailored to the capabilities of the receiving endpoint.
//!
//! Lower level negotiation steps are available in [`ortc`].

#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod h264_profile_level_id;
mod macros;
pub mod ortc;
pub mod prelude;
pub mod router;
pub mod rtp_parameters;
pub mod scalability_modes;
pub mod supported_rtp_capabilities;
pub mod trace;
mod utils;

// TODO: The mess below is because of https://github.com/rust-lang/rust/issues/59368
#[cfg(not(doc))]
pub use router::consumer;
#[cfg(doc)]
#[path = "router/consumer.rs"]
pub mod consumer;

#[cfg(not(doc))]
pub use router::producer;
#[cfg(doc)]
#[path = "router/producer.rs"]
pub mod producer;
