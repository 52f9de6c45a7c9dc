//! sfu-ortc prelude.
//!
//! Re-exports commonly used traits and structs from this crate.
//!
//! # Examples
//!
//! Import the prelude with:
//!
//! ```
//! # #[allow(unused_imports)]
//! use sfu_ortc::prelude::*;
//! ```
pub use crate::router::{ConsumeError, ProduceError, Router, RouterId, RouterOptions};

pub use crate::consumer::{Consumer, ConsumerId, ConsumerOptions, ConsumerType};
pub use crate::producer::{Producer, ProducerId, ProducerOptions, ProducerType};

pub use crate::ortc::{NegotiationErrorKind, RtpMapping};
pub use crate::rtp_parameters::{
    CodecRole, MediaKind, MimeType, MimeTypeAudio, MimeTypeVideo, RtcpFeedback, RtcpParameters,
    RtpCapabilities, RtpCapabilitiesFinalized, RtpCodecCapability, RtpCodecParameters,
    RtpCodecParametersParameters, RtpEncodingParameters, RtpEncodingParametersRtx,
    RtpHeaderExtension, RtpHeaderExtensionDirection, RtpHeaderExtensionParameters,
    RtpHeaderExtensionUri, RtpParameters,
};
pub use crate::scalability_modes::ScalabilityMode;
pub use crate::trace::{LogTrace, NegotiationTrace, TraceEvent};
