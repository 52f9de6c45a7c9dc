//! Structured events emitted while negotiating RTP capabilities and parameters.
//!
//! Every negotiation function in [`ortc`](crate::ortc) has a `*_with_trace` variant accepting a
//! [`NegotiationTrace`]; plain variants use [`LogTrace`]. Tracers only observe, they never
//! influence negotiation results.

use crate::ortc::RtcpFeedbackReduction;
use crate::rtp_parameters::MimeType;
use log::debug;
use std::num::NonZeroU32;

/// Where the payload type of a router codec comes from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PayloadTypeSource {
    /// Explicitly requested in router media codecs.
    Requested,
    /// Static payload type of the supported codec (e.g. 0 for PCMU).
    Static,
    /// Taken from the dynamic payload type range.
    Dynamic,
}

/// Negotiation event.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum TraceEvent {
    /// Router codec got its preferred payload type.
    PayloadTypeAssigned {
        mime_type: MimeType,
        clock_rate: NonZeroU32,
        payload_type: u8,
        source: PayloadTypeSource,
    },
    /// RTX codec was added to router capabilities for a video codec.
    RtxCodecAdded { payload_type: u8, apt: u8 },
    /// Producer codec matched a router codec.
    CodecMatched {
        mime_type: MimeType,
        payload_type: u8,
        mapped_payload_type: u8,
    },
    /// H264 `profile-level-id` negotiated for a producer codec, `None` means it was removed.
    ProfileLevelIdNegotiated {
        payload_type: u8,
        profile_level_id: Option<String>,
    },
    /// Producer encoding got its router side SSRC.
    EncodingMapped {
        index: usize,
        rid: Option<String>,
        ssrc: Option<u32>,
        mapped_ssrc: u32,
    },
    /// Codec was left out because the other side doesn't support it.
    CodecRejected { mime_type: MimeType, payload_type: u8 },
    /// RTCP feedback of consumer codecs was reduced according to header extensions in use.
    RtcpFeedbackReduced { reduction: RtcpFeedbackReduction },
    /// Scalability mode of the single consumer encoding.
    ScalabilityModeResolved {
        scalability_mode: Option<String>,
        encodings: usize,
    },
}

/// Observer of negotiation events.
pub trait NegotiationTrace {
    /// Called for every event, in the order negotiation decisions are taken.
    fn on_event(&self, event: &TraceEvent);
}

/// Discards all events.
impl NegotiationTrace for () {
    fn on_event(&self, _event: &TraceEvent) {}
}

impl<F> NegotiationTrace for F
where
    F: Fn(&TraceEvent),
{
    fn on_event(&self, event: &TraceEvent) {
        self(event);
    }
}

/// Forwards events to the `log` crate at debug level.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogTrace;

impl NegotiationTrace for LogTrace {
    fn on_event(&self, event: &TraceEvent) {
        debug!("negotiation event: {:?}", event);
    }
}
