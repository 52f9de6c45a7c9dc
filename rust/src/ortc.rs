//! Negotiation of RTP capabilities and parameters between producers, the router and consumers.


use crate::h264_profile_level_id;
use crate::rtp_parameters::{
    CodecRole, MediaKind, MimeType, MimeTypeVideo, RtcpFeedback, RtcpParameters, RtpCapabilities,
    RtpCapabilitiesFinalized, RtpCodecCapability, RtpCodecCapabilityFinalized, RtpCodecParameters,
    RtpCodecParametersParameters, RtpCodecParametersParametersValue, RtpEncodingParameters,
    RtpEncodingParametersRtx, RtpHeaderExtensionDirection, RtpHeaderExtensionParameters,
    RtpHeaderExtensionUri, RtpParameters,
};
use crate::scalability_modes;
use crate::supported_rtp_capabilities;
use crate::trace::{LogTrace, NegotiationTrace, PayloadTypeSource, TraceEvent};
use crate::utils;
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::num::{NonZeroU32, NonZeroU8};
use thiserror::Error;

/// Dynamic payload types in the order they are handed out.
const DYNAMIC_PAYLOAD_TYPES: [u8; 32] = [
    100, 101, 102, 103, 104, 105, 106, 107, 108, 109, 110, 111, 112, 113, 114, 115, 116, 117, 118,
    119, 120, 121, 122, 123, 124, 125, 126, 127, 96, 97, 98, 99,
];

/// Class of a negotiation failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NegotiationErrorKind {
    /// Malformed capabilities or parameters.
    InvalidArgument,
    /// No compatible codec in a set of capabilities.
    UnsupportedCodec,
    /// All dynamic payload types are already taken.
    PayloadTypeExhausted,
    /// Two codecs would share the same payload type.
    DuplicatePayloadType,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpMappingCodec {
    pub payload_type: u8,
    pub mapped_payload_type: u8,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpMappingEncoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssrc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalability_mode: Option<String>,
    pub mapped_ssrc: u32,
}

/// Mapping of producer payload types and SSRCs to the ones used inside the router.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpMapping {
    pub codecs: Vec<RtpMappingCodec>,
    pub encodings: Vec<RtpMappingEncoding>,
}

/// Error caused by invalid RTP parameters or capabilities.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RtpParametersError {
    /// Payload type is out of the 7 bits range.
    #[error("invalid payload type {payload_type} in codec {mime_type}")]
    InvalidPayloadType {
        /// MIME type
        mime_type: MimeType,
        /// Payload type
        payload_type: u8,
    },
    /// Non-numeric `apt` parameter.
    #[error("invalid codec apt parameter {0}")]
    InvalidAptParameter(Cow<'static, str>),
    /// RTX codec without `apt` parameter.
    #[error("missing apt parameter in RTX codec {mime_type}")]
    MissingAptParameter {
        /// MIME type
        mime_type: MimeType,
    },
    /// Header extension id out of range.
    #[error("invalid header extension id {id} for {}", .uri.as_str())]
    InvalidHeaderExtensionId {
        /// Header extension URI
        uri: RtpHeaderExtensionUri,
        /// Header extension id
        id: u16,
    },
}

impl RtpParametersError {
    /// Class of the failure.
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        NegotiationErrorKind::InvalidArgument
    }
}

/// Error caused by invalid or unsupported RTP capabilities.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RtpCapabilitiesError {
    /// Media codecs must not be empty.
    #[error("media codecs cannot be empty")]
    EmptyMediaCodecs,
    /// Invalid media codec.
    #[error("invalid media codec: {0}")]
    InvalidCodec(#[from] RtpParametersError),
    /// Media codec not supported.
    #[error("media codec not supported [mime_type:{mime_type}, clock_rate:{clock_rate}]")]
    UnsupportedCodec {
        /// MIME type
        mime_type: MimeType,
        /// Clock rate
        clock_rate: NonZeroU32,
    },
    /// Cannot allocate more dynamic codec payload types.
    #[error("cannot allocate more dynamic codec payload types")]
    CannotAllocate,
    /// Duplicated preferred payload type.
    #[error("duplicated preferred payload type {0}")]
    DuplicatedPreferredPayloadType(u8),
}

impl RtpCapabilitiesError {
    /// Class of the failure.
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        match self {
            Self::EmptyMediaCodecs | Self::InvalidCodec(_) => NegotiationErrorKind::InvalidArgument,
            Self::UnsupportedCodec { .. } => NegotiationErrorKind::UnsupportedCodec,
            Self::CannotAllocate => NegotiationErrorKind::PayloadTypeExhausted,
            Self::DuplicatedPreferredPayloadType(_) => NegotiationErrorKind::DuplicatePayloadType,
        }
    }
}

/// Error caused by invalid or unsupported producer RTP parameters.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RtpParametersMappingError {
    /// Invalid RTP parameters.
    #[error("invalid RTP parameters: {0}")]
    InvalidRtpParameters(#[from] RtpParametersError),
    /// RTX codec `apt` doesn't reference any media codec.
    #[error("missing media codec found for RTX PT {payload_type}")]
    MissingMediaCodecForRtx {
        /// Payload type of RTX codec
        payload_type: u8,
    },
    /// Unsupported codec.
    #[error("unsupported codec [mime_type:{mime_type}, payload_type:{payload_type}]")]
    UnsupportedCodec {
        /// MIME type
        mime_type: MimeType,
        /// Payload type
        payload_type: u8,
    },
    /// Router has no RTX codec for the matched media codec.
    #[error("no RTX codec for capability codec PT {preferred_payload_type}")]
    UnsupportedRtxCodec {
        /// Preferred payload type of the router media codec
        preferred_payload_type: u8,
    },
}

impl RtpParametersMappingError {
    /// Class of the failure.
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        match self {
            Self::InvalidRtpParameters(_) | Self::MissingMediaCodecForRtx { .. } => {
                NegotiationErrorKind::InvalidArgument
            }
            Self::UnsupportedCodec { .. } | Self::UnsupportedRtxCodec { .. } => {
                NegotiationErrorKind::UnsupportedCodec
            }
        }
    }
}

/// Error caused by RTP parameters inconsistent with the RTP mapping or router capabilities.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConsumableRtpParametersError {
    /// Codec is absent from RTP mapping.
    #[error("no RTP mapping for codec PT {payload_type}")]
    MissingCodecMapping {
        /// Payload type
        payload_type: u8,
    },
    /// Mapped payload type is absent from router capabilities.
    #[error("no router codec with PT {mapped_payload_type}")]
    MissingCapabilityCodec {
        /// Mapped payload type
        mapped_payload_type: u8,
    },
    /// RTP mapping has a different number of encodings.
    #[error("{encodings} encodings, but {mapped_encodings} mapped encodings")]
    EncodingsMismatch {
        /// Number of encodings
        encodings: usize,
        /// Number of mapped encodings
        mapped_encodings: usize,
    },
}

impl ConsumableRtpParametersError {
    /// Class of the failure.
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        NegotiationErrorKind::InvalidArgument
    }
}

/// Error caused by consumer RTP capabilities.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConsumerRtpParametersError {
    /// Invalid capabilities
    #[error("invalid capabilities: {0}")]
    InvalidCapabilities(#[from] RtpParametersError),
    /// No compatible media codecs
    #[error("no compatible media codecs")]
    NoCompatibleMediaCodecs,
}

impl ConsumerRtpParametersError {
    /// Class of the failure.
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        match self {
            Self::InvalidCapabilities(_) => NegotiationErrorKind::InvalidArgument,
            Self::NoCompatibleMediaCodecs => NegotiationErrorKind::UnsupportedCodec,
        }
    }
}

/// How RTCP feedback of consumer codecs is reduced, depending on the congestion control header
/// extension in use.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RtcpFeedbackReduction {
    /// Transport-wide CC is used, `goog-remb` is removed.
    RemoveGoogRemb,
    /// Absolute send time is used, `transport-cc` is removed.
    RemoveTransportCc,
    /// No congestion control header extension, both are removed.
    RemoveAll,
}

impl RtcpFeedbackReduction {
    fn from_header_extensions(header_extensions: &[RtpHeaderExtensionParameters]) -> Self {
        let has_uri = |uri: RtpHeaderExtensionUri| header_extensions.iter().any(|ext| ext.uri == uri);

        if has_uri(RtpHeaderExtensionUri::TransportWideCcDraft01) {
            Self::RemoveGoogRemb
        } else if has_uri(RtpHeaderExtensionUri::AbsSendTime) {
            Self::RemoveTransportCc
        } else {
            Self::RemoveAll
        }
    }

    fn keeps(self, rtcp_feedback: RtcpFeedback) -> bool {
        match self {
            Self::RemoveGoogRemb => rtcp_feedback != RtcpFeedback::GoogRemb,
            Self::RemoveTransportCc => rtcp_feedback != RtcpFeedback::TransportCc,
            Self::RemoveAll => !matches!(
                rtcp_feedback,
                RtcpFeedback::GoogRemb | RtcpFeedback::TransportCc
            ),
        }
    }
}

/// Dynamic payload types not taken yet, handed out in [`DYNAMIC_PAYLOAD_TYPES`] order.
#[derive(Debug)]
struct DynamicPayloadTypes {
    /// Bit `pt - 96` is set while `pt` is available.
    available: u32,
    /// Position in [`DYNAMIC_PAYLOAD_TYPES`] before which nothing is available.
    next: usize,
}

impl DynamicPayloadTypes {
    fn new() -> Self {
        Self {
            available: u32::MAX,
            next: 0,
        }
    }

    fn bit(payload_type: u8) -> Option<u32> {
        (96..=127)
            .contains(&payload_type)
            .then(|| 1 << (payload_type - 96))
    }

    fn remove(&mut self, payload_type: u8) {
        if let Some(bit) = Self::bit(payload_type) {
            self.available &= !bit;
        }
    }

    fn pop(&mut self) -> Option<u8> {
        while let Some(&payload_type) = DYNAMIC_PAYLOAD_TYPES.get(self.next) {
            self.next += 1;
            if let Some(bit) = Self::bit(payload_type) {
                if self.available & bit != 0 {
                    self.available &= !bit;
                    return Some(payload_type);
                }
            }
        }

        None
    }
}

fn validate_apt(
    mime_type: MimeType,
    parameters: &RtpCodecParametersParameters,
) -> Result<(), RtpParametersError> {
    match parameters.get("apt") {
        Some(RtpCodecParametersParametersValue::Number(_)) => Ok(()),
        Some(RtpCodecParametersParametersValue::String(string)) => {
            Err(RtpParametersError::InvalidAptParameter(string.clone()))
        }
        None if mime_type.role() == CodecRole::Rtx => {
            Err(RtpParametersError::MissingAptParameter { mime_type })
        }
        None => Ok(()),
    }
}

fn validate_payload_type(mime_type: MimeType, payload_type: u8) -> Result<(), RtpParametersError> {
    if payload_type > 127 {
        return Err(RtpParametersError::InvalidPayloadType {
            mime_type,
            payload_type,
        });
    }

    Ok(())
}

/// Validates RtpCodecCapability.
pub fn validate_rtp_codec_capability(
    codec: &RtpCodecCapability,
) -> Result<(), RtpParametersError> {
    if let Some(preferred_payload_type) = codec.preferred_payload_type() {
        validate_payload_type(codec.mime_type(), preferred_payload_type)?;
    }

    validate_apt(codec.mime_type(), codec.parameters())
}

/// Validates RtpCapabilities.
pub fn validate_rtp_capabilities(
    rtp_capabilities: &RtpCapabilities,
) -> Result<(), RtpParametersError> {
    for codec in &rtp_capabilities.codecs {
        validate_rtp_codec_capability(codec)?;
    }

    for ext in &rtp_capabilities.header_extensions {
        if !(1..=255).contains(&ext.preferred_id) {
            return Err(RtpParametersError::InvalidHeaderExtensionId {
                uri: ext.uri,
                id: ext.preferred_id,
            });
        }
    }

    Ok(())
}

/// Validates RtpCodecParameters.
pub fn validate_rtp_codec_parameters(
    codec: &RtpCodecParameters,
) -> Result<(), RtpParametersError> {
    validate_payload_type(codec.mime_type(), codec.payload_type())?;
    validate_apt(codec.mime_type(), codec.parameters())
}

/// Validates RtpParameters.
pub fn validate_rtp_parameters(rtp_parameters: &RtpParameters) -> Result<(), RtpParametersError> {
    for codec in &rtp_parameters.codecs {
        validate_rtp_codec_parameters(codec)?;
    }

    for ext in &rtp_parameters.header_extensions {
        if ext.id == 0 {
            return Err(RtpParametersError::InvalidHeaderExtensionId {
                uri: ext.uri,
                id: ext.id,
            });
        }
    }

    Ok(())
}

/// Generate RTP capabilities for the Router based on the given media codecs and supported RTP
/// capabilities.
pub fn generate_router_rtp_capabilities(
    media_codecs: Vec<RtpCodecCapability>,
) -> Result<RtpCapabilitiesFinalized, RtpCapabilitiesError> {
    generate_router_rtp_capabilities_with_trace(media_codecs, &LogTrace)
}

/// Same as [`generate_router_rtp_capabilities()`], reporting decisions to `trace`.
pub fn generate_router_rtp_capabilities_with_trace(
    media_codecs: Vec<RtpCodecCapability>,
    trace: &dyn NegotiationTrace,
) -> Result<RtpCapabilitiesFinalized, RtpCapabilitiesError> {
    debug!(
        "generate_router_rtp_capabilities() [media_codecs:{}]",
        media_codecs.len()
    );

    if media_codecs.is_empty() {
        return Err(RtpCapabilitiesError::EmptyMediaCodecs);
    }

    let supported_rtp_capabilities = supported_rtp_capabilities::get_supported_rtp_capabilities();
    let mut dynamic_payload_types = DynamicPayloadTypes::new();
    let mut caps = RtpCapabilitiesFinalized {
        codecs: vec![],
        header_extensions: supported_rtp_capabilities.header_extensions,
        fec_mechanisms: supported_rtp_capabilities.fec_mechanisms,
    };

    for media_codec in media_codecs {
        validate_rtp_codec_capability(&media_codec)?;

        let matched_supported_codec = supported_rtp_capabilities
            .codecs
            .iter()
            .find(|supported_codec| {
                match_codecs((&media_codec).into(), (*supported_codec).into(), false).is_some()
            })
            .ok_or(RtpCapabilitiesError::UnsupportedCodec {
                mime_type: media_codec.mime_type(),
                clock_rate: media_codec.clock_rate(),
            })?;

        let (preferred_payload_type, source) =
            if let Some(preferred_payload_type) = media_codec.preferred_payload_type() {
                dynamic_payload_types.remove(preferred_payload_type);
                (preferred_payload_type, PayloadTypeSource::Requested)
            } else if let Some(preferred_payload_type) =
                matched_supported_codec.preferred_payload_type()
            {
                (preferred_payload_type, PayloadTypeSource::Static)
            } else {
                let preferred_payload_type = dynamic_payload_types
                    .pop()
                    .ok_or(RtpCapabilitiesError::CannotAllocate)?;
                (preferred_payload_type, PayloadTypeSource::Dynamic)
            };

        if caps
            .codecs
            .iter()
            .any(|codec| codec.preferred_payload_type() == preferred_payload_type)
        {
            return Err(RtpCapabilitiesError::DuplicatedPreferredPayloadType(
                preferred_payload_type,
            ));
        }

        trace.on_event(&TraceEvent::PayloadTypeAssigned {
            mime_type: matched_supported_codec.mime_type(),
            clock_rate: matched_supported_codec.clock_rate(),
            payload_type: preferred_payload_type,
            source,
        });

        // Requested parameters override supported ones.
        let mut parameters = matched_supported_codec.parameters().clone();
        parameters.extend(media_codec.parameters().clone());

        let codec = match matched_supported_codec {
            RtpCodecCapability::Audio {
                mime_type,
                clock_rate,
                channels,
                rtcp_feedback,
                ..
            } => RtpCodecCapabilityFinalized::Audio {
                mime_type: *mime_type,
                preferred_payload_type,
                clock_rate: *clock_rate,
                channels: *channels,
                parameters,
                rtcp_feedback: rtcp_feedback.clone(),
            },
            RtpCodecCapability::Video {
                mime_type,
                clock_rate,
                rtcp_feedback,
                ..
            } => RtpCodecCapabilityFinalized::Video {
                mime_type: *mime_type,
                preferred_payload_type,
                clock_rate: *clock_rate,
                parameters,
                rtcp_feedback: rtcp_feedback.clone(),
            },
        };

        let rtx_clock_rate = match &codec {
            RtpCodecCapabilityFinalized::Audio { .. } => None,
            RtpCodecCapabilityFinalized::Video { clock_rate, .. } => Some(*clock_rate),
        };

        caps.codecs.push(codec);

        // Add a RTX video codec if video.
        if let Some(clock_rate) = rtx_clock_rate {
            let payload_type = dynamic_payload_types
                .pop()
                .ok_or(RtpCapabilitiesError::CannotAllocate)?;

            trace.on_event(&TraceEvent::RtxCodecAdded {
                payload_type,
                apt: preferred_payload_type,
            });

            caps.codecs.push(RtpCodecCapabilityFinalized::Video {
                mime_type: MimeTypeVideo::Rtx,
                preferred_payload_type: payload_type,
                clock_rate,
                parameters: RtpCodecParametersParameters::from([(
                    "apt",
                    preferred_payload_type.into(),
                )]),
                rtcp_feedback: vec![],
            });
        }
    }

    Ok(caps)
}

/// Get a mapping of codec payloads and encodings of the given Producer RTP parameters as values
/// expected by the Router.
///
/// On success the H264 `profile-level-id` of producer codecs is replaced with the negotiated one
/// (or removed if none could be negotiated). On failure `rtp_parameters` is left untouched.
pub fn get_producer_rtp_parameters_mapping(
    rtp_parameters: &mut RtpParameters,
    rtp_capabilities: &RtpCapabilitiesFinalized,
) -> Result<RtpMapping, RtpParametersMappingError> {
    get_producer_rtp_parameters_mapping_with_trace(rtp_parameters, rtp_capabilities, &LogTrace)
}

/// Same as [`get_producer_rtp_parameters_mapping()`], reporting decisions to `trace`.
pub fn get_producer_rtp_parameters_mapping_with_trace(
    rtp_parameters: &mut RtpParameters,
    rtp_capabilities: &RtpCapabilitiesFinalized,
    trace: &dyn NegotiationTrace,
) -> Result<RtpMapping, RtpParametersMappingError> {
    debug!(
        "get_producer_rtp_parameters_mapping() [codecs:{}, encodings:{}]",
        rtp_parameters.codecs.len(),
        rtp_parameters.encodings.len()
    );

    validate_rtp_parameters(rtp_parameters)?;

    // Pairs of producer codec index and matched capability codec, media codecs first.
    let mut codec_to_cap_codec = Vec::<(usize, &RtpCodecCapabilityFinalized)>::new();
    let mut codec_matches = Vec::<(usize, CodecMatch)>::new();

    // Match parameters media codecs to capabilities media codecs.
    for (index, codec) in rtp_parameters.codecs.iter().enumerate() {
        if codec.is_rtx() {
            continue;
        }

        let (cap_codec, codec_match) = rtp_capabilities
            .codecs
            .iter()
            .find_map(|cap_codec| {
                match_codecs(codec.into(), cap_codec.into(), true)
                    .map(|codec_match| (cap_codec, codec_match))
            })
            .ok_or(RtpParametersMappingError::UnsupportedCodec {
                mime_type: codec.mime_type(),
                payload_type: codec.payload_type(),
            })?;

        trace.on_event(&TraceEvent::CodecMatched {
            mime_type: codec.mime_type(),
            payload_type: codec.payload_type(),
            mapped_payload_type: cap_codec.preferred_payload_type(),
        });

        codec_to_cap_codec.push((index, cap_codec));
        codec_matches.push((index, codec_match));
    }

    let media_codecs_count = codec_to_cap_codec.len();

    // Match parameters RTX codecs to capabilities RTX codecs.
    for (index, codec) in rtp_parameters.codecs.iter().enumerate() {
        if !codec.is_rtx() {
            continue;
        }

        let payload_type = codec.payload_type();
        let apt = codec
            .parameters()
            .apt()
            .ok_or(RtpParametersMappingError::MissingMediaCodecForRtx { payload_type })?;

        // Search for the associated media codec.
        let cap_media_codec = codec_to_cap_codec
            .iter()
            .take(media_codecs_count)
            .find(|(media_codec_index, _)| {
                rtp_parameters
                    .codecs
                    .get(*media_codec_index)
                    .map_or(false, |media_codec| {
                        u32::from(media_codec.payload_type()) == apt
                    })
            })
            .map(|(_, cap_media_codec)| *cap_media_codec)
            .ok_or(RtpParametersMappingError::MissingMediaCodecForRtx { payload_type })?;

        // Ensure that the capabilities media codec has a RTX codec.
        let cap_rtx_codec = rtp_capabilities
            .codecs
            .iter()
            .find(|cap_codec| {
                cap_codec.is_rtx()
                    && cap_codec.parameters().apt()
                        == Some(u32::from(cap_media_codec.preferred_payload_type()))
            })
            .ok_or(RtpParametersMappingError::UnsupportedRtxCodec {
                preferred_payload_type: cap_media_codec.preferred_payload_type(),
            })?;

        trace.on_event(&TraceEvent::CodecMatched {
            mime_type: codec.mime_type(),
            payload_type,
            mapped_payload_type: cap_rtx_codec.preferred_payload_type(),
        });

        codec_to_cap_codec.push((index, cap_rtx_codec));
    }

    let mut rtp_mapping = RtpMapping::default();

    // Generate codecs mapping.
    for (index, cap_codec) in codec_to_cap_codec {
        if let Some(codec) = rtp_parameters.codecs.get(index) {
            rtp_mapping.codecs.push(RtpMappingCodec {
                payload_type: codec.payload_type(),
                mapped_payload_type: cap_codec.preferred_payload_type(),
            });
        }
    }

    // Generate encodings mapping.
    let mut mapped_ssrc = utils::generate_ssrc();

    for (index, encoding) in rtp_parameters.encodings.iter().enumerate() {
        trace.on_event(&TraceEvent::EncodingMapped {
            index,
            rid: encoding.rid.clone(),
            ssrc: encoding.ssrc,
            mapped_ssrc,
        });

        rtp_mapping.encodings.push(RtpMappingEncoding {
            ssrc: encoding.ssrc,
            rid: encoding.rid.clone(),
            scalability_mode: encoding.scalability_mode.clone(),
            mapped_ssrc,
        });

        mapped_ssrc = mapped_ssrc.wrapping_add(1);
    }

    // Mapping succeeded, apply negotiated codec parameters.
    for (index, codec_match) in codec_matches {
        if let Some(codec) = rtp_parameters.codecs.get_mut(index) {
            if let CodecMatch::H264 { profile_level_id } = &codec_match {
                trace.on_event(&TraceEvent::ProfileLevelIdNegotiated {
                    payload_type: codec.payload_type(),
                    profile_level_id: profile_level_id.clone(),
                });
            }
            codec_match.apply_to(codec.parameters_mut());
        }
    }

    Ok(rtp_mapping)
}

fn codec_parameters_from_capability(
    cap_codec: &RtpCodecCapabilityFinalized,
    parameters: RtpCodecParametersParameters,
) -> RtpCodecParameters {
    match cap_codec {
        RtpCodecCapabilityFinalized::Audio {
            mime_type,
            preferred_payload_type,
            clock_rate,
            channels,
            rtcp_feedback,
            ..
        } => RtpCodecParameters::Audio {
            mime_type: *mime_type,
            payload_type: *preferred_payload_type,
            clock_rate: *clock_rate,
            channels: *channels,
            parameters,
            rtcp_feedback: rtcp_feedback.clone(),
        },
        RtpCodecCapabilityFinalized::Video {
            mime_type,
            preferred_payload_type,
            clock_rate,
            rtcp_feedback,
            ..
        } => RtpCodecParameters::Video {
            mime_type: *mime_type,
            payload_type: *preferred_payload_type,
            clock_rate: *clock_rate,
            parameters,
            rtcp_feedback: rtcp_feedback.clone(),
        },
    }
}

/// Generate RTP parameters to be internally used by Consumers given the RTP parameters of a
/// Producer and the RTP capabilities of the Router.
pub fn get_consumable_rtp_parameters(
    kind: MediaKind,
    rtp_parameters: &RtpParameters,
    rtp_capabilities: &RtpCapabilitiesFinalized,
    rtp_mapping: &RtpMapping,
) -> Result<RtpParameters, ConsumableRtpParametersError> {
    debug!("get_consumable_rtp_parameters() [kind:{}]", kind);

    let mut consumable_params = RtpParameters::default();

    for codec in &rtp_parameters.codecs {
        if codec.is_rtx() {
            continue;
        }

        let consumable_codec_pt = rtp_mapping
            .codecs
            .iter()
            .find(|entry| entry.payload_type == codec.payload_type())
            .ok_or(ConsumableRtpParametersError::MissingCodecMapping {
                payload_type: codec.payload_type(),
            })?
            .mapped_payload_type;

        let matched_cap_codec = rtp_capabilities
            .codecs
            .iter()
            .find(|cap_codec| cap_codec.preferred_payload_type() == consumable_codec_pt)
            .ok_or(ConsumableRtpParametersError::MissingCapabilityCodec {
                mapped_payload_type: consumable_codec_pt,
            })?;

        // Keep the Producer codec parameters.
        consumable_params.codecs.push(codec_parameters_from_capability(
            matched_cap_codec,
            codec.parameters().clone(),
        ));

        let consumable_cap_rtx_codec = rtp_capabilities.codecs.iter().find(|cap_rtx_codec| {
            cap_rtx_codec.is_rtx()
                && cap_rtx_codec.parameters().apt() == Some(u32::from(consumable_codec_pt))
        });

        if let Some(consumable_cap_rtx_codec) = consumable_cap_rtx_codec {
            consumable_params.codecs.push(codec_parameters_from_capability(
                consumable_cap_rtx_codec,
                consumable_cap_rtx_codec.parameters().clone(),
            ));
        }
    }

    for cap_ext in &rtp_capabilities.header_extensions {
        // Just take RTP header extension that can be used in Consumers.
        if cap_ext.kind == kind
            && matches!(
                cap_ext.direction,
                RtpHeaderExtensionDirection::SendRecv | RtpHeaderExtensionDirection::SendOnly
            )
        {
            consumable_params
                .header_extensions
                .push(RtpHeaderExtensionParameters {
                    uri: cap_ext.uri,
                    id: cap_ext.preferred_id,
                    encrypt: false,
                });
        }
    }

    if rtp_parameters.encodings.len() != rtp_mapping.encodings.len() {
        return Err(ConsumableRtpParametersError::EncodingsMismatch {
            encodings: rtp_parameters.encodings.len(),
            mapped_encodings: rtp_mapping.encodings.len(),
        });
    }

    for (encoding, mapped_encoding) in rtp_parameters
        .encodings
        .iter()
        .zip(&rtp_mapping.encodings)
    {
        consumable_params.encodings.push(RtpEncodingParameters {
            ssrc: Some(mapped_encoding.mapped_ssrc),
            rid: None,
            rtx: None,
            codec_payload_type: None,
            ..encoding.clone()
        });
    }

    consumable_params.rtcp = RtcpParameters {
        cname: rtp_parameters.rtcp.cname.clone(),
        reduced_size: true,
        mux: Some(true),
    };

    Ok(consumable_params)
}

/// Check whether the given RTP capabilities can consume the given Producer.
///
/// Errors only on malformed capabilities, incompatibility is `Ok(false)`.
pub fn can_consume(
    consumable_params: &RtpParameters,
    caps: &RtpCapabilities,
) -> Result<bool, RtpParametersError> {
    validate_rtp_capabilities(caps)?;

    let first_matching_codec = consumable_params.codecs.iter().find(|codec| {
        caps.codecs
            .iter()
            .any(|cap_codec| match_codecs(cap_codec.into(), (*codec).into(), true).is_some())
    });

    // Ensure there is at least one media codec.
    Ok(matches!(first_matching_codec, Some(codec) if !codec.is_rtx()))
}

/// Generate RTP parameters for a specific Consumer.
///
/// It reduces encodings to just one and takes into account given RTP capabilities to reduce codecs,
/// codecs' RTCP feedback and header extensions, and also enables or disables RTX.
pub fn get_consumer_rtp_parameters(
    consumable_params: &RtpParameters,
    caps: &RtpCapabilities,
) -> Result<RtpParameters, ConsumerRtpParametersError> {
    get_consumer_rtp_parameters_with_trace(consumable_params, caps, &LogTrace)
}

/// Same as [`get_consumer_rtp_parameters()`], reporting decisions to `trace`.
pub fn get_consumer_rtp_parameters_with_trace(
    consumable_params: &RtpParameters,
    caps: &RtpCapabilities,
    trace: &dyn NegotiationTrace,
) -> Result<RtpParameters, ConsumerRtpParametersError> {
    debug!(
        "get_consumer_rtp_parameters() [codecs:{}, encodings:{}]",
        consumable_params.codecs.len(),
        consumable_params.encodings.len()
    );

    let mut consumer_params = RtpParameters {
        rtcp: consumable_params.rtcp.clone(),
        ..RtpParameters::default()
    };

    validate_rtp_capabilities(caps)?;

    let mut rtx_supported = false;

    for codec in &consumable_params.codecs {
        let matched_cap_codec = caps
            .codecs
            .iter()
            .find(|cap_codec| match_codecs((*cap_codec).into(), codec.into(), true).is_some());

        let Some(matched_cap_codec) = matched_cap_codec else {
            trace.on_event(&TraceEvent::CodecRejected {
                mime_type: codec.mime_type(),
                payload_type: codec.payload_type(),
            });
            continue;
        };

        let mut codec = codec.clone();
        *codec.rtcp_feedback_mut() = matched_cap_codec.rtcp_feedback().clone();

        if codec.is_rtx() {
            rtx_supported = true;
        }

        consumer_params.codecs.push(codec);
    }

    // Ensure there is at least one media codec.
    match consumer_params.codecs.first() {
        Some(codec) if !codec.is_rtx() => {}
        _ => return Err(ConsumerRtpParametersError::NoCompatibleMediaCodecs),
    }

    consumer_params.header_extensions = consumable_params
        .header_extensions
        .iter()
        .filter(|ext| {
            caps.header_extensions
                .iter()
                .any(|cap_ext| cap_ext.preferred_id == ext.id)
        })
        .cloned()
        .collect();

    // Reduce codecs' RTCP feedback. Use Transport-CC if available, REMB otherwise.
    let reduction =
        RtcpFeedbackReduction::from_header_extensions(&consumer_params.header_extensions);
    trace.on_event(&TraceEvent::RtcpFeedbackReduced { reduction });

    for codec in &mut consumer_params.codecs {
        codec
            .rtcp_feedback_mut()
            .retain(|rtcp_feedback| reduction.keeps(*rtcp_feedback));
    }

    let scalability_mode =
        scalability_modes::consumer_scalability_mode(&consumable_params.encodings);

    trace.on_event(&TraceEvent::ScalabilityModeResolved {
        scalability_mode: scalability_mode.clone(),
        encodings: consumable_params.encodings.len(),
    });

    // Use the maximum max bitrate in any encoding and honor it in the Consumer's encoding.
    let max_bitrate = consumable_params
        .encodings
        .iter()
        .filter_map(|encoding| encoding.max_bitrate)
        .max()
        .filter(|max_bitrate| *max_bitrate > 0);

    // Set a single encoding for the Consumer.
    consumer_params.encodings.push(RtpEncodingParameters {
        ssrc: Some(utils::generate_ssrc()),
        rtx: rtx_supported.then(|| RtpEncodingParametersRtx {
            ssrc: utils::generate_ssrc(),
        }),
        scalability_mode,
        max_bitrate,
        ..RtpEncodingParameters::default()
    });

    Ok(consumer_params)
}

/// Generate RTP parameters for a pipe Consumer.
///
/// It keeps all original consumable encodings, removes RTX support and also other features such
/// as NACK.
#[must_use]
pub fn get_pipe_consumer_rtp_parameters(consumable_params: &RtpParameters) -> RtpParameters {
    debug!(
        "get_pipe_consumer_rtp_parameters() [codecs:{}, encodings:{}]",
        consumable_params.codecs.len(),
        consumable_params.encodings.len()
    );

    let codecs = consumable_params
        .codecs
        .iter()
        .filter(|codec| !codec.is_rtx())
        .map(|codec| {
            let mut codec = codec.clone();
            // Reduce RTCP feedbacks by removing NACK support and other features.
            codec.rtcp_feedback_mut().retain(|rtcp_feedback| {
                matches!(rtcp_feedback, RtcpFeedback::NackPli | RtcpFeedback::CcmFir)
            });
            codec
        })
        .collect();

    // Reduce RTP extensions by disabling transport BWE related ones.
    let header_extensions = consumable_params
        .header_extensions
        .iter()
        .filter(|ext| !ext.uri.is_bandwidth_estimation())
        .cloned()
        .collect();

    let encodings = consumable_params
        .encodings
        .iter()
        .map(|encoding| RtpEncodingParameters {
            rtx: None,
            ..encoding.clone()
        })
        .collect();

    RtpParameters {
        mid: None,
        codecs,
        header_extensions,
        encodings,
        rtcp: consumable_params.rtcp.clone(),
    }
}

/// Codec fields relevant for matching.
#[derive(Debug, Copy, Clone)]
struct CodecToMatch<'a> {
    mime_type: MimeType,
    clock_rate: NonZeroU32,
    channels: Option<NonZeroU8>,
    parameters: &'a RtpCodecParametersParameters,
}

impl<'a> From<&'a RtpCodecCapability> for CodecToMatch<'a> {
    fn from(rtp_codec_capability: &'a RtpCodecCapability) -> Self {
        match rtp_codec_capability {
            RtpCodecCapability::Audio { channels, .. } => Self {
                mime_type: rtp_codec_capability.mime_type(),
                clock_rate: rtp_codec_capability.clock_rate(),
                channels: Some(*channels),
                parameters: rtp_codec_capability.parameters(),
            },
            RtpCodecCapability::Video { .. } => Self {
                mime_type: rtp_codec_capability.mime_type(),
                clock_rate: rtp_codec_capability.clock_rate(),
                channels: None,
                parameters: rtp_codec_capability.parameters(),
            },
        }
    }
}

impl<'a> From<&'a RtpCodecCapabilityFinalized> for CodecToMatch<'a> {
    fn from(rtp_codec_capability: &'a RtpCodecCapabilityFinalized) -> Self {
        let channels = match rtp_codec_capability {
            RtpCodecCapabilityFinalized::Audio { channels, .. } => Some(*channels),
            RtpCodecCapabilityFinalized::Video { .. } => None,
        };

        Self {
            mime_type: rtp_codec_capability.mime_type(),
            clock_rate: rtp_codec_capability.clock_rate(),
            channels,
            parameters: rtp_codec_capability.parameters(),
        }
    }
}

impl<'a> From<&'a RtpCodecParameters> for CodecToMatch<'a> {
    fn from(rtp_codec_parameters: &'a RtpCodecParameters) -> Self {
        match rtp_codec_parameters {
            RtpCodecParameters::Audio {
                mime_type,
                clock_rate,
                channels,
                parameters,
                ..
            } => Self {
                mime_type: MimeType::Audio(*mime_type),
                clock_rate: *clock_rate,
                channels: Some(*channels),
                parameters,
            },
            RtpCodecParameters::Video {
                mime_type,
                clock_rate,
                parameters,
                ..
            } => Self {
                mime_type: MimeType::Video(*mime_type),
                clock_rate: *clock_rate,
                channels: None,
                parameters,
            },
        }
    }
}

/// Outcome of a successful codec match.
#[derive(Debug, Clone, Eq, PartialEq)]
enum CodecMatch {
    Plain,
    /// Strict H264 match with the `profile-level-id` to use (none if it should be removed).
    H264 { profile_level_id: Option<String> },
}

impl CodecMatch {
    /// Write negotiated values into the parameters of the codec that was matched.
    fn apply_to(self, parameters: &mut RtpCodecParametersParameters) {
        if let Self::H264 { profile_level_id } = self {
            match profile_level_id {
                Some(profile_level_id) => {
                    parameters.insert("profile-level-id", profile_level_id);
                }
                None => {
                    parameters.remove("profile-level-id");
                }
            }
        }
    }
}

fn packetization_mode(parameters: &RtpCodecParametersParameters) -> Option<u32> {
    match parameters.get("packetization-mode") {
        None => Some(0),
        Some(RtpCodecParametersParametersValue::Number(packetization_mode)) => {
            Some(*packetization_mode)
        }
        Some(RtpCodecParametersParametersValue::String(packetization_mode)) => {
            packetization_mode.trim().parse().ok()
        }
    }
}

/// Unparsable values only match the very same raw value.
fn same_packetization_mode(
    parameters_a: &RtpCodecParametersParameters,
    parameters_b: &RtpCodecParametersParameters,
) -> bool {
    match (
        packetization_mode(parameters_a),
        packetization_mode(parameters_b),
    ) {
        (Some(mode_a), Some(mode_b)) => mode_a == mode_b,
        (None, None) => {
            parameters_a.get("packetization-mode") == parameters_b.get("packetization-mode")
        }
        _ => false,
    }
}

fn match_codecs(
    codec_a: CodecToMatch<'_>,
    codec_b: CodecToMatch<'_>,
    strict: bool,
) -> Option<CodecMatch> {
    if codec_a.mime_type != codec_b.mime_type {
        return None;
    }

    if codec_a.clock_rate != codec_b.clock_rate {
        return None;
    }

    if let MimeType::Audio(_) = codec_a.mime_type {
        let is_default = |channels: Option<NonZeroU8>| channels.map_or(true, |c| c.get() == 1);
        if !(is_default(codec_a.channels) && is_default(codec_b.channels))
            && codec_a.channels != codec_b.channels
        {
            return None;
        }
    }

    // Per codec special checks.
    if let MimeType::Video(MimeTypeVideo::H264 | MimeTypeVideo::H264Svc) = codec_a.mime_type {
        if !same_packetization_mode(codec_a.parameters, codec_b.parameters) {
            return None;
        }

        // If strict matching check profile-level-id.
        if strict {
            if !h264_profile_level_id::is_same_profile(codec_a.parameters, codec_b.parameters) {
                return None;
            }

            let profile_level_id = h264_profile_level_id::generate_profile_level_id_for_answer(
                codec_a.parameters,
                codec_b.parameters,
            )
            .ok()?;

            return Some(CodecMatch::H264 { profile_level_id });
        }
    }

    Some(CodecMatch::Plain)
}
