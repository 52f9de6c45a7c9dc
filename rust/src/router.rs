//! A router holds the RTP capabilities negotiated out of its media codecs and creates producers
//! and consumers whose RTP parameters are expressed in terms of these capabilities.
//!
//! Producers and consumers are plain immutable values: all negotiation happens when they are
//! created.

pub mod consumer;
pub mod producer;

use crate::consumer::{Consumer, ConsumerId, ConsumerOptions, ConsumerType};
use crate::ortc::{
    self, ConsumableRtpParametersError, ConsumerRtpParametersError, NegotiationErrorKind,
    RtpCapabilitiesError, RtpParametersError, RtpParametersMappingError,
};
use crate::producer::{Producer, ProducerId, ProducerOptions};
use crate::rtp_parameters::{RtpCapabilities, RtpCapabilitiesFinalized, RtpCodecCapability};
use crate::uuid_based_wrapper_type;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

uuid_based_wrapper_type!(
    /// [`Router`] identifier.
    RouterId
);

/// [`Router`] options.
///
/// Can be loaded from JSON configuration:
/// ```
/// use sfu_ortc::router::RouterOptions;
///
/// let router_options: RouterOptions = serde_json::from_str(
///     r#"{"mediaCodecs": [{"mimeType": "audio/opus", "clockRate": 48000, "channels": 2}]}"#,
/// )
/// .unwrap();
/// assert_eq!(router_options.media_codecs.len(), 1);
/// ```
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct RouterOptions {
    /// Router media codecs.
    pub media_codecs: Vec<RtpCodecCapability>,
}

impl RouterOptions {
    /// Create router options with given list of declared media codecs.
    #[must_use]
    pub fn new(media_codecs: Vec<RtpCodecCapability>) -> Self {
        Self { media_codecs }
    }
}

/// Error that caused [`Router::produce`] to fail.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProduceError {
    /// Incorrect or unsupported RTP parameters.
    #[error("Incorrect RTP parameters: {0}")]
    IncorrectRtpParameters(#[from] RtpParametersMappingError),
    /// RTP mapping is inconsistent with RTP parameters or router capabilities.
    #[error("Failed to get consumable RTP parameters: {0}")]
    ConsumableRtpParameters(#[from] ConsumableRtpParametersError),
}

impl ProduceError {
    /// Class of the failure.
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        match self {
            Self::IncorrectRtpParameters(error) => error.kind(),
            Self::ConsumableRtpParameters(error) => error.kind(),
        }
    }
}

/// Error that caused [`Router::consume`] to fail.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConsumeError {
    /// Producer was created by a different router.
    #[error("Producer with id \"{0}\" not found")]
    ProducerNotFound(ProducerId),
    /// Malformed RTP capabilities.
    #[error("Invalid RTP capabilities: {0}")]
    InvalidRtpCapabilities(#[from] RtpParametersError),
    /// RTP capabilities have no media codec in common with producer.
    #[error("Cannot consume producer with id \"{0}\"")]
    CannotConsume(ProducerId),
    /// Failed to get consumer RTP parameters.
    #[error("Bad consumer RTP parameters: {0}")]
    BadConsumerRtpParameters(#[from] ConsumerRtpParametersError),
}

impl ConsumeError {
    /// Class of the failure.
    #[must_use]
    pub fn kind(&self) -> NegotiationErrorKind {
        match self {
            Self::ProducerNotFound(_) | Self::InvalidRtpCapabilities(_) => {
                NegotiationErrorKind::InvalidArgument
            }
            Self::CannotConsume(_) => NegotiationErrorKind::UnsupportedCodec,
            Self::BadConsumerRtpParameters(error) => error.kind(),
        }
    }
}

struct Inner {
    id: RouterId,
    rtp_capabilities: RtpCapabilitiesFinalized,
}

/// A router enables injection, selection and forwarding of media streams through [`Producer`]
/// and [`Consumer`] instances.
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("id", &self.inner.id)
            .field("rtp_capabilities", &self.inner.rtp_capabilities)
            .finish()
    }
}

impl Router {
    /// Create a router, computing its RTP capabilities out of the given media codecs.
    pub fn new(router_options: RouterOptions) -> Result<Self, RtpCapabilitiesError> {
        debug!("new()");

        let RouterOptions { media_codecs } = router_options;
        let rtp_capabilities = ortc::generate_router_rtp_capabilities(media_codecs)?;

        let inner = Arc::new(Inner {
            id: RouterId::new(),
            rtp_capabilities,
        });

        Ok(Self { inner })
    }

    /// Router id.
    pub fn id(&self) -> RouterId {
        self.inner.id
    }

    /// RTP capabilities of the router. These capabilities are typically needed by endpoints
    /// to compute their sending RTP parameters.
    #[must_use]
    pub fn rtp_capabilities(&self) -> &RtpCapabilitiesFinalized {
        &self.inner.rtp_capabilities
    }

    /// Instructs the router to receive audio or video RTP (or SRTP depending on the transport).
    /// This is the way to inject media into the router.
    ///
    /// H264 `profile-level-id` of the given RTP parameters is replaced with the negotiated one in
    /// [`Producer::rtp_parameters`].
    pub fn produce(&self, producer_options: ProducerOptions) -> Result<Producer, ProduceError> {
        debug!("produce()");

        let ProducerOptions {
            kind,
            mut rtp_parameters,
        } = producer_options;

        let rtp_mapping = ortc::get_producer_rtp_parameters_mapping(
            &mut rtp_parameters,
            &self.inner.rtp_capabilities,
        )?;

        let consumable_rtp_parameters = ortc::get_consumable_rtp_parameters(
            kind,
            &rtp_parameters,
            &self.inner.rtp_capabilities,
            &rtp_mapping,
        )?;

        Ok(Producer::new(
            ProducerId::new(),
            self.inner.id,
            kind,
            rtp_parameters,
            rtp_mapping,
            consumable_rtp_parameters,
        ))
    }

    /// Check whether the given RTP capabilities are valid to consume the given producer.
    ///
    /// Producers of other routers can't be consumed.
    pub fn can_consume(
        &self,
        producer: &Producer,
        rtp_capabilities: &RtpCapabilities,
    ) -> Result<bool, RtpParametersError> {
        if producer.router_id() != self.inner.id {
            debug!(
                "can_consume() | Producer with id \"{}\" not found",
                producer.id()
            );
            return Ok(false);
        }

        ortc::can_consume(producer.consumable_rtp_parameters(), rtp_capabilities)
    }

    /// Create a consumer of the given producer.
    ///
    /// Pipe consumers forward all RTP streams of the producer and ignore
    /// [`ConsumerOptions::rtp_capabilities`].
    pub fn consume(
        &self,
        producer: &Producer,
        consumer_options: ConsumerOptions,
    ) -> Result<Consumer, ConsumeError> {
        debug!("consume()");

        if producer.router_id() != self.inner.id {
            return Err(ConsumeError::ProducerNotFound(producer.id()));
        }

        let ConsumerOptions {
            rtp_capabilities,
            pipe,
        } = consumer_options;

        let (r#type, rtp_parameters) = if pipe {
            (
                ConsumerType::Pipe,
                ortc::get_pipe_consumer_rtp_parameters(producer.consumable_rtp_parameters()),
            )
        } else {
            if !ortc::can_consume(producer.consumable_rtp_parameters(), &rtp_capabilities)? {
                return Err(ConsumeError::CannotConsume(producer.id()));
            }

            (
                ConsumerType::from(producer.r#type()),
                ortc::get_consumer_rtp_parameters(
                    producer.consumable_rtp_parameters(),
                    &rtp_capabilities,
                )?,
            )
        };

        Ok(Consumer::new(
            ConsumerId::new(),
            producer.id(),
            producer.kind(),
            r#type,
            rtp_parameters,
        ))
    }
}
