#[cfg(test)]
mod tests;

use crate::ortc::RtpMapping;
use crate::router::RouterId;
use crate::rtp_parameters::{MediaKind, MimeType, MimeTypeVideo, RtpParameters};
use crate::scalability_modes::ScalabilityMode;
use crate::uuid_based_wrapper_type;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

uuid_based_wrapper_type!(
    /// [`Producer`] identifier.
    ProducerId
);

/// [`Producer`] options.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ProducerOptions {
    /// Media kind.
    pub kind: MediaKind,
    /// RTP parameters defining what the endpoint is sending.
    pub rtp_parameters: RtpParameters,
}

impl ProducerOptions {
    /// Create producer options with given kind and RTP parameters.
    #[must_use]
    pub fn new(kind: MediaKind, rtp_parameters: RtpParameters) -> Self {
        Self {
            kind,
            rtp_parameters,
        }
    }
}

/// Producer type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProducerType {
    /// A single RTP stream is received with no spatial/temporal layers.
    Simple,
    /// Two or more RTP streams are received, each of them with one or more temporal layers.
    Simulcast,
    /// A single RTP stream is received with spatial/temporal layers.
    Svc,
}

impl ProducerType {
    fn from_rtp_parameters(rtp_parameters: &RtpParameters) -> Self {
        let encoding = match rtp_parameters.encodings.as_slice() {
            [encoding] => encoding,
            [] => return Self::Simple,
            _ => return Self::Simulcast,
        };

        let scalability_mode = match encoding.scalability_mode.as_deref() {
            Some(scalability_mode) => scalability_mode
                .parse::<ScalabilityMode>()
                .unwrap_or_else(|error| {
                    warn!(
                        "ignoring scalability mode \"{}\": {}",
                        scalability_mode, error
                    );
                    ScalabilityMode::default()
                }),
            None => ScalabilityMode::default(),
        };

        if !scalability_mode.is_layered() {
            return Self::Simple;
        }

        let codec = rtp_parameters
            .codecs
            .iter()
            .filter(|codec| !codec.is_rtx())
            .find(|codec| {
                encoding
                    .codec_payload_type
                    .map_or(true, |payload_type| codec.payload_type() == payload_type)
            });

        match codec.map(|codec| codec.mime_type()) {
            Some(MimeType::Video(MimeTypeVideo::Vp9 | MimeTypeVideo::H264Svc)) => Self::Svc,
            Some(MimeType::Video(MimeTypeVideo::Vp8 | MimeTypeVideo::H264)) => Self::Simulcast,
            _ => Self::Simple,
        }
    }
}

struct Inner {
    id: ProducerId,
    router_id: RouterId,
    kind: MediaKind,
    r#type: ProducerType,
    rtp_parameters: RtpParameters,
    rtp_mapping: RtpMapping,
    consumable_rtp_parameters: RtpParameters,
}

/// A producer represents an audio or video source being injected into a router.
///
/// Cloning is cheap, all clones share the same negotiated state.
#[derive(Clone)]
pub struct Producer {
    inner: Arc<Inner>,
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("id", &self.inner.id)
            .field("router_id", &self.inner.router_id)
            .field("kind", &self.inner.kind)
            .field("type", &self.inner.r#type)
            .field("rtp_parameters", &self.inner.rtp_parameters)
            .field("rtp_mapping", &self.inner.rtp_mapping)
            .field(
                "consumable_rtp_parameters",
                &self.inner.consumable_rtp_parameters,
            )
            .finish()
    }
}

impl Producer {
    pub(super) fn new(
        id: ProducerId,
        router_id: RouterId,
        kind: MediaKind,
        rtp_parameters: RtpParameters,
        rtp_mapping: RtpMapping,
        consumable_rtp_parameters: RtpParameters,
    ) -> Self {
        debug!("new()");

        let r#type = ProducerType::from_rtp_parameters(&rtp_parameters);

        let inner = Arc::new(Inner {
            id,
            router_id,
            kind,
            r#type,
            rtp_parameters,
            rtp_mapping,
            consumable_rtp_parameters,
        });

        Self { inner }
    }

    /// Producer id.
    #[must_use]
    pub fn id(&self) -> ProducerId {
        self.inner.id
    }

    pub(super) fn router_id(&self) -> RouterId {
        self.inner.router_id
    }

    /// Media kind.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    /// Producer RTP parameters, with codec parameters as negotiated with the router.
    #[must_use]
    pub fn rtp_parameters(&self) -> &RtpParameters {
        &self.inner.rtp_parameters
    }

    /// Producer type.
    #[must_use]
    pub fn r#type(&self) -> ProducerType {
        self.inner.r#type
    }

    /// Mapping of producer payload types and SSRCs to the ones used inside the router.
    #[must_use]
    pub fn rtp_mapping(&self) -> &RtpMapping {
        &self.inner.rtp_mapping
    }

    /// RTP parameters every consumer of this producer is derived from.
    #[must_use]
    pub fn consumable_rtp_parameters(&self) -> &RtpParameters {
        &self.inner.consumable_rtp_parameters
    }
}
