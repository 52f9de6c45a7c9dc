//! Scalability mode codes (`L<spatial>T<temporal>`) used in RTP encodings.


use crate::rtp_parameters::RtpEncodingParameters;
use once_cell::sync::Lazy;
use regex::Regex;
use std::num::NonZeroU8;
use std::str::FromStr;
use thiserror::Error;

static SCALABILITY_MODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[LS]([1-9][0-9]?)T([1-9][0-9]?)(_KEY)?").unwrap());

static SPATIAL_TEMPORAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^L(\d+)T(\d+)").unwrap());

/// Error that caused [`ScalabilityMode`] parsing error.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseScalabilityModeError {
    /// Invalid input string
    #[error("Invalid input string")]
    InvalidInput,
}

/// Scalability mode.
///
/// Most modes look like `L<spatial>T<temporal>` (or `S<spatial>T<temporal>` for simulcast-like
/// SVC), optionally suffixed with `_KEY` for K-SVC.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ScalabilityMode {
    spatial_layers: NonZeroU8,
    temporal_layers: NonZeroU8,
    ksvc: bool,
}

impl Default for ScalabilityMode {
    fn default() -> Self {
        Self {
            spatial_layers: NonZeroU8::MIN,
            temporal_layers: NonZeroU8::MIN,
            ksvc: false,
        }
    }
}

impl FromStr for ScalabilityMode {
    type Err = ParseScalabilityModeError;

    fn from_str(scalability_mode: &str) -> Result<Self, Self::Err> {
        let captures = SCALABILITY_MODE_REGEX
            .captures(scalability_mode)
            .ok_or(ParseScalabilityModeError::InvalidInput)?;
        let layers = |index: usize| {
            captures
                .get(index)
                .and_then(|layers| layers.as_str().parse::<NonZeroU8>().ok())
                .ok_or(ParseScalabilityModeError::InvalidInput)
        };

        Ok(Self {
            spatial_layers: layers(1)?,
            temporal_layers: layers(2)?,
            ksvc: captures.get(3).is_some(),
        })
    }
}

impl ScalabilityMode {
    /// Number of spatial layers.
    #[must_use]
    pub fn spatial_layers(&self) -> NonZeroU8 {
        self.spatial_layers
    }

    /// Number of temporal layers.
    #[must_use]
    pub fn temporal_layers(&self) -> NonZeroU8 {
        self.temporal_layers
    }

    /// K-SVC mode.
    #[must_use]
    pub fn ksvc(&self) -> bool {
        self.ksvc
    }

    /// Whether stream carries more than one layer of any kind.
    #[must_use]
    pub fn is_layered(&self) -> bool {
        self.spatial_layers.get() > 1 || self.temporal_layers.get() > 1
    }
}

/// Scalability mode of the single stream a consumer receives out of `encodings`.
///
/// The mode of the first encoding carrying one is used. With more than one encoding (simulcast)
/// the spatial layer count is replaced by the number of encodings, keeping the temporal layer
/// count of `L<spatial>T<temporal>` modes and falling back to a single temporal layer otherwise.
#[must_use]
pub fn consumer_scalability_mode(encodings: &[RtpEncodingParameters]) -> Option<String> {
    let scalability_mode = encodings
        .iter()
        .filter_map(|encoding| encoding.scalability_mode.as_deref())
        .find(|scalability_mode| !scalability_mode.is_empty());

    if encodings.len() <= 1 {
        return scalability_mode.map(ToString::to_string);
    }

    let temporal_layers = scalability_mode
        .and_then(|scalability_mode| SPATIAL_TEMPORAL_REGEX.captures(scalability_mode))
        .and_then(|captures| captures.get(2))
        .map_or("1", |temporal_layers| temporal_layers.as_str());

    Some(format!("L{}T{}", encodings.len(), temporal_layers))
}
