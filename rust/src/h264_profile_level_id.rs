//! H264 `profile-level-id` handling (RFC 6184 section 8.1).
//!
//! A `profile-level-id` is 3 bytes written as 6 hexadecimal digits: `profile_idc`, `profile_iop`
//! (constraint set flags) and `level_idc`. The profile is recognized from the combination of the
//! first two bytes, the level from the last one.


use crate::rtp_parameters::{RtpCodecParametersParameters, RtpCodecParametersParametersValue};
use std::str::FromStr;
use thiserror::Error;

const CONSTRAINT_SET3_FLAG: u8 = 0x10;

/// H264 profile.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Profile {
    /// Constrained Baseline
    ConstrainedBaseline,
    /// Baseline
    Baseline,
    /// Main
    Main,
    /// Constrained High
    ConstrainedHigh,
    /// High
    High,
    /// Predictive High 4:4:4
    PredictiveHigh444,
}

/// H264 level, discriminant is `level_idc` (except for level 1b).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Level {
    /// Level 1b, signaled as `level_idc` 11 with constraint set 3 flag
    Level1B = 0,
    Level1 = 10,
    Level1_1 = 11,
    Level1_2 = 12,
    Level1_3 = 13,
    Level2 = 20,
    Level2_1 = 21,
    Level2_2 = 22,
    Level3 = 30,
    Level3_1 = 31,
    Level3_2 = 32,
    Level4 = 40,
    Level4_1 = 41,
    Level4_2 = 42,
    Level5 = 50,
    Level5_1 = 51,
    Level5_2 = 52,
}

impl Level {
    fn from_level_idc(level_idc: u8, profile_iop: u8) -> Option<Self> {
        Some(match level_idc {
            11 if profile_iop & CONSTRAINT_SET3_FLAG != 0 => Self::Level1B,
            10 => Self::Level1,
            11 => Self::Level1_1,
            12 => Self::Level1_2,
            13 => Self::Level1_3,
            20 => Self::Level2,
            21 => Self::Level2_1,
            22 => Self::Level2_2,
            30 => Self::Level3,
            31 => Self::Level3_1,
            32 => Self::Level3_2,
            40 => Self::Level4,
            41 => Self::Level4_1,
            42 => Self::Level4_2,
            50 => Self::Level5,
            51 => Self::Level5_1,
            52 => Self::Level5_2,
            _ => return None,
        })
    }

    /// Level 1b sits between levels 1 and 1.1.
    fn is_less_than(self, other: Self) -> bool {
        match (self, other) {
            (Self::Level1B, other) => other != Self::Level1 && other != Self::Level1B,
            (this, Self::Level1B) => this == Self::Level1,
            (this, other) => (this as u8) < (other as u8),
        }
    }

    fn min(self, other: Self) -> Self {
        if self.is_less_than(other) {
            self
        } else {
            other
        }
    }
}

/// Bit pattern of `profile_iop`, `x` bits are ignored.
#[derive(Debug, Copy, Clone)]
struct BitPattern {
    mask: u8,
    masked_value: u8,
}

impl BitPattern {
    const fn new(pattern: &[u8; 8]) -> Self {
        let mut mask = 0;
        let mut masked_value = 0;
        let mut i = 0;
        while i < 8 {
            let bit = 1 << (7 - i);
            match pattern[i] {
                b'1' => {
                    mask |= bit;
                    masked_value |= bit;
                }
                b'0' => {
                    mask |= bit;
                }
                _ => {}
            }
            i += 1;
        }

        Self { mask, masked_value }
    }

    fn is_match(self, value: u8) -> bool {
        value & self.mask == self.masked_value
    }
}

const PROFILE_PATTERNS: [(u8, BitPattern, Profile); 9] = [
    (0x42, BitPattern::new(b"x1xx0000"), Profile::ConstrainedBaseline),
    (0x4D, BitPattern::new(b"1xxx0000"), Profile::ConstrainedBaseline),
    (0x58, BitPattern::new(b"11xx0000"), Profile::ConstrainedBaseline),
    (0x42, BitPattern::new(b"x0xx0000"), Profile::Baseline),
    (0x58, BitPattern::new(b"10xx0000"), Profile::Baseline),
    (0x4D, BitPattern::new(b"0x0x0000"), Profile::Main),
    (0x64, BitPattern::new(b"00000000"), Profile::High),
    (0x64, BitPattern::new(b"00001100"), Profile::ConstrainedHigh),
    (0xF4, BitPattern::new(b"00000000"), Profile::PredictiveHigh444),
];

/// Error that caused [`ProfileLevelId`] parsing failure.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseProfileLevelIdError {
    /// Not 6 hexadecimal digits.
    #[error("profile-level-id must be 6 hexadecimal digits")]
    InvalidFormat,
    /// `level_idc` byte is not a known level.
    #[error("Unknown level_idc {0}")]
    UnknownLevel(u8),
    /// `profile_idc` and `profile_iop` bytes match no known profile.
    #[error("Unknown profile_idc {profile_idc:#04x} with profile_iop {profile_iop:#010b}")]
    UnknownProfile {
        /// `profile_idc` byte
        profile_idc: u8,
        /// `profile_iop` byte
        profile_iop: u8,
    },
}

/// Parsed H264 `profile-level-id`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProfileLevelId {
    /// Profile.
    pub profile: Profile,
    /// Level.
    pub level: Level,
}

/// Used when `profile-level-id` is not signaled, per RFC 6184.
impl Default for ProfileLevelId {
    fn default() -> Self {
        Self {
            profile: Profile::ConstrainedBaseline,
            level: Level::Level3_1,
        }
    }
}

impl FromStr for ProfileLevelId {
    type Err = ParseProfileLevelIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseProfileLevelIdError::InvalidFormat);
        }
        let numeric = u32::from_str_radix(s, 16)
            .map_err(|_| ParseProfileLevelIdError::InvalidFormat)?;
        let [_, profile_idc, profile_iop, level_idc] = numeric.to_be_bytes();

        let level = Level::from_level_idc(level_idc, profile_iop)
            .ok_or(ParseProfileLevelIdError::UnknownLevel(level_idc))?;

        PROFILE_PATTERNS
            .iter()
            .find(|(pattern_profile_idc, pattern, _)| {
                *pattern_profile_idc == profile_idc && pattern.is_match(profile_iop)
            })
            .map(|(_, _, profile)| Self {
                profile: *profile,
                level,
            })
            .ok_or(ParseProfileLevelIdError::UnknownProfile {
                profile_idc,
                profile_iop,
            })
    }
}

impl ProfileLevelId {
    /// Canonical 6 hexadecimal digits form.
    ///
    /// Returns `None` for level 1b of profiles that cannot express it.
    #[must_use]
    pub fn to_profile_level_id_string(self) -> Option<String> {
        if self.level == Level::Level1B {
            return match self.profile {
                Profile::ConstrainedBaseline => Some("42f00b".to_string()),
                Profile::Baseline => Some("42100b".to_string()),
                Profile::Main => Some("4d100b".to_string()),
                _ => None,
            };
        }

        let profile_idc_iop = match self.profile {
            Profile::ConstrainedBaseline => "42e0",
            Profile::Baseline => "4200",
            Profile::Main => "4d00",
            Profile::ConstrainedHigh => "640c",
            Profile::High => "6400",
            Profile::PredictiveHigh444 => "f400",
        };

        Some(format!("{}{:02x}", profile_idc_iop, self.level as u8))
    }
}

/// Error produced while negotiating `profile-level-id` for an answer.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum H264ProfileLevelIdError {
    /// Local `profile-level-id` is invalid.
    #[error("Invalid local profile-level-id")]
    InvalidLocalProfileLevelId,
    /// Remote `profile-level-id` is invalid.
    #[error("Invalid remote profile-level-id")]
    InvalidRemoteProfileLevelId,
    /// Local and remote profiles differ.
    #[error("H264 profile mismatch")]
    ProfileMismatch,
}

fn profile_level_id_value(
    parameters: &RtpCodecParametersParameters,
) -> Option<&RtpCodecParametersParametersValue> {
    parameters
        .get("profile-level-id")
        .filter(|value| match value {
            RtpCodecParametersParametersValue::String(s) => !s.is_empty(),
            RtpCodecParametersParametersValue::Number(n) => *n != 0,
        })
}

/// Parse `profile-level-id` out of codec parameters, defaulting when absent.
///
/// Returns `None` when present but invalid.
#[must_use]
pub fn parse_sdp_profile_level_id(
    parameters: &RtpCodecParametersParameters,
) -> Option<ProfileLevelId> {
    match profile_level_id_value(parameters) {
        None => Some(ProfileLevelId::default()),
        Some(RtpCodecParametersParametersValue::String(s)) => s.parse().ok(),
        Some(RtpCodecParametersParametersValue::Number(_)) => None,
    }
}

/// Whether both sets of codec parameters use the same (valid) H264 profile.
#[must_use]
pub fn is_same_profile(
    parameters_a: &RtpCodecParametersParameters,
    parameters_b: &RtpCodecParametersParameters,
) -> bool {
    match (
        parse_sdp_profile_level_id(parameters_a),
        parse_sdp_profile_level_id(parameters_b),
    ) {
        (Some(a), Some(b)) => a.profile == b.profile,
        _ => false,
    }
}

fn is_level_asymmetry_allowed(parameters: &RtpCodecParametersParameters) -> bool {
    match parameters.get("level-asymmetry-allowed") {
        Some(RtpCodecParametersParametersValue::Number(n)) => *n == 1,
        Some(RtpCodecParametersParametersValue::String(s)) => s == "1",
        None => false,
    }
}

/// Generate `profile-level-id` to answer an offer with.
///
/// Returns `Ok(None)` if neither side signals a `profile-level-id` (and the answer should not
/// carry one either).
pub fn generate_profile_level_id_for_answer(
    local_supported_parameters: &RtpCodecParametersParameters,
    remote_offered_parameters: &RtpCodecParametersParameters,
) -> Result<Option<String>, H264ProfileLevelIdError> {
    if profile_level_id_value(local_supported_parameters).is_none()
        && profile_level_id_value(remote_offered_parameters).is_none()
    {
        return Ok(None);
    }

    let local_profile_level_id = parse_sdp_profile_level_id(local_supported_parameters)
        .ok_or(H264ProfileLevelIdError::InvalidLocalProfileLevelId)?;
    let remote_profile_level_id = parse_sdp_profile_level_id(remote_offered_parameters)
        .ok_or(H264ProfileLevelIdError::InvalidRemoteProfileLevelId)?;

    if local_profile_level_id.profile != remote_profile_level_id.profile {
        return Err(H264ProfileLevelIdError::ProfileMismatch);
    }

    let level_asymmetry_allowed = is_level_asymmetry_allowed(local_supported_parameters)
        && is_level_asymmetry_allowed(remote_offered_parameters);

    let level = if level_asymmetry_allowed {
        local_profile_level_id.level
    } else {
        local_profile_level_id
            .level
            .min(remote_profile_level_id.level)
    };

    Ok(ProfileLevelId {
        profile: local_profile_level_id.profile,
        level,
    }
    .to_profile_level_id_string())
}
