//! RTP capabilities supported by the router.

use crate::rtp_parameters::{
    MediaKind, MimeTypeAudio, MimeTypeVideo, RtcpFeedback, RtpCapabilities, RtpCodecCapability,
    RtpCodecParametersParameters, RtpHeaderExtension, RtpHeaderExtensionDirection,
    RtpHeaderExtensionUri,
};
use std::num::{NonZeroU32, NonZeroU8};

const VIDEO_RTCP_FEEDBACK: [RtcpFeedback; 5] = [
    RtcpFeedback::Nack,
    RtcpFeedback::NackPli,
    RtcpFeedback::CcmFir,
    RtcpFeedback::GoogRemb,
    RtcpFeedback::TransportCc,
];

const fn non_zero_u32(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(n) => n,
        None => panic!("zero clock rate in supported capabilities"),
    }
}

const fn non_zero_u8(n: u8) -> NonZeroU8 {
    match NonZeroU8::new(n) {
        Some(n) => n,
        None => panic!("zero channels in supported capabilities"),
    }
}

fn audio(
    mime_type: MimeTypeAudio,
    preferred_payload_type: Option<u8>,
    clock_rate: u32,
    channels: u8,
    parameters: RtpCodecParametersParameters,
    rtcp_feedback: Vec<RtcpFeedback>,
) -> RtpCodecCapability {
    RtpCodecCapability::Audio {
        mime_type,
        preferred_payload_type,
        clock_rate: non_zero_u32(clock_rate),
        channels: non_zero_u8(channels),
        parameters,
        rtcp_feedback,
    }
}

fn mono(
    mime_type: MimeTypeAudio,
    preferred_payload_type: Option<u8>,
    clock_rate: u32,
) -> RtpCodecCapability {
    audio(
        mime_type,
        preferred_payload_type,
        clock_rate,
        1,
        RtpCodecParametersParameters::default(),
        vec![RtcpFeedback::TransportCc],
    )
}

/// Comfort noise and DTMF events carry no feedback.
fn feedbackless(
    mime_type: MimeTypeAudio,
    preferred_payload_type: Option<u8>,
    clock_rate: u32,
) -> RtpCodecCapability {
    audio(
        mime_type,
        preferred_payload_type,
        clock_rate,
        1,
        RtpCodecParametersParameters::default(),
        vec![],
    )
}

fn multi_channel_opus(
    channels: u8,
    channel_mapping: &'static str,
    num_streams: u8,
    coupled_streams: u8,
) -> RtpCodecCapability {
    audio(
        MimeTypeAudio::MultiChannelOpus,
        None,
        48000,
        channels,
        RtpCodecParametersParameters::from([
            ("channel_mapping", channel_mapping.into()),
            ("num_streams", num_streams.into()),
            ("coupled_streams", coupled_streams.into()),
        ]),
        vec![RtcpFeedback::TransportCc],
    )
}

fn video(mime_type: MimeTypeVideo, parameters: RtpCodecParametersParameters) -> RtpCodecCapability {
    RtpCodecCapability::Video {
        mime_type,
        preferred_payload_type: None,
        clock_rate: non_zero_u32(90000),
        parameters,
        rtcp_feedback: VIDEO_RTCP_FEEDBACK.to_vec(),
    }
}

fn h264(mime_type: MimeTypeVideo, packetization_mode: u32) -> RtpCodecCapability {
    video(
        mime_type,
        RtpCodecParametersParameters::from([
            ("packetization-mode", packetization_mode.into()),
            ("level-asymmetry-allowed", 1_u32.into()),
        ]),
    )
}

fn header_extension(
    kind: MediaKind,
    uri: RtpHeaderExtensionUri,
    preferred_id: u16,
    direction: RtpHeaderExtensionDirection,
) -> RtpHeaderExtension {
    RtpHeaderExtension {
        kind,
        uri,
        preferred_id,
        preferred_encrypt: false,
        direction,
    }
}

/// Codecs, header extensions and FEC mechanisms the router is able to handle.
///
/// Order matters: the first entry matching a requested codec wins.
#[must_use]
pub fn get_supported_rtp_capabilities() -> RtpCapabilities {
    use RtpHeaderExtensionDirection::{RecvOnly, SendRecv};

    RtpCapabilities {
        codecs: vec![
            audio(
                MimeTypeAudio::Opus,
                None,
                48000,
                2,
                RtpCodecParametersParameters::default(),
                vec![RtcpFeedback::TransportCc],
            ),
            multi_channel_opus(4, "0,1,2,3", 2, 2),
            multi_channel_opus(6, "0,4,1,2,3,5", 4, 2),
            multi_channel_opus(8, "0,6,1,2,3,4,5,7", 5, 3),
            mono(MimeTypeAudio::Pcmu, Some(0), 8000),
            mono(MimeTypeAudio::Pcma, Some(8), 8000),
            mono(MimeTypeAudio::Isac, None, 32000),
            mono(MimeTypeAudio::Isac, None, 16000),
            mono(MimeTypeAudio::G722, Some(9), 8000),
            mono(MimeTypeAudio::Ilbc, None, 8000),
            mono(MimeTypeAudio::Silk, None, 24000),
            mono(MimeTypeAudio::Silk, None, 16000),
            mono(MimeTypeAudio::Silk, None, 12000),
            mono(MimeTypeAudio::Silk, None, 8000),
            feedbackless(MimeTypeAudio::Cn, Some(13), 32000),
            feedbackless(MimeTypeAudio::Cn, Some(13), 16000),
            feedbackless(MimeTypeAudio::Cn, Some(13), 8000),
            feedbackless(MimeTypeAudio::TelephoneEvent, None, 48000),
            feedbackless(MimeTypeAudio::TelephoneEvent, None, 32000),
            feedbackless(MimeTypeAudio::TelephoneEvent, None, 16000),
            feedbackless(MimeTypeAudio::TelephoneEvent, None, 8000),
            video(MimeTypeVideo::Vp8, RtpCodecParametersParameters::default()),
            video(MimeTypeVideo::Vp9, RtpCodecParametersParameters::default()),
            h264(MimeTypeVideo::H264, 1),
            h264(MimeTypeVideo::H264, 0),
            h264(MimeTypeVideo::H264Svc, 1),
            h264(MimeTypeVideo::H264Svc, 0),
            video(MimeTypeVideo::H265, RtpCodecParametersParameters::default()),
        ],
        header_extensions: vec![
            header_extension(MediaKind::Audio, RtpHeaderExtensionUri::Mid, 1, SendRecv),
            header_extension(MediaKind::Video, RtpHeaderExtensionUri::Mid, 1, SendRecv),
            header_extension(MediaKind::Video, RtpHeaderExtensionUri::RtpStreamId, 2, RecvOnly),
            header_extension(
                MediaKind::Video,
                RtpHeaderExtensionUri::RepairRtpStreamId,
                3,
                RecvOnly,
            ),
            header_extension(MediaKind::Audio, RtpHeaderExtensionUri::AbsSendTime, 4, SendRecv),
            header_extension(MediaKind::Video, RtpHeaderExtensionUri::AbsSendTime, 4, SendRecv),
            // For audio transport-wide-cc-01 is only enabled when receiving media.
            header_extension(
                MediaKind::Audio,
                RtpHeaderExtensionUri::TransportWideCcDraft01,
                5,
                RecvOnly,
            ),
            header_extension(
                MediaKind::Video,
                RtpHeaderExtensionUri::TransportWideCcDraft01,
                5,
                SendRecv,
            ),
            // NOTE: Remove this once framemarking draft becomes RFC.
            header_extension(
                MediaKind::Video,
                RtpHeaderExtensionUri::FrameMarkingDraft07,
                6,
                SendRecv,
            ),
            header_extension(MediaKind::Video, RtpHeaderExtensionUri::FrameMarking, 7, SendRecv),
            header_extension(MediaKind::Audio, RtpHeaderExtensionUri::AudioLevel, 10, SendRecv),
            header_extension(
                MediaKind::Video,
                RtpHeaderExtensionUri::VideoOrientation,
                11,
                SendRecv,
            ),
            header_extension(MediaKind::Video, RtpHeaderExtensionUri::TimeOffset, 12, SendRecv),
            header_extension(
                MediaKind::Audio,
                RtpHeaderExtensionUri::AbsCaptureTime,
                13,
                SendRecv,
            ),
            header_extension(
                MediaKind::Video,
                RtpHeaderExtensionUri::AbsCaptureTime,
                13,
                SendRecv,
            ),
        ],
        fec_mechanisms: vec![],
    }
}
