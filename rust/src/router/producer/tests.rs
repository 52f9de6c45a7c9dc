use super::*;
use crate::rtp_parameters::{
    MimeTypeAudio, RtpCodecParameters, RtpCodecParametersParameters, RtpEncodingParameters,
};
use std::num::{NonZeroU32, NonZeroU8};

fn video_codec(mime_type: MimeTypeVideo, payload_type: u8) -> RtpCodecParameters {
    RtpCodecParameters::Video {
        mime_type,
        payload_type,
        clock_rate: NonZeroU32::new(90000).unwrap(),
        parameters: RtpCodecParametersParameters::default(),
        rtcp_feedback: vec![],
    }
}

fn rtx_codec(payload_type: u8, apt: u8) -> RtpCodecParameters {
    RtpCodecParameters::Video {
        mime_type: MimeTypeVideo::Rtx,
        payload_type,
        clock_rate: NonZeroU32::new(90000).unwrap(),
        parameters: RtpCodecParametersParameters::from([("apt", apt.into())]),
        rtcp_feedback: vec![],
    }
}

fn encoding(scalability_mode: Option<&str>) -> RtpEncodingParameters {
    RtpEncodingParameters {
        scalability_mode: scalability_mode.map(ToString::to_string),
        ..RtpEncodingParameters::default()
    }
}

fn rtp_parameters(
    codecs: Vec<RtpCodecParameters>,
    encodings: Vec<RtpEncodingParameters>,
) -> RtpParameters {
    RtpParameters {
        codecs,
        encodings,
        ..RtpParameters::default()
    }
}

#[test]
fn producer_type_simple() {
    let audio = rtp_parameters(
        vec![RtpCodecParameters::Audio {
            mime_type: MimeTypeAudio::Opus,
            payload_type: 111,
            clock_rate: NonZeroU32::new(48000).unwrap(),
            channels: NonZeroU8::new(2).unwrap(),
            parameters: RtpCodecParametersParameters::default(),
            rtcp_feedback: vec![],
        }],
        vec![encoding(Some("L1T3"))],
    );
    assert_eq!(ProducerType::from_rtp_parameters(&audio), ProducerType::Simple);

    let vp8 = rtp_parameters(
        vec![video_codec(MimeTypeVideo::Vp8, 96)],
        vec![encoding(None)],
    );
    assert_eq!(ProducerType::from_rtp_parameters(&vp8), ProducerType::Simple);

    let vp8 = rtp_parameters(
        vec![video_codec(MimeTypeVideo::Vp8, 96)],
        vec![encoding(Some("L1T1"))],
    );
    assert_eq!(ProducerType::from_rtp_parameters(&vp8), ProducerType::Simple);

    // Invalid scalability mode is ignored.
    let vp9 = rtp_parameters(
        vec![video_codec(MimeTypeVideo::Vp9, 96)],
        vec![encoding(Some("foo"))],
    );
    assert_eq!(ProducerType::from_rtp_parameters(&vp9), ProducerType::Simple);

    let none = rtp_parameters(vec![video_codec(MimeTypeVideo::Vp8, 96)], vec![]);
    assert_eq!(ProducerType::from_rtp_parameters(&none), ProducerType::Simple);
}

#[test]
fn producer_type_simulcast() {
    let vp8 = rtp_parameters(
        vec![video_codec(MimeTypeVideo::Vp8, 96), rtx_codec(97, 96)],
        vec![encoding(None), encoding(None), encoding(None)],
    );
    assert_eq!(
        ProducerType::from_rtp_parameters(&vp8),
        ProducerType::Simulcast
    );

    // Temporal layers in a single VP8 or H264 stream.
    let vp8 = rtp_parameters(
        vec![video_codec(MimeTypeVideo::Vp8, 96)],
        vec![encoding(Some("L1T3"))],
    );
    assert_eq!(
        ProducerType::from_rtp_parameters(&vp8),
        ProducerType::Simulcast
    );

    let h264 = rtp_parameters(
        vec![video_codec(MimeTypeVideo::H264, 125)],
        vec![encoding(Some("L1T2"))],
    );
    assert_eq!(
        ProducerType::from_rtp_parameters(&h264),
        ProducerType::Simulcast
    );
}

#[test]
fn producer_type_svc() {
    let vp9 = rtp_parameters(
        vec![rtx_codec(97, 96), video_codec(MimeTypeVideo::Vp9, 96)],
        vec![encoding(Some("L3T3_KEY"))],
    );
    assert_eq!(ProducerType::from_rtp_parameters(&vp9), ProducerType::Svc);

    // Encoding codec is selected by payload type.
    let mut mixed = rtp_parameters(
        vec![
            video_codec(MimeTypeVideo::Vp8, 96),
            video_codec(MimeTypeVideo::H264Svc, 98),
        ],
        vec![encoding(Some("L2T1"))],
    );
    assert_eq!(
        ProducerType::from_rtp_parameters(&mixed),
        ProducerType::Simulcast
    );

    mixed.encodings[0].codec_payload_type = Some(98);
    assert_eq!(ProducerType::from_rtp_parameters(&mixed), ProducerType::Svc);
}
