//! Audio and video presets for [`Media`] and their codec helpers

use crate::entry::media::Media;
use crate::entry::rtp_map::RtpMap;
use crate::entry::MLine;
use crate::error::Result;
use crate::types::Direction;

/// Secure RTP profile with feedback used by audio and video presets
pub const RTP_PROTOCOL: &str = "UDP/TLS/RTP/SAVPF";

const OPUS_FMTP: &str = "minptime=10;useinbandfec=1";
const H264_FMTP: &str = "profile-level-id=42e01f;packetization-mode=1;level-asymmetry-allowed=1";

impl Media {
    /// Creates an `m=audio` section with no codecs.
    pub fn audio(mid: impl Into<String>, direction: Direction) -> Media {
        Self::preset("audio", mid.into(), direction)
    }

    /// Creates an `m=video` section with no codecs.
    pub fn video(mid: impl Into<String>, direction: Direction) -> Media {
        Self::preset("video", mid.into(), direction)
    }

    fn preset(kind: &str, mid: String, direction: Direction) -> Media {
        let mline = MLine {
            kind,
            protocol: RTP_PROTOCOL,
            formats: Vec::new(),
        };
        Media::from_mline(&mline, mid, direction)
    }

    /// Adds `<codec>/48000/2` with the in-band FEC parameters.
    pub fn add_audio_codec(&mut self, pt: u8, codec: &str) -> Result<()> {
        let mut map = RtpMap::new(pt, codec, 48000).with_enc_params("2");
        map.add_parameter(OPUS_FMTP);
        self.add_rtp_map(map)
    }

    /// Adds Opus on the given payload type.
    pub fn add_opus_codec(&mut self, pt: u8) -> Result<()> {
        self.add_audio_codec(pt, "opus")
    }

    /// Adds `<codec>/90000` with NACK, PLI and REMB feedback.
    ///
    /// H264 additionally gets a constrained baseline profile.
    pub fn add_video_codec(&mut self, pt: u8, codec: &str) -> Result<()> {
        let mut map = RtpMap::new(pt, codec, 90000);
        map.add_feedback("nack");
        map.add_feedback("nack pli");
        map.add_feedback("goog-remb");
        if codec.eq_ignore_ascii_case("H264") {
            map.add_parameter(H264_FMTP);
        }
        self.add_rtp_map(map)
    }

    /// Adds H264 on the given payload type.
    pub fn add_h264_codec(&mut self, pt: u8) -> Result<()> {
        self.add_video_codec(pt, "H264")
    }

    /// Adds VP8 on the given payload type.
    pub fn add_vp8_codec(&mut self, pt: u8) -> Result<()> {
        self.add_video_codec(pt, "VP8")
    }

    /// Adds VP9 on the given payload type.
    pub fn add_vp9_codec(&mut self, pt: u8) -> Result<()> {
        self.add_video_codec(pt, "VP9")
    }
}
