//! RTP payload format bound to one payload type of a media section
//!
//! Carries the `a=rtpmap` definition together with the `a=rtcp-fb` and
//! `a=fmtp` lines that reference the same payload type.

use serde::{Deserialize, Serialize};

use crate::attributes::rtpmap::{parse_rtpmap, RtpMapValue};
use crate::error::Result;

/// Codec definition for one payload type
///
/// Format: `a=rtpmap:<payload type> <encoding name>/<clock rate>[/<encoding parameters>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpMap {
    /// RTP payload type (0-127)
    pub pt: u8,
    /// Encoding name (e.g. "opus", "H264"); empty until an rtpmap line is seen
    pub format: String,
    /// Clock rate in Hertz
    pub clock_rate: u32,
    /// Optional encoding parameters (e.g. number of channels)
    pub enc_params: Option<String>,
    /// RTCP feedback mechanisms (`a=rtcp-fb:<pt> <value>`)
    pub rtcp_fbs: Vec<String>,
    /// Format parameters (`a=fmtp:<pt> <value>`)
    pub fmtps: Vec<String>,
}

impl RtpMap {
    /// Creates an RTP map without feedback or format parameters.
    pub fn new(pt: u8, format: impl Into<String>, clock_rate: u32) -> Self {
        Self {
            pt,
            format: format.into(),
            clock_rate,
            enc_params: None,
            rtcp_fbs: Vec::new(),
            fmtps: Vec::new(),
        }
    }

    /// Sets the encoding parameters (e.g. channel count).
    pub fn with_enc_params(mut self, enc_params: impl Into<String>) -> Self {
        self.enc_params = Some(enc_params.into());
        self
    }

    /// Parses the value of an `a=rtpmap` line, e.g. `111 opus/48000/2`.
    pub fn parse(value: &str) -> Result<Self> {
        let parsed = parse_rtpmap(value)?;
        let mut map = Self::placeholder(parsed.payload_type);
        map.set_mline(parsed);
        Ok(map)
    }

    /// Payload type referenced before (or without) an rtpmap line.
    pub(crate) fn placeholder(pt: u8) -> Self {
        Self::new(pt, String::new(), 0)
    }

    /// Applies an rtpmap line to this payload type, keeping feedback and parameters.
    pub(crate) fn set_mline(&mut self, value: RtpMapValue) {
        self.pt = value.payload_type;
        self.format = value.encoding_name;
        self.clock_rate = value.clock_rate;
        self.enc_params = value.encoding_params;
    }

    /// Whether an rtpmap line defines this payload type
    pub fn is_defined(&self) -> bool {
        !self.format.is_empty()
    }

    /// Appends a feedback mechanism (e.g. `nack pli`).
    pub fn add_feedback(&mut self, feedback: impl Into<String>) {
        self.rtcp_fbs.push(feedback.into());
    }

    /// Removes every feedback mechanism containing `feedback`.
    pub fn remove_feedback(&mut self, feedback: &str) {
        self.rtcp_fbs.retain(|fb| !fb.contains(feedback));
    }

    /// Appends a format parameter string.
    pub fn add_parameter(&mut self, parameter: impl Into<String>) {
        self.fmtps.push(parameter.into());
    }

    /// Payload type this format is associated with (`apt=` in fmtp, RFC 4588)
    pub fn associated_payload_type(&self) -> Option<u8> {
        self.fmtps.iter().find_map(|fmtp| {
            fmtp.split(';')
                .map(str::trim)
                .find_map(|param| param.strip_prefix("apt="))
                .and_then(|apt| apt.trim().parse::<u8>().ok())
        })
    }

    /// Appends the rtpmap, rtcp-fb and fmtp lines for this payload type.
    pub(crate) fn write_lines(&self, eol: &str, out: &mut String) {
        if self.is_defined() {
            out.push_str(&format!("a=rtpmap:{} {}/{}", self.pt, self.format, self.clock_rate));
            if let Some(params) = &self.enc_params {
                out.push_str(&format!("/{}", params));
            }
            out.push_str(eol);
        }
        for fb in &self.rtcp_fbs {
            out.push_str(&format!("a=rtcp-fb:{} {}{}", self.pt, fb, eol));
        }
        for fmtp in &self.fmtps {
            out.push_str(&format!("a=fmtp:{} {}{}", self.pt, fmtp, eol));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rtp_map() {
        let map = RtpMap::parse("111 opus/48000/2").unwrap();
        assert_eq!(map.pt, 111);
        assert_eq!(map.format, "opus");
        assert_eq!(map.clock_rate, 48000);
        assert_eq!(map.enc_params.as_deref(), Some("2"));
        assert!(map.rtcp_fbs.is_empty());
        assert!(map.fmtps.is_empty());

        assert!(RtpMap::parse("opus/48000").is_err());
    }

    #[test]
    fn test_feedback() {
        let mut map = RtpMap::new(96, "VP8", 90000);
        map.add_feedback("nack");
        map.add_feedback("nack pli");
        map.add_feedback("goog-remb");
        map.remove_feedback("nack");
        assert_eq!(map.rtcp_fbs, vec!["goog-remb".to_string()]);
    }

    #[test]
    fn test_associated_payload_type() {
        let mut rtx = RtpMap::new(97, "rtx", 90000);
        assert_eq!(rtx.associated_payload_type(), None);
        rtx.add_parameter("apt=96");
        assert_eq!(rtx.associated_payload_type(), Some(96));

        let mut rtx = RtpMap::new(99, "rtx", 90000);
        rtx.add_parameter("rtx-time=3000; apt=98");
        assert_eq!(rtx.associated_payload_type(), Some(98));
    }

    #[test]
    fn test_write_lines() {
        let mut map = RtpMap::new(111, "opus", 48000).with_enc_params("2");
        map.add_feedback("transport-cc");
        map.add_parameter("minptime=10;useinbandfec=1");

        let mut out = String::new();
        map.write_lines("\r\n", &mut out);
        assert_eq!(
            out,
            "a=rtpmap:111 opus/48000/2\r\n\
             a=rtcp-fb:111 transport-cc\r\n\
             a=fmtp:111 minptime=10;useinbandfec=1\r\n"
        );
    }

    #[test]
    fn test_placeholder_writes_no_rtpmap() {
        let map = RtpMap::placeholder(0);
        let mut out = String::new();
        map.write_lines("\n", &mut out);
        assert!(out.is_empty());
        assert!(!map.is_defined());
    }
}
