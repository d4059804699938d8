//! RTP media section (`m=audio`, `m=video`, or any other non-application type)
//!
//! Holds the payload types of the section in m-line order, each with its
//! rtpmap/rtcp-fb/fmtp lines, the SSRCs announced by the sender and the
//! optional `b=AS` bitrate.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::attributes::common::{attribute_body, parse_pair, parse_unsigned};
use crate::attributes::rtpmap::{parse_pt_prefixed, parse_rtpmap};
use crate::attributes::ssrc::parse_ssrc;
use crate::entry::rtp_map::RtpMap;
use crate::entry::{EntryCore, MLine, SdpSection};
use crate::error::{Error, Result};
use crate::types::Direction;

/// One synchronization source announced with `a=ssrc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssrc {
    /// SSRC identifier
    pub id: u32,
    /// Canonical name (`cname:` source attribute)
    pub cname: Option<String>,
    /// Other source attributes (`msid:...`, `label:...`) in input order
    pub attributes: Vec<String>,
}

impl Ssrc {
    fn new(id: u32) -> Self {
        Self {
            id,
            cname: None,
            attributes: Vec::new(),
        }
    }
}

/// RTP media section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    core: EntryCore,
    bitrate: Option<u32>,
    rtp_maps: Vec<RtpMap>,
    ssrcs: Vec<Ssrc>,
}

impl Media {
    /// Creates a media section from an m-line body, e.g. `video 9 UDP/TLS/RTP/SAVPF`.
    ///
    /// Payload types listed on the m-line become undefined RTP maps until
    /// codecs are added for them.
    pub fn new(mline: &str, mid: impl Into<String>, direction: Direction) -> Result<Self> {
        let parsed = MLine::parse(mline)?;
        Ok(Self::from_mline(&parsed, mid.into(), direction))
    }

    pub(crate) fn from_mline(mline: &MLine<'_>, mid: String, direction: Direction) -> Self {
        let mut media = Self {
            core: EntryCore::new(mline.kind, mline.protocol, mid, direction),
            bitrate: None,
            rtp_maps: Vec::new(),
            ssrcs: Vec::new(),
        };
        for fmt in &mline.formats {
            match fmt.parse::<u8>() {
                Ok(pt) if pt <= 127 => {
                    media.format_mut(pt);
                }
                _ => trace!(mid = %media.core.mid(), "ignoring non-RTP format {}", fmt),
            }
        }
        media
    }

    /// Parses one standalone media section, starting with its `m=` line.
    ///
    /// The section must carry an `a=mid` line.
    pub fn from_sdp(sdp: &str) -> Result<Self> {
        let mut lines = sdp
            .split('\n')
            .map(|line| line.trim_end_matches('\r').trim())
            .filter(|line| !line.is_empty());

        let first = lines
            .next()
            .ok_or_else(|| Error::MalformedLine("Empty media section".to_string()))?;
        let mline = first
            .strip_prefix("m=")
            .ok_or_else(|| Error::MalformedLine(format!("Media section must start with m=: {}", first)))?;

        let mut media = Media::new(mline, String::new(), Direction::Unknown)?;
        for line in lines {
            media.parse_sdp_line(line)?;
        }
        if media.core.mid().is_empty() {
            return Err(Error::MalformedLine(format!("Media section without mid: m={}", mline)));
        }
        debug!(
            mid = %media.core.mid(),
            formats = media.rtp_maps.len(),
            ssrcs = media.ssrcs.len(),
            "parsed media section"
        );
        Ok(media)
    }

    /// Bandwidth limit in kbit/s (`b=AS`)
    pub fn bitrate(&self) -> Option<u32> {
        self.bitrate
    }

    /// Sets the bandwidth limit in kbit/s.
    pub fn set_bitrate(&mut self, bitrate: u32) {
        self.bitrate = Some(bitrate);
    }

    /// RTP maps in preference order
    pub fn rtp_maps(&self) -> &[RtpMap] {
        &self.rtp_maps
    }

    /// Payload types in preference order
    pub fn payload_types(&self) -> Vec<u8> {
        self.rtp_maps.iter().map(|map| map.pt).collect()
    }

    /// Whether the payload type is listed in this section
    pub fn has_payload_type(&self, pt: u8) -> bool {
        self.rtp_maps.iter().any(|map| map.pt == pt)
    }

    /// RTP map for the payload type
    pub fn rtp_map(&self, pt: u8) -> Option<&RtpMap> {
        self.rtp_maps.iter().find(|map| map.pt == pt)
    }

    /// RTP map for the payload type, mutably
    pub fn rtp_map_mut(&mut self, pt: u8) -> Option<&mut RtpMap> {
        self.rtp_maps.iter_mut().find(|map| map.pt == pt)
    }

    /// First RTP map whose encoding name matches, ignoring case
    pub fn rtp_map_by_format(&self, format: &str) -> Option<&RtpMap> {
        self.rtp_maps
            .iter()
            .find(|map| map.format.eq_ignore_ascii_case(format))
    }

    /// RTP map for the payload type, or `PayloadTypeNotFound`
    pub fn format(&self, pt: u8) -> Result<&RtpMap> {
        self.rtp_map(pt).ok_or(Error::PayloadTypeNotFound(pt))
    }

    /// Locates the RTP map for `pt`, appending an undefined one if missing.
    pub(crate) fn format_mut(&mut self, pt: u8) -> &mut RtpMap {
        let index = match self.rtp_maps.iter().position(|map| map.pt == pt) {
            Some(index) => index,
            None => {
                self.rtp_maps.push(RtpMap::placeholder(pt));
                self.rtp_maps.len() - 1
            }
        };
        &mut self.rtp_maps[index]
    }

    /// Adds an RTP map; an existing map with the same payload type is replaced in place.
    ///
    /// Payload types above 127 are rejected with `InvalidPayloadType`.
    pub fn add_rtp_map(&mut self, map: RtpMap) -> Result<()> {
        if map.pt > 127 {
            return Err(Error::InvalidPayloadType(map.pt));
        }
        match self.rtp_map_mut(map.pt) {
            Some(existing) => *existing = map,
            None => self.rtp_maps.push(map),
        }
        Ok(())
    }

    /// Removes every RTP map with the given encoding name (ignoring case),
    /// along with retransmission formats whose `apt=` points at a removed one.
    pub fn remove_format(&mut self, format: &str) -> Result<()> {
        let removed: Vec<u8> = self
            .rtp_maps
            .iter()
            .filter(|map| map.format.eq_ignore_ascii_case(format))
            .map(|map| map.pt)
            .collect();
        if removed.is_empty() {
            return Err(Error::FormatNotFound(format.to_string()));
        }
        self.rtp_maps.retain(|map| {
            !removed.contains(&map.pt)
                && !map
                    .associated_payload_type()
                    .is_some_and(|apt| removed.contains(&apt))
        });
        debug!(mid = %self.core.mid(), format, ?removed, "removed format");
        Ok(())
    }

    /// Announces an SSRC; an existing SSRC keeps its entry and takes the new name if one is given.
    pub fn add_ssrc(&mut self, ssrc: u32, name: Option<&str>) {
        let entry = match self.ssrcs.iter().position(|s| s.id == ssrc) {
            Some(index) => &mut self.ssrcs[index],
            None => {
                self.ssrcs.push(Ssrc::new(ssrc));
                let last = self.ssrcs.len() - 1;
                &mut self.ssrcs[last]
            }
        };
        if let Some(name) = name {
            entry.cname = Some(name.to_string());
        }
    }

    /// Replaces `old` with `ssrc`, keeping its cname unless a new name is given.
    pub fn replace_ssrc(&mut self, old: u32, ssrc: u32, name: Option<&str>) -> Result<()> {
        let index = self
            .ssrcs
            .iter()
            .position(|s| s.id == old)
            .ok_or(Error::SsrcNotFound(old))?;
        if old != ssrc {
            // Drop a separate entry already using the new id so SSRCs stay unique.
            if let Some(dup) = self.ssrcs.iter().position(|s| s.id == ssrc) {
                self.ssrcs.remove(dup);
                let index = if dup < index { index - 1 } else { index };
                self.rename_ssrc(index, ssrc, name);
                return Ok(());
            }
        }
        self.rename_ssrc(index, ssrc, name);
        Ok(())
    }

    fn rename_ssrc(&mut self, index: usize, ssrc: u32, name: Option<&str>) {
        let entry = &mut self.ssrcs[index];
        entry.id = ssrc;
        if let Some(name) = name {
            entry.cname = Some(name.to_string());
        }
    }

    /// Whether the SSRC is announced in this section
    pub fn has_ssrc(&self, ssrc: u32) -> bool {
        self.ssrcs.iter().any(|s| s.id == ssrc)
    }

    /// SSRCs in announcement order
    pub fn ssrcs(&self) -> Vec<u32> {
        self.ssrcs.iter().map(|s| s.id).collect()
    }

    /// Canonical name of an SSRC
    pub fn ssrc_name(&self, ssrc: u32) -> Option<&str> {
        self.ssrcs
            .iter()
            .find(|s| s.id == ssrc)
            .and_then(|s| s.cname.as_deref())
    }

    /// Full SSRC entries, including their source attributes
    pub fn ssrc_entries(&self) -> &[Ssrc] {
        &self.ssrcs
    }

    /// Answer-side copy: same mid and RTP maps, direction reversed, no SSRCs.
    pub fn reciprocate(&self) -> Media {
        let mut reciprocated = self.clone();
        reciprocated
            .core
            .set_direction(self.core.direction().reverse());
        reciprocated.ssrcs.clear();
        reciprocated
    }

    fn parse_attribute(&mut self, key: &str, value: &str) -> Result<bool> {
        match key {
            "rtpmap" => {
                let parsed = parse_rtpmap(value)?;
                self.format_mut(parsed.payload_type).set_mline(parsed);
            }
            "rtcp-fb" => match parse_pt_prefixed(value)? {
                Some((pt, feedback)) => self.format_mut(pt).add_feedback(feedback),
                None => return Ok(false),
            },
            "fmtp" => match parse_pt_prefixed(value)? {
                Some((pt, parameter)) => self.format_mut(pt).add_parameter(parameter),
                None => return Ok(false),
            },
            // Always generated
            "rtcp-mux" => {}
            "ssrc" => {
                let parsed = parse_ssrc(value)?;
                match (parsed.attribute, parsed.value) {
                    (Some(attr), Some(cname)) if attr == "cname" => {
                        self.add_ssrc(parsed.ssrc, Some(&cname));
                    }
                    (Some(attr), value) => {
                        self.add_ssrc(parsed.ssrc, None);
                        let attribute = match value {
                            Some(value) => format!("{}:{}", attr, value),
                            None => attr,
                        };
                        if let Some(entry) = self.ssrcs.iter_mut().find(|s| s.id == parsed.ssrc) {
                            entry.attributes.push(attribute);
                        }
                    }
                    (None, _) => self.add_ssrc(parsed.ssrc, None),
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl SdpSection for Media {
    fn core(&self) -> &EntryCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntryCore {
        &mut self.core
    }

    fn description(&self) -> String {
        let mut desc = self.core.protocol().to_string();
        for map in &self.rtp_maps {
            desc.push(' ');
            desc.push_str(&map.pt.to_string());
        }
        desc
    }

    fn parse_sdp_line(&mut self, line: &str) -> Result<()> {
        if let Some(bandwidth) = line.strip_prefix("b=") {
            let (kind, value) = parse_pair(bandwidth);
            if kind == "AS" {
                let kbps = parse_unsigned(value, "bandwidth")?;
                let kbps = u32::try_from(kbps)
                    .map_err(|_| Error::MalformedLine(format!("Bandwidth out of range: {}", line)))?;
                self.bitrate = Some(kbps);
            } else {
                trace!(mid = %self.core.mid(), "ignoring bandwidth line: {}", line);
            }
            return Ok(());
        }
        if let Some(attr) = attribute_body(line) {
            let (key, value) = parse_pair(attr);
            if self.parse_attribute(key, value)? {
                return Ok(());
            }
        }
        self.core.parse_sdp_line(line)
    }

    fn generate_bandwidth_lines(&self, eol: &str, out: &mut String) {
        if let Some(bitrate) = self.bitrate {
            out.push_str(&format!("b=AS:{}{}", bitrate, eol));
        }
    }

    fn generate_sdp_lines(&self, eol: &str, out: &mut String) {
        out.push_str(&format!("a=rtcp-mux{}", eol));
        for map in &self.rtp_maps {
            map.write_lines(eol, out);
        }
        for ssrc in &self.ssrcs {
            if let Some(cname) = &ssrc.cname {
                out.push_str(&format!("a=ssrc:{} cname:{}{}", ssrc.id, cname, eol));
            } else if ssrc.attributes.is_empty() {
                out.push_str(&format!("a=ssrc:{}{}", ssrc.id, eol));
            }
            for attr in &ssrc.attributes {
                out.push_str(&format!("a=ssrc:{} {}{}", ssrc.id, attr, eol));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_SECTION: &str = "m=video 9 UDP/TLS/RTP/SAVPF 96 97 98\r\n\
        c=IN IP4 0.0.0.0\r\n\
        b=AS:2000\r\n\
        a=mid:video\r\n\
        a=recvonly\r\n\
        a=rtcp-mux\r\n\
        a=rtpmap:96 VP8/90000\r\n\
        a=rtcp-fb:96 nack\r\n\
        a=rtcp-fb:96 nack pli\r\n\
        a=rtpmap:97 rtx/90000\r\n\
        a=fmtp:97 apt=96\r\n\
        a=rtpmap:98 H264/90000\r\n\
        a=fmtp:98 profile-level-id=42e01f\r\n\
        a=rtcp-fb:* transport-cc\r\n\
        a=ssrc:1234 cname:stream\r\n\
        a=ssrc:1234 msid:s t\r\n\
        a=extmap:3 urn:ietf:params:rtp-hdrext:sdes:mid\r\n";

    #[test]
    fn test_from_sdp() {
        let media = Media::from_sdp(VIDEO_SECTION).unwrap();
        assert_eq!(media.mid(), "video");
        assert_eq!(media.media_type(), "video");
        assert_eq!(media.direction(), Direction::RecvOnly);
        assert_eq!(media.bitrate(), Some(2000));
        assert_eq!(media.payload_types(), vec![96, 97, 98]);

        let vp8 = media.format(96).unwrap();
        assert_eq!(vp8.format, "VP8");
        assert_eq!(vp8.clock_rate, 90000);
        assert_eq!(vp8.rtcp_fbs, vec!["nack".to_string(), "nack pli".to_string()]);
        assert_eq!(media.rtp_map(97).unwrap().associated_payload_type(), Some(96));
        assert_eq!(media.rtp_map_by_format("h264").unwrap().pt, 98);

        assert_eq!(media.ssrcs(), vec![1234]);
        assert_eq!(media.ssrc_name(1234), Some("stream"));
        assert_eq!(media.ssrc_entries()[0].attributes, vec!["msid:s t".to_string()]);

        assert_eq!(
            media.core().attributes(),
            &[
                "rtcp-fb:* transport-cc".to_string(),
                "extmap:3 urn:ietf:params:rtp-hdrext:sdes:mid".to_string()
            ]
        );
    }

    #[test]
    fn test_from_sdp_requires_mid() {
        let err = Media::from_sdp("m=audio 9 RTP/AVP 0\r\na=sendrecv\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedLine(_)));
        assert!(Media::from_sdp("a=mid:0\r\n").is_err());
        assert!(Media::from_sdp("").is_err());
    }

    #[test]
    fn test_section_round_trip() {
        let media = Media::from_sdp(VIDEO_SECTION).unwrap();
        let generated = media.generate_sdp("\r\n", "IP4 0.0.0.0", "9");
        let reparsed = Media::from_sdp(&generated).unwrap();
        assert_eq!(reparsed, media);
    }

    #[test]
    fn test_static_payload_type_kept() {
        let mut media = Media::new("audio 9 RTP/AVP 0 8", "a", Direction::SendRecv).unwrap();
        assert_eq!(media.payload_types(), vec![0, 8]);
        assert!(!media.rtp_map(0).unwrap().is_defined());
        media.parse_sdp_line("a=rtpmap:8 PCMA/8000").unwrap();

        let generated = media.generate_sdp("\n", "IP4 0.0.0.0", "9");
        assert!(generated.starts_with("m=audio 9 RTP/AVP 0 8\n"));
        assert!(!generated.contains("a=rtpmap:0"));
        assert!(generated.contains("a=rtpmap:8 PCMA/8000\n"));
    }

    #[test]
    fn test_format_lookup_miss() {
        let media = Media::new("video 9 UDP/TLS/RTP/SAVPF", "v", Direction::SendOnly).unwrap();
        assert_eq!(media.format(96).unwrap_err(), Error::PayloadTypeNotFound(96));
        assert!(!media.has_payload_type(96));
    }

    #[test]
    fn test_add_rtp_map_replaces_same_pt() {
        let mut media = Media::new("audio 9 UDP/TLS/RTP/SAVPF", "a", Direction::SendOnly).unwrap();
        media.add_rtp_map(RtpMap::new(111, "opus", 48000)).unwrap();
        media.add_rtp_map(RtpMap::new(0, "PCMU", 8000)).unwrap();
        media
            .add_rtp_map(RtpMap::new(111, "opus", 48000).with_enc_params("2"))
            .unwrap();
        assert_eq!(media.payload_types(), vec![111, 0]);
        assert_eq!(media.rtp_map(111).unwrap().enc_params.as_deref(), Some("2"));

        assert_eq!(
            media.add_rtp_map(RtpMap::new(255, "opus", 48000)).unwrap_err(),
            Error::InvalidPayloadType(255)
        );
        assert_eq!(media.payload_types(), vec![111, 0]);
    }

    #[test]
    fn test_remove_format_with_rtx() {
        let mut media = Media::from_sdp(VIDEO_SECTION).unwrap();
        media.remove_format("vp8").unwrap();
        assert_eq!(media.payload_types(), vec![98]);
        assert_eq!(
            media.remove_format("AV1").unwrap_err(),
            Error::FormatNotFound("AV1".to_string())
        );
    }

    #[test]
    fn test_ssrc_bookkeeping() {
        let mut media = Media::new("video 9 UDP/TLS/RTP/SAVPF 96", "v", Direction::SendOnly).unwrap();
        media.add_ssrc(42, Some("video-send"));
        media.add_ssrc(43, None);
        media.add_ssrc(42, None);
        assert_eq!(media.ssrcs(), vec![42, 43]);
        assert_eq!(media.ssrc_name(42), Some("video-send"));

        media.replace_ssrc(42, 4242, None).unwrap();
        assert!(!media.has_ssrc(42));
        assert!(media.has_ssrc(4242));
        assert_eq!(media.ssrc_name(4242), Some("video-send"));

        media.replace_ssrc(43, 4343, Some("renamed")).unwrap();
        assert_eq!(media.ssrc_name(4343), Some("renamed"));

        assert_eq!(media.replace_ssrc(1, 2, None).unwrap_err(), Error::SsrcNotFound(1));

        media.replace_ssrc(4343, 4242, None).unwrap();
        assert_eq!(media.ssrcs(), vec![4242]);
        assert_eq!(media.ssrc_name(4242), Some("renamed"));
    }

    #[test]
    fn test_generate_ssrc_lines() {
        let mut media = Media::new("audio 9 UDP/TLS/RTP/SAVPF", "a", Direction::SendOnly).unwrap();
        media.add_ssrc(1, Some("alice"));
        media.add_ssrc(2, None);
        let mut out = String::new();
        media.generate_sdp_lines("\n", &mut out);
        assert_eq!(out, "a=rtcp-mux\na=ssrc:1 cname:alice\na=ssrc:2\n");
    }

    #[test]
    fn test_bitrate_lines() {
        let mut media = Media::new("video 9 UDP/TLS/RTP/SAVPF", "v", Direction::SendOnly).unwrap();
        assert_eq!(media.bitrate(), None);
        media.parse_sdp_line("b=TIAS:128000").unwrap();
        assert_eq!(media.bitrate(), None);
        media.set_bitrate(3000);
        let generated = media.generate_sdp("\n", "IP4 0.0.0.0", "9");
        assert!(generated.contains("c=IN IP4 0.0.0.0\nb=AS:3000\na=mid:v\n"));
        assert!(media.parse_sdp_line("b=AS:fast").is_err());
    }

    #[test]
    fn test_reciprocate() {
        let media = Media::from_sdp(VIDEO_SECTION).unwrap();
        let answer = media.reciprocate();
        assert_eq!(answer.mid(), "video");
        assert_eq!(answer.direction(), Direction::SendOnly);
        assert_eq!(answer.rtp_maps(), media.rtp_maps());
        assert!(answer.ssrcs().is_empty());

        let mut sendrecv = Media::new("audio 9 RTP/AVP 0", "a", Direction::SendRecv).unwrap();
        assert_eq!(sendrecv.reciprocate().direction(), Direction::SendRecv);
        sendrecv.set_direction(Direction::Inactive);
        assert_eq!(sendrecv.reciprocate().direction(), Direction::Inactive);
    }
}
