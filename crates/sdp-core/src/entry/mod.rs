//! Media sections (`m=` blocks) of a session description
//!
//! Every section shares an [`EntryCore`] (media type, protocol, mid,
//! direction and the opaque attribute lines) and implements
//! [`SdpSection`] for its own parsing and generation. A description stores
//! its sections as the closed variant [`Entry`]; audio and video are
//! construction presets of [`Media`], not separate runtime types.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::attributes::common::{attribute_body, parse_pair};
use crate::config::{DEFAULT_EOL, DISCARD_PORT};
use crate::error::{Error, Result};
use crate::types::Direction;

pub mod application;
mod codecs;
pub mod media;
pub mod rtp_map;

pub use application::Application;
pub use media::{Media, Ssrc};
pub use rtp_map::RtpMap;

/// Tokens of an `m=` line: `<type> <port> <proto> <fmt>*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MLine<'a> {
    pub kind: &'a str,
    pub protocol: &'a str,
    pub formats: Vec<&'a str>,
}

impl<'a> MLine<'a> {
    /// Parses the m-line body (without the `m=` prefix).
    pub(crate) fn parse(mline: &'a str) -> Result<Self> {
        let mut tokens = mline.split_whitespace();
        let kind = tokens
            .next()
            .ok_or_else(|| Error::MalformedLine(format!("m= line without media type: m={}", mline)))?;
        let port = tokens
            .next()
            .ok_or_else(|| Error::MalformedLine(format!("m= line without port: m={}", mline)))?;
        // Port may carry a `/<number of ports>` suffix; its value is not kept.
        let port_number = port.split('/').next().unwrap_or(port);
        if port_number.parse::<u16>().is_err() {
            return Err(Error::MalformedLine(format!("Invalid port in m= line: m={}", mline)));
        }
        let protocol = tokens
            .next()
            .ok_or_else(|| Error::MalformedLine(format!("m= line without protocol: m={}", mline)))?;
        Ok(Self {
            kind,
            protocol,
            formats: tokens.collect(),
        })
    }
}

/// Fields shared by every media section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCore {
    kind: String,
    protocol: String,
    mid: String,
    direction: Direction,
    attributes: Vec<String>,
}

impl EntryCore {
    pub(crate) fn new(
        kind: impl Into<String>,
        protocol: impl Into<String>,
        mid: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            kind: kind.into(),
            protocol: protocol.into(),
            mid: mid.into(),
            direction,
            attributes: Vec::new(),
        }
    }

    /// Media type token (`application`, `audio`, `video`, ...)
    pub fn media_type(&self) -> &str {
        &self.kind
    }

    /// Transport protocol token of the m-line (e.g. `UDP/TLS/RTP/SAVPF`)
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Media identifier
    pub fn mid(&self) -> &str {
        &self.mid
    }

    /// Negotiated direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sets the negotiated direction.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Opaque attribute bodies (without `a=`), in input order
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Appends an opaque attribute, given with or without the `a=` prefix.
    pub fn add_attribute(&mut self, attribute: impl Into<String>) {
        let attribute = attribute.into();
        match attribute.strip_prefix("a=") {
            Some(body) => self.attributes.push(body.to_string()),
            None => self.attributes.push(attribute),
        }
    }

    /// Removes every opaque attribute whose key equals `key`.
    pub fn remove_attribute(&mut self, key: &str) {
        self.attributes.retain(|attr| parse_pair(attr).0 != key);
    }

    /// Handles the lines every section understands: `a=mid` and the direction
    /// tokens. Other attribute lines are kept verbatim; non-attribute lines are
    /// dropped.
    pub(crate) fn parse_sdp_line(&mut self, line: &str) -> Result<()> {
        let Some(attr) = attribute_body(line) else {
            trace!(mid = %self.mid, "ignoring section line: {}", line);
            return Ok(());
        };
        let (key, value) = parse_pair(attr);
        match key {
            "mid" => {
                let mid = value.trim();
                if mid.is_empty() {
                    return Err(Error::MalformedLine(format!("Empty mid: {}", line)));
                }
                self.mid = mid.to_string();
            }
            "sendonly" | "recvonly" | "sendrecv" | "inactive" if value.is_empty() => {
                self.direction = key.parse()?;
            }
            _ => self.attributes.push(attr.to_string()),
        }
        Ok(())
    }
}

/// Parsing and generation contract of one media section
pub trait SdpSection {
    /// Shared section fields
    fn core(&self) -> &EntryCore;

    /// Shared section fields, mutably
    fn core_mut(&mut self) -> &mut EntryCore;

    /// The m-line after the port: protocol and format list
    fn description(&self) -> String;

    /// Consumes one line of this section; unknown attributes are kept verbatim.
    fn parse_sdp_line(&mut self, line: &str) -> Result<()>;

    /// Section-specific attribute lines
    fn generate_sdp_lines(&self, eol: &str, out: &mut String);

    /// Section-specific `b=` lines, which precede the attributes
    fn generate_bandwidth_lines(&self, _eol: &str, _out: &mut String) {}

    /// Media type token
    fn media_type(&self) -> &str {
        self.core().media_type()
    }

    /// Media identifier
    fn mid(&self) -> &str {
        self.core().mid()
    }

    /// Negotiated direction
    fn direction(&self) -> Direction {
        self.core().direction()
    }

    /// Sets the negotiated direction; setting the same value again changes nothing.
    fn set_direction(&mut self, direction: Direction) {
        self.core_mut().set_direction(direction);
    }

    /// Generates the section with the given connection address (`IP4 x.x.x.x`) and port.
    fn generate_sdp(&self, eol: &str, addr: &str, port: &str) -> String {
        let core = self.core();
        let mut sdp = String::new();
        sdp.push_str(&format!("m={} {} {}{}", core.media_type(), port, self.description(), eol));
        sdp.push_str(&format!("c=IN {}{}", addr, eol));
        self.generate_bandwidth_lines(eol, &mut sdp);
        sdp.push_str(&format!("a=mid:{}{}", core.mid(), eol));
        if let Some(direction) = core.direction().as_attribute() {
            sdp.push_str(&format!("a={}{}", direction, eol));
        }
        self.generate_sdp_lines(eol, &mut sdp);
        for attr in core.attributes() {
            sdp.push_str(&format!("a={}{}", attr, eol));
        }
        sdp
    }
}

/// A media section of a description: either the data channel section or an
/// audio/video section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    /// Data channel section (`m=application`)
    Application(Application),
    /// RTP media section
    Media(Media),
}

impl Entry {
    /// Creates a section from an m-line body; `application` selects the data
    /// channel section, any other media type an RTP media section.
    pub fn create(mline: &str, mid: impl Into<String>, direction: Direction) -> Result<Self> {
        let parsed = MLine::parse(mline)?;
        let mid = mid.into();
        Ok(if parsed.kind == "application" {
            Entry::Application(Application::from_mline(&parsed, mid, direction))
        } else {
            Entry::Media(Media::from_mline(&parsed, mid, direction))
        })
    }

    /// Whether this is the data channel section
    pub fn is_application(&self) -> bool {
        matches!(self, Entry::Application(_))
    }

    /// The data channel section, if this is one
    pub fn as_application(&self) -> Option<&Application> {
        match self {
            Entry::Application(app) => Some(app),
            Entry::Media(_) => None,
        }
    }

    /// The data channel section, mutably
    pub fn as_application_mut(&mut self) -> Option<&mut Application> {
        match self {
            Entry::Application(app) => Some(app),
            Entry::Media(_) => None,
        }
    }

    /// The RTP media section, if this is one
    pub fn as_media(&self) -> Option<&Media> {
        match self {
            Entry::Media(media) => Some(media),
            Entry::Application(_) => None,
        }
    }

    /// The RTP media section, mutably
    pub fn as_media_mut(&mut self) -> Option<&mut Media> {
        match self {
            Entry::Media(media) => Some(media),
            Entry::Application(_) => None,
        }
    }

    /// Derives the answer-side section.
    pub fn reciprocate(&self) -> Entry {
        match self {
            Entry::Application(app) => Entry::Application(app.reciprocate()),
            Entry::Media(media) => Entry::Media(media.reciprocate()),
        }
    }

    fn section(&self) -> &dyn SdpSection {
        match self {
            Entry::Application(app) => app,
            Entry::Media(media) => media,
        }
    }

    fn section_mut(&mut self) -> &mut dyn SdpSection {
        match self {
            Entry::Application(app) => app,
            Entry::Media(media) => media,
        }
    }
}

impl SdpSection for Entry {
    fn core(&self) -> &EntryCore {
        self.section().core()
    }

    fn core_mut(&mut self) -> &mut EntryCore {
        self.section_mut().core_mut()
    }

    fn description(&self) -> String {
        self.section().description()
    }

    fn parse_sdp_line(&mut self, line: &str) -> Result<()> {
        self.section_mut().parse_sdp_line(line)
    }

    fn generate_sdp_lines(&self, eol: &str, out: &mut String) {
        self.section().generate_sdp_lines(eol, out)
    }

    fn generate_bandwidth_lines(&self, eol: &str, out: &mut String) {
        self.section().generate_bandwidth_lines(eol, out)
    }
}

impl From<Application> for Entry {
    fn from(app: Application) -> Self {
        Entry::Application(app)
    }
}

impl From<Media> for Entry {
    fn from(media: Media) -> Self {
        Entry::Media(media)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.generate_sdp(DEFAULT_EOL, "IP4 0.0.0.0", &DISCARD_PORT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mline_parse() {
        let mline = MLine::parse("video 9 UDP/TLS/RTP/SAVPF 96 97").unwrap();
        assert_eq!(mline.kind, "video");
        assert_eq!(mline.protocol, "UDP/TLS/RTP/SAVPF");
        assert_eq!(mline.formats, vec!["96", "97"]);

        assert!(MLine::parse("").is_err());
        assert!(MLine::parse("audio").is_err());
        assert!(MLine::parse("audio 9").is_err());
        assert!(MLine::parse("audio nine RTP/AVP 0").is_err());
        assert!(MLine::parse("audio 49170/2 RTP/AVP 0").is_ok());
    }

    #[test]
    fn test_create_selects_variant() {
        let app = Entry::create("application 9 UDP/DTLS/SCTP webrtc-datachannel", "0", Direction::Unknown)
            .unwrap();
        assert!(app.is_application());
        assert_eq!(app.mid(), "0");

        let media = Entry::create("audio 9 UDP/TLS/RTP/SAVPF 111", "1", Direction::Unknown).unwrap();
        assert!(media.as_media().is_some());
        assert_eq!(media.media_type(), "audio");
        assert_eq!(media.direction(), Direction::Unknown);
    }

    #[test]
    fn test_core_parse_lines() {
        let mut core = EntryCore::new("audio", "RTP/AVP", "0", Direction::Unknown);
        core.parse_sdp_line("a=mid:audio1").unwrap();
        core.parse_sdp_line("a=recvonly").unwrap();
        core.parse_sdp_line("a=extmap:1 urn:ietf:params:rtp-hdrext:sdes:mid").unwrap();
        core.parse_sdp_line("i=ignored").unwrap();

        assert_eq!(core.mid(), "audio1");
        assert_eq!(core.direction(), Direction::RecvOnly);
        assert_eq!(core.attributes(), &["extmap:1 urn:ietf:params:rtp-hdrext:sdes:mid".to_string()]);

        assert!(core.parse_sdp_line("a=mid:").is_err());
    }

    #[test]
    fn test_set_direction_idempotent() {
        let mut entry: Entry = Media::video("video", Direction::SendOnly).into();
        entry.set_direction(Direction::SendRecv);
        let once = entry.clone();
        entry.set_direction(Direction::SendRecv);
        assert_eq!(entry, once);
    }

    #[test]
    fn test_attribute_helpers() {
        let mut core = EntryCore::new("video", "RTP/AVP", "v", Direction::SendOnly);
        core.add_attribute("a=x-google-flag:conference");
        core.add_attribute("extmap-allow-mixed");
        assert_eq!(core.attributes().len(), 2);
        assert_eq!(core.attributes()[0], "x-google-flag:conference");
        core.remove_attribute("x-google-flag");
        assert_eq!(core.attributes(), &["extmap-allow-mixed".to_string()]);
    }
}
