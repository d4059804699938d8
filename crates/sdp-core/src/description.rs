//! Session description: parsing, mutation and generation of a complete SDP
//! offer or answer.
//!
//! The description owns its media sections and the ICE candidates. DTLS and
//! ICE attributes (`setup`, `fingerprint`, `ice-ufrag`, `ice-pwd`,
//! `candidate`, `end-of-candidates`) are folded to session scope wherever they
//! appear in the input, and are regenerated once at session level.
//!
//! # Example
//!
//! ```
//! use rvoip_sdp_core::{Description, SdpType};
//!
//! let mut offer = Description::with_config(SdpType::Offer, Default::default());
//! offer.add_application("0").unwrap();
//! offer.application_mut().unwrap().set_sctp_port(5000);
//!
//! let text = offer.to_string();
//! assert!(text.contains("m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n"));
//! assert!(text.contains("a=sctp-port:5000\r\n"));
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::attributes::common::{attribute_body, is_valid_token, parse_pair};
use crate::attributes::dtls::{parse_fingerprint, parse_setup};
use crate::candidate::{Candidate, CandidateType, Family};
use crate::config::{DescriptionConfig, DEFAULT_EOL, DISCARD_PORT};
use crate::entry::{Application, Entry, Media, SdpSection};
use crate::error::{Error, Result};
use crate::types::{Direction, Role, SdpType};

/// The only fingerprint algorithm generated and accepted
pub const FINGERPRINT_ALGORITHM: &str = "sha-256";

/// A complete session description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    sdp_type: SdpType,
    role: Role,
    username: String,
    session_id: String,
    ice_ufrag: Option<String>,
    ice_pwd: Option<String>,
    fingerprint: Option<String>,
    entries: Vec<Entry>,
    candidates: Vec<Candidate>,
    ended: bool,
    config: DescriptionConfig,
}

impl Description {
    /// Creates an empty description with a fresh session id.
    pub fn with_config(sdp_type: SdpType, config: DescriptionConfig) -> Self {
        Self {
            sdp_type,
            role: Role::ActPass,
            username: config.username.clone(),
            session_id: generate_session_id(),
            ice_ufrag: None,
            ice_pwd: None,
            fingerprint: None,
            entries: Vec::new(),
            candidates: Vec::new(),
            ended: false,
            config,
        }
    }

    /// Parses SDP text with no type hint and the `actpass` role.
    pub fn new(sdp: &str) -> Result<Self> {
        Self::parse(sdp, SdpType::Unspec, Role::ActPass)
    }

    /// Parses SDP text of a known type.
    pub fn with_type(sdp: &str, sdp_type: SdpType) -> Result<Self> {
        Self::parse(sdp, sdp_type, Role::ActPass)
    }

    /// Parses SDP text whose type is given as a token (`offer`, `answer`, ...).
    pub fn with_type_string(sdp: &str, sdp_type: &str) -> Result<Self> {
        Self::with_type(sdp, Self::string_to_type(sdp_type))
    }

    /// Parses SDP text with a type and role hint; `a=setup` in the text overrides the role.
    pub fn parse(sdp: &str, sdp_type: SdpType, role: Role) -> Result<Self> {
        Self::parse_with_config(sdp, sdp_type, role, DescriptionConfig::default())
    }

    /// Parses SDP text using the given session defaults.
    pub fn parse_with_config(
        sdp: &str,
        sdp_type: SdpType,
        role: Role,
        config: DescriptionConfig,
    ) -> Result<Self> {
        let mut desc = Self::with_config(SdpType::Unspec, config);
        desc.role = role;

        for line in sdp
            .split('\n')
            .map(|line| line.trim_end_matches('\r').trim())
            .filter(|line| !line.is_empty())
        {
            if let Some(mline) = line.strip_prefix("m=") {
                let index = desc.entries.len();
                let entry = Entry::create(mline, index.to_string(), Direction::Unknown)?;
                trace!(index, media_type = %entry.media_type(), "new media section");
                desc.entries.push(entry);
                continue;
            }

            if let Some(attr) = attribute_body(line) {
                if let Some(candidate) = desc.parse_session_attribute(attr)? {
                    desc.candidates.push(candidate);
                    continue;
                }
                if desc.is_session_attribute(attr) {
                    continue;
                }
            }

            match desc.entries.last_mut() {
                Some(entry) => entry.parse_sdp_line(line)?,
                None => desc.parse_session_line(line)?,
            }
        }

        desc.validate_entries()?;
        desc.rebind_candidates();

        desc.hint_type(sdp_type);

        debug!(
            sdp_type = %desc.sdp_type,
            entries = desc.entries.len(),
            candidates = desc.candidates.len(),
            ended = desc.ended,
            "parsed session description"
        );
        Ok(desc)
    }

    /// Handles the attributes folded to session scope. A parsed candidate is
    /// returned to the caller, which binds it once every section is known.
    fn parse_session_attribute(&mut self, attr: &str) -> Result<Option<Candidate>> {
        let (key, value) = parse_pair(attr);
        match key {
            "setup" => self.role = parse_setup(value),
            "fingerprint" => {
                let (algorithm, fingerprint) = parse_fingerprint(value)?;
                if algorithm == FINGERPRINT_ALGORITHM {
                    self.fingerprint = Some(fingerprint);
                } else {
                    warn!("Unsupported fingerprint algorithm {}, ignoring", algorithm);
                }
            }
            "ice-ufrag" => self.ice_ufrag = Some(value.trim().to_string()),
            "ice-pwd" => self.ice_pwd = Some(value.trim().to_string()),
            "candidate" => return Ok(Some(value.parse::<Candidate>()?)),
            "end-of-candidates" => self.ended = true,
            _ => {}
        }
        Ok(None)
    }

    /// Whether the attribute is consumed at session scope (including the
    /// ones regenerated from the description state).
    fn is_session_attribute(&self, attr: &str) -> bool {
        matches!(
            parse_pair(attr).0,
            "setup"
                | "fingerprint"
                | "ice-ufrag"
                | "ice-pwd"
                | "end-of-candidates"
                | "ice-options"
                | "group"
                | "msid-semantic"
        )
    }

    fn parse_session_line(&mut self, line: &str) -> Result<()> {
        if let Some(origin) = line.strip_prefix("o=") {
            let mut tokens = origin.split_whitespace();
            match (tokens.next(), tokens.next()) {
                (Some(username), Some(session_id)) => {
                    self.username = username.to_string();
                    self.session_id = session_id.to_string();
                }
                _ => return Err(Error::MalformedLine(format!("Invalid origin line: {}", line))),
            }
        } else {
            trace!("ignoring session line: {}", line);
        }
        Ok(())
    }

    fn validate_entries(&self) -> Result<()> {
        if self.entries.iter().filter(|entry| entry.is_application()).count() > 1 {
            return Err(Error::DuplicateApplication);
        }
        for (index, entry) in self.entries.iter().enumerate() {
            if self.entries[..index].iter().any(|other| other.mid() == entry.mid()) {
                return Err(Error::DuplicateMid(entry.mid().to_string()));
            }
        }
        Ok(())
    }

    /// Maps a type token to [`SdpType`]; unknown tokens yield `Unspec`.
    pub fn string_to_type(sdp_type: &str) -> SdpType {
        SdpType::from_str_lossy(sdp_type)
    }

    /// The token for an [`SdpType`]
    pub fn type_to_string(sdp_type: SdpType) -> &'static str {
        sdp_type.as_str()
    }

    /// Message type
    pub fn sdp_type(&self) -> SdpType {
        self.sdp_type
    }

    /// Message type token
    pub fn type_string(&self) -> &'static str {
        self.sdp_type.as_str()
    }

    /// DTLS setup role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Username of the `o=` line
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Session id of the `o=` line
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// ICE username fragment
    pub fn ice_ufrag(&self) -> Option<&str> {
        self.ice_ufrag.as_deref()
    }

    /// ICE password
    pub fn ice_pwd(&self) -> Option<&str> {
        self.ice_pwd.as_deref()
    }

    /// SHA-256 certificate fingerprint, as written
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Session defaults used for generation
    pub fn config(&self) -> &DescriptionConfig {
        &self.config
    }

    /// Sets the message type if it is still unknown.
    ///
    /// An answer cannot keep the `actpass` role, so it becomes `passive`.
    pub fn hint_type(&mut self, sdp_type: SdpType) {
        if self.sdp_type == SdpType::Unspec {
            self.sdp_type = sdp_type;
            if self.sdp_type == SdpType::Answer && self.role == Role::ActPass {
                self.role = Role::Passive;
            }
        }
    }

    /// Sets the SHA-256 certificate fingerprint (no algorithm prefix).
    ///
    /// The value is emitted exactly as given.
    pub fn set_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.fingerprint = Some(fingerprint.into());
    }

    /// Sets the ICE username fragment.
    pub fn set_ice_ufrag(&mut self, ufrag: impl Into<String>) {
        self.ice_ufrag = Some(ufrag.into());
    }

    /// Sets the ICE password.
    pub fn set_ice_pwd(&mut self, pwd: impl Into<String>) {
        self.ice_pwd = Some(pwd.into());
    }

    /// Whether gathering is complete (`a=end-of-candidates`)
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Candidates in insertion order
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Appends a candidate, bound to the bundle section whatever mid it carried.
    pub fn add_candidate(&mut self, mut candidate: Candidate) {
        candidate.set_mid(self.bundle_mid());
        self.candidates.push(candidate);
    }

    /// Appends several candidates in order.
    pub fn add_candidates(&mut self, candidates: impl IntoIterator<Item = Candidate>) {
        for candidate in candidates {
            self.add_candidate(candidate);
        }
    }

    /// Marks candidate gathering as complete.
    pub fn end_candidates(&mut self) {
        self.ended = true;
    }

    /// Removes and returns every candidate, resetting the end marker.
    pub fn extract_candidates(&mut self) -> Vec<Candidate> {
        self.ended = false;
        std::mem::take(&mut self.candidates)
    }

    /// Candidate whose address is advertised on `c=` lines: the
    /// highest-priority resolved host candidate, preferring IPv4
    pub fn default_candidate(&self) -> Option<&Candidate> {
        self.candidates
            .iter()
            .filter(|c| c.candidate_type() == CandidateType::Host && c.is_resolved())
            .max_by_key(|c| (c.family() == Family::Ipv4, c.priority()))
    }

    /// Appends a media section and returns its index.
    ///
    /// Fails if the mid is not a token, if it is already used or if a second
    /// data channel section is added.
    pub fn add_media(&mut self, entry: impl Into<Entry>) -> Result<usize> {
        let entry = entry.into();
        if !is_valid_token(entry.mid()) {
            return Err(Error::InvalidMid(entry.mid().to_string()));
        }
        if entry.is_application() && self.has_application() {
            return Err(Error::DuplicateApplication);
        }
        if self.has_mid(entry.mid()) {
            return Err(Error::DuplicateMid(entry.mid().to_string()));
        }
        debug!(mid = %entry.mid(), media_type = %entry.media_type(), "adding media section");
        self.entries.push(entry);
        self.rebind_candidates();
        Ok(self.entries.len() - 1)
    }

    /// Appends a data channel section.
    pub fn add_application(&mut self, mid: impl Into<String>) -> Result<usize> {
        self.add_media(Application::new(mid))
    }

    /// Appends an audio section without codecs.
    pub fn add_audio(&mut self, mid: impl Into<String>, direction: Direction) -> Result<usize> {
        self.add_media(Media::audio(mid, direction))
    }

    /// Appends a video section without codecs.
    pub fn add_video(&mut self, mid: impl Into<String>, direction: Direction) -> Result<usize> {
        self.add_media(Media::video(mid, direction))
    }

    /// Detaches and returns the data channel section.
    pub fn remove_application(&mut self) -> Option<Application> {
        let index = self.entries.iter().position(Entry::is_application)?;
        let removed = self.entries.remove(index);
        self.rebind_candidates();
        match removed {
            Entry::Application(app) => Some(app),
            Entry::Media(_) => None,
        }
    }

    /// Candidates ride the bundle transport, so they follow its mid.
    fn rebind_candidates(&mut self) {
        let mid = self.bundle_mid();
        for candidate in &mut self.candidates {
            if candidate.mid() != Some(mid.as_str()) {
                candidate.set_mid(mid.clone());
            }
        }
    }

    /// Whether a data channel section exists
    pub fn has_application(&self) -> bool {
        self.entries.iter().any(Entry::is_application)
    }

    /// Whether any audio or video section exists
    pub fn has_audio_or_video(&self) -> bool {
        self.entries.iter().any(|entry| !entry.is_application())
    }

    /// Whether a section uses the mid
    pub fn has_mid(&self, mid: &str) -> bool {
        self.entries.iter().any(|entry| entry.mid() == mid)
    }

    /// The data channel section
    pub fn application(&self) -> Option<&Application> {
        self.entries.iter().find_map(Entry::as_application)
    }

    /// The data channel section, mutably
    pub fn application_mut(&mut self) -> Option<&mut Application> {
        self.entries.iter_mut().find_map(Entry::as_application_mut)
    }

    /// Section at `index`
    pub fn media(&self, index: usize) -> Result<&Entry> {
        let count = self.entries.len();
        self.entries
            .get(index)
            .ok_or(Error::MediaIndexOutOfRange { index, count })
    }

    /// Section at `index`, mutably
    pub fn media_mut(&mut self, index: usize) -> Result<&mut Entry> {
        let count = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(Error::MediaIndexOutOfRange { index, count })
    }

    /// Number of sections
    pub fn media_count(&self) -> usize {
        self.entries.len()
    }

    /// Sections in order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Mid of the first section, or `"0"` when there is none
    pub fn bundle_mid(&self) -> String {
        self.entries
            .first()
            .map(|entry| entry.mid().to_string())
            .unwrap_or_else(|| "0".to_string())
    }

    /// Builds the answer skeleton for this description: reciprocated
    /// sections, a fresh session id, the answering DTLS role, and no ICE
    /// credentials or candidates.
    pub fn reciprocate(&self) -> Description {
        let sdp_type = match self.sdp_type {
            SdpType::Offer => SdpType::Answer,
            SdpType::Answer | SdpType::Pranswer => SdpType::Offer,
            other => other,
        };
        let mut answer = Description::with_config(sdp_type, self.config.clone());
        answer.role = self.role.reciprocate();
        answer.entries = self.entries.iter().map(Entry::reciprocate).collect();
        answer
    }

    /// Generates the full description with the given line terminator.
    pub fn generate_sdp(&self, eol: &str) -> String {
        let entries: Vec<&Entry> = self.entries.iter().collect();
        self.generate(eol, &entries)
    }

    /// Generates the description with only the data channel section; a
    /// default one is used when none exists.
    pub fn generate_application_sdp(&self, eol: &str) -> String {
        let fallback;
        let app = match self.entries.iter().find(|entry| entry.is_application()) {
            Some(entry) => entry,
            None => {
                let mut app = Application::new("data");
                app.set_sctp_port(self.config.default_sctp_port);
                app.set_max_message_size(self.config.default_max_message_size);
                fallback = Entry::Application(app);
                &fallback
            }
        };
        self.generate(eol, &[app])
    }

    /// Generates the description as bytes, for transports that carry a body.
    pub fn to_bytes(&self, eol: &str) -> Bytes {
        Bytes::from(self.generate_sdp(eol))
    }

    fn generate(&self, eol: &str, entries: &[&Entry]) -> String {
        let mut sdp = String::new();

        sdp.push_str(&format!("v=0{}", eol));
        sdp.push_str(&format!(
            "o={} {} 0 IN IP4 {}{}",
            self.username, self.session_id, self.config.origin_address, eol
        ));
        sdp.push_str(&format!("s={}{}", self.config.session_name, eol));
        sdp.push_str(&format!("t=0 0{}", eol));

        if entries.len() > 1 {
            let mids: Vec<&str> = entries.iter().map(|entry| entry.mid()).collect();
            sdp.push_str(&format!("a=group:BUNDLE {}{}", mids.join(" "), eol));
        }
        if entries.iter().any(|entry| !entry.is_application()) {
            sdp.push_str(&format!("a=msid-semantic:WMS *{}", eol));
        }
        sdp.push_str(&format!("a=setup:{}{}", self.role, eol));
        if let Some(ufrag) = &self.ice_ufrag {
            sdp.push_str(&format!("a=ice-ufrag:{}{}", ufrag, eol));
        }
        if let Some(pwd) = &self.ice_pwd {
            sdp.push_str(&format!("a=ice-pwd:{}{}", pwd, eol));
        }
        if !self.ended {
            sdp.push_str(&format!("a=ice-options:trickle{}", eol));
        }
        if let Some(fingerprint) = &self.fingerprint {
            sdp.push_str(&format!("a=fingerprint:{} {}{}", FINGERPRINT_ALGORITHM, fingerprint, eol));
        }

        let (addr, port) = match self.default_candidate() {
            Some(candidate) => {
                let family = if candidate.family() == Family::Ipv6 { "IP6" } else { "IP4" };
                (format!("{} {}", family, candidate.address()), candidate.port().to_string())
            }
            None => ("IP4 0.0.0.0".to_string(), DISCARD_PORT.to_string()),
        };

        for (index, entry) in entries.iter().enumerate() {
            sdp.push_str(&entry.generate_sdp(eol, &addr, &port));
            if index == 0 {
                self.generate_candidate_lines(eol, &mut sdp);
            }
        }
        if entries.is_empty() {
            self.generate_candidate_lines(eol, &mut sdp);
        }

        trace!(entries = entries.len(), bytes = sdp.len(), "generated session description");
        sdp
    }

    fn generate_candidate_lines(&self, eol: &str, out: &mut String) {
        for candidate in &self.candidates {
            out.push_str(&format!("a={}{}", candidate, eol));
        }
        if self.ended {
            out.push_str(&format!("a=end-of-candidates{}", eol));
        }
    }
}

impl Default for Description {
    fn default() -> Self {
        Self::with_config(SdpType::Unspec, DescriptionConfig::default())
    }
}

fn generate_session_id() -> String {
    format!("{}", rand::random::<u32>())
}

impl FromStr for Description {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Description::new(s)
    }
}

impl TryFrom<&[u8]> for Description {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        let sdp = std::str::from_utf8(data).map_err(|_| Error::InvalidUtf8)?;
        Description::new(sdp)
    }
}

impl TryFrom<Bytes> for Description {
    type Error = Error;

    fn try_from(data: Bytes) -> Result<Self> {
        Description::try_from(data.as_ref())
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.generate_sdp(DEFAULT_EOL))
    }
}

impl From<&Description> for String {
    fn from(desc: &Description) -> Self {
        desc.generate_sdp(DEFAULT_EOL)
    }
}
