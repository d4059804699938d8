//! Data channel section (`m=application ... webrtc-datachannel`)

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::attributes::common::{attribute_body, parse_pair};
use crate::attributes::sctp::{parse_max_message_size, parse_sctp_port};
use crate::entry::{EntryCore, MLine, SdpSection};
use crate::error::Result;
use crate::types::Direction;

/// Protocol advertised by data channel sections created locally
pub const DATA_CHANNEL_PROTOCOL: &str = "UDP/DTLS/SCTP";

/// Data channel media section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    core: EntryCore,
    sctp_port: Option<u16>,
    max_message_size: Option<usize>,
}

impl Application {
    /// Creates a data channel section with direction `sendrecv`.
    pub fn new(mid: impl Into<String>) -> Self {
        Self {
            core: EntryCore::new("application", DATA_CHANNEL_PROTOCOL, mid, Direction::SendRecv),
            sctp_port: None,
            max_message_size: None,
        }
    }

    pub(crate) fn from_mline(mline: &MLine<'_>, mid: String, direction: Direction) -> Self {
        let mut app = Self {
            core: EntryCore::new(mline.kind, mline.protocol, mid, direction),
            sctp_port: None,
            max_message_size: None,
        };
        // Pre-RFC 8841 offers put the SCTP port in the format list (`DTLS/SCTP 5000`).
        if let Some(port) = mline.formats.first().and_then(|fmt| fmt.parse::<u16>().ok()) {
            app.hint_sctp_port(port);
        }
        app
    }

    /// SCTP port (`a=sctp-port`)
    pub fn sctp_port(&self) -> Option<u16> {
        self.sctp_port
    }

    /// Sets the SCTP port.
    pub fn set_sctp_port(&mut self, port: u16) {
        self.sctp_port = Some(port);
    }

    /// Sets the SCTP port only if none is set yet.
    pub fn hint_sctp_port(&mut self, port: u16) {
        if self.sctp_port.is_none() {
            self.sctp_port = Some(port);
        }
    }

    /// Maximum message size (`a=max-message-size`)
    pub fn max_message_size(&self) -> Option<usize> {
        self.max_message_size
    }

    /// Sets the maximum message size.
    pub fn set_max_message_size(&mut self, size: usize) {
        self.max_message_size = Some(size);
    }

    /// Answer-side copy: same mid, port and size, direction `sendrecv`.
    pub fn reciprocate(&self) -> Application {
        let mut reciprocated = self.clone();
        reciprocated.core.set_direction(Direction::SendRecv);
        reciprocated
    }
}

impl SdpSection for Application {
    fn core(&self) -> &EntryCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntryCore {
        &mut self.core
    }

    fn description(&self) -> String {
        format!("{} webrtc-datachannel", self.core.protocol())
    }

    fn parse_sdp_line(&mut self, line: &str) -> Result<()> {
        if let Some(attr) = attribute_body(line) {
            let (key, value) = parse_pair(attr);
            match key {
                "sctp-port" => {
                    self.sctp_port = Some(parse_sctp_port(value)?);
                    return Ok(());
                }
                "max-message-size" => {
                    self.max_message_size = Some(parse_max_message_size(value)?);
                    return Ok(());
                }
                "sctpmap" => {
                    // Legacy `a=sctpmap:<port> webrtc-datachannel <streams>`
                    let port = value.split_whitespace().next().unwrap_or_default();
                    if let Ok(port) = port.parse::<u16>() {
                        trace!(mid = %self.core.mid(), port, "sctp port from legacy sctpmap");
                        self.hint_sctp_port(port);
                    }
                    return Ok(());
                }
                _ => {}
            }
        }
        self.core.parse_sdp_line(line)
    }

    fn generate_sdp_lines(&self, eol: &str, out: &mut String) {
        if let Some(port) = self.sctp_port {
            out.push_str(&format!("a=sctp-port:{}{}", port, eol));
        }
        if let Some(size) = self.max_message_size {
            out.push_str(&format!("a=max-message-size:{}{}", size, eol));
        }
    }
}
