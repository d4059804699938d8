//! ICE candidate value type
//!
//! Parses and prints the candidate grammar of RFC 8839:
//! `candidate:<foundation> <component-id> <transport> <priority> <conn-addr> <port> typ <cand-type> [raddr <raddr>] [rport <rport>] *(extensions)`
//!
//! The description model only stores, orders and serializes candidates; the
//! structured fields exist so the default candidate (used for the `c=` line)
//! can be picked.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// ICE candidate type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateType {
    /// Local interface address
    Host,
    /// Address seen by a STUN server
    ServerReflexive,
    /// Address learned from a connectivity check
    PeerReflexive,
    /// TURN relay address
    Relayed,
}

impl CandidateType {
    /// The `typ` token
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateType::Host => "host",
            CandidateType::ServerReflexive => "srflx",
            CandidateType::PeerReflexive => "prflx",
            CandidateType::Relayed => "relay",
        }
    }
}

impl FromStr for CandidateType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "host" => Ok(CandidateType::Host),
            "srflx" => Ok(CandidateType::ServerReflexive),
            "prflx" => Ok(CandidateType::PeerReflexive),
            "relay" => Ok(CandidateType::Relayed),
            other => Err(Error::InvalidCandidate(format!("Invalid candidate type: {}", other))),
        }
    }
}

/// Address family of a candidate's connection address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Not a literal IP address (e.g. an mDNS hostname)
    Unresolved,
    /// IPv4 literal
    Ipv4,
    /// IPv6 literal
    Ipv6,
}

/// One ICE candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    foundation: String,
    component_id: u32,
    transport: String,
    priority: u32,
    address: String,
    port: u16,
    candidate_type: CandidateType,
    related_address: Option<String>,
    related_port: Option<u16>,
    extensions: Vec<(String, Option<String>)>,
    mid: Option<String>,
}

impl Candidate {
    /// Parses a candidate, with or without the `a=` / `candidate:` prefixes,
    /// and attaches it to the given media section.
    pub fn new(candidate: &str, mid: impl Into<String>) -> Result<Self> {
        let mut parsed: Candidate = candidate.parse()?;
        parsed.mid = Some(mid.into());
        Ok(parsed)
    }

    /// Foundation
    pub fn foundation(&self) -> &str {
        &self.foundation
    }

    /// Component ID (1 for RTP, 2 for RTCP)
    pub fn component_id(&self) -> u32 {
        self.component_id
    }

    /// Transport protocol token as it appeared (e.g. "UDP", "tcp")
    pub fn transport(&self) -> &str {
        &self.transport
    }

    /// Candidate priority
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Connection address (IP literal or hostname)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Port number
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Candidate type
    pub fn candidate_type(&self) -> CandidateType {
        self.candidate_type
    }

    /// Related address for reflexive/relay candidates
    pub fn related_address(&self) -> Option<&str> {
        self.related_address.as_deref()
    }

    /// Related port for reflexive/relay candidates
    pub fn related_port(&self) -> Option<u16> {
        self.related_port
    }

    /// Media section this candidate belongs to
    pub fn mid(&self) -> Option<&str> {
        self.mid.as_deref()
    }

    /// Attaches the candidate to a media section
    pub fn set_mid(&mut self, mid: impl Into<String>) {
        self.mid = Some(mid.into());
    }

    /// Address family of the connection address
    pub fn family(&self) -> Family {
        match self.address.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Family::Ipv4,
            Ok(IpAddr::V6(_)) => Family::Ipv6,
            Err(_) => Family::Unresolved,
        }
    }

    /// Whether the connection address is an IP literal
    pub fn is_resolved(&self) -> bool {
        self.family() != Family::Unresolved
    }
}

impl FromStr for Candidate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        let value = value.strip_prefix("a=").unwrap_or(value);
        let value = value.strip_prefix("candidate:").unwrap_or(value);
        let parts: Vec<&str> = value.split_whitespace().collect();

        if parts.len() < 8 {
            return Err(Error::InvalidCandidate(format!(
                "Invalid candidate format, insufficient parts: {}",
                value
            )));
        }

        let foundation = parts[0].to_string();

        let component_id = match parts[1].parse::<u32>() {
            Ok(id) if (1..=256).contains(&id) => id,
            _ => {
                return Err(Error::InvalidCandidate(format!(
                    "Invalid component ID in candidate: {}",
                    parts[1]
                )))
            }
        };

        let transport = parts[2].to_string();
        if !transport.eq_ignore_ascii_case("UDP") && !transport.eq_ignore_ascii_case("TCP") {
            return Err(Error::InvalidCandidate(format!(
                "Invalid transport in candidate: {}",
                transport
            )));
        }

        let priority = parts[3].parse::<u32>().map_err(|_| {
            Error::InvalidCandidate(format!("Invalid priority in candidate: {}", parts[3]))
        })?;

        let address = parts[4].to_string();

        let port = parts[5].parse::<u16>().map_err(|_| {
            Error::InvalidCandidate(format!("Invalid port in candidate: {}", parts[5]))
        })?;

        if parts[6] != "typ" {
            return Err(Error::InvalidCandidate(format!(
                "Expected 'typ' keyword in candidate, found: {}",
                parts[6]
            )));
        }

        let candidate_type: CandidateType = parts[7].parse()?;

        let mut idx = 8;
        let mut related_address = None;
        let mut related_port = None;
        let mut extensions = Vec::new();

        while idx < parts.len() {
            match parts[idx] {
                "raddr" => {
                    idx += 1;
                    let addr = parts.get(idx).ok_or_else(|| {
                        Error::InvalidCandidate("raddr keyword without address".to_string())
                    })?;
                    related_address = Some(addr.to_string());
                }
                "rport" => {
                    idx += 1;
                    let rport = parts.get(idx).ok_or_else(|| {
                        Error::InvalidCandidate("rport keyword without port".to_string())
                    })?;
                    related_port = Some(rport.parse::<u16>().map_err(|_| {
                        Error::InvalidCandidate(format!("Invalid related port in candidate: {}", rport))
                    })?);
                }
                key => {
                    let mut ext_value = None;
                    if idx + 1 < parts.len() && !["raddr", "rport"].contains(&parts[idx + 1]) {
                        ext_value = Some(parts[idx + 1].to_string());
                        idx += 1;
                    }
                    extensions.push((key.to_string(), ext_value));
                }
            }
            idx += 1;
        }

        if related_address.is_some() && related_port.is_none() {
            return Err(Error::InvalidCandidate(
                "Related address is present but related port is missing".to_string(),
            ));
        }

        Ok(Candidate {
            foundation,
            component_id,
            transport,
            priority,
            address,
            port,
            candidate_type,
            related_address,
            related_port,
            extensions,
            mid: None,
        })
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidate:{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component_id,
            self.transport,
            self.priority,
            self.address,
            self.port,
            self.candidate_type.as_str()
        )?;

        if let Some(addr) = &self.related_address {
            write!(f, " raddr {}", addr)?;
        }
        if let Some(port) = self.related_port {
            write!(f, " rport {}", port)?;
        }
        for (key, value) in &self.extensions {
            match value {
                Some(val) => write!(f, " {} {}", key, val)?,
                None => write!(f, " {}", key)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_candidate() {
        let candidate: Candidate = "1 1 UDP 2130706431 10.0.1.1 8998 typ host".parse().unwrap();
        assert_eq!(candidate.foundation(), "1");
        assert_eq!(candidate.component_id(), 1);
        assert_eq!(candidate.transport(), "UDP");
        assert_eq!(candidate.priority(), 2130706431);
        assert_eq!(candidate.address(), "10.0.1.1");
        assert_eq!(candidate.port(), 8998);
        assert_eq!(candidate.candidate_type(), CandidateType::Host);
        assert_eq!(candidate.family(), Family::Ipv4);
        assert!(candidate.mid().is_none());
    }

    #[test]
    fn test_parse_srflx_candidate_with_prefix() {
        let candidate = Candidate::new(
            "a=candidate:2 1 UDP 1694498815 192.0.2.3 45664 typ srflx raddr 10.0.1.1 rport 8998",
            "0",
        )
        .unwrap();
        assert_eq!(candidate.candidate_type(), CandidateType::ServerReflexive);
        assert_eq!(candidate.related_address(), Some("10.0.1.1"));
        assert_eq!(candidate.related_port(), Some(8998));
        assert_eq!(candidate.mid(), Some("0"));
    }

    #[test]
    fn test_mdns_candidate_is_unresolved() {
        let candidate: Candidate =
            "candidate:3 1 udp 2122260223 4d3f6a5e-1c2b.local 54321 typ host generation 0"
                .parse()
                .unwrap();
        assert_eq!(candidate.family(), Family::Unresolved);
        assert!(!candidate.is_resolved());
    }

    #[test]
    fn test_display_round_trip() {
        let text = "candidate:842163049 1 udp 1677729535 203.0.113.7 61234 typ srflx raddr 192.168.1.2 rport 61234 generation 0 network-cost 999";
        let candidate: Candidate = text.parse().unwrap();
        assert_eq!(candidate.to_string(), text);
    }

    #[test]
    fn test_ipv6_family() {
        let candidate: Candidate = "1 1 UDP 2130706431 2001:db8::1 8998 typ host".parse().unwrap();
        assert_eq!(candidate.family(), Family::Ipv6);
    }

    #[test]
    fn test_invalid_candidates() {
        assert!("1 1 UDP 2130706431 10.0.1.1 8998 typ".parse::<Candidate>().is_err());
        assert!("1 0 UDP 2130706431 10.0.1.1 8998 typ host".parse::<Candidate>().is_err());
        assert!("1 1 SCTP 2130706431 10.0.1.1 8998 typ host".parse::<Candidate>().is_err());
        assert!("1 1 UDP 2130706431 10.0.1.1 99999 typ host".parse::<Candidate>().is_err());
        assert!("1 1 UDP 2130706431 10.0.1.1 8998 type host".parse::<Candidate>().is_err());
        assert!("1 1 UDP 2130706431 10.0.1.1 8998 typ bogus".parse::<Candidate>().is_err());
        assert!("1 1 UDP 1 10.0.1.1 8998 typ srflx raddr 10.0.0.1"
            .parse::<Candidate>()
            .is_err());
    }
}
