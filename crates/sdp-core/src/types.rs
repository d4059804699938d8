//! Enumerations shared by the description model: the SDP message type, the
//! DTLS setup role and the media direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Role of an SDP message in the offer/answer exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SdpType {
    /// Not yet known
    #[default]
    Unspec,
    /// Offer
    Offer,
    /// Answer
    Answer,
    /// Provisional answer
    Pranswer,
    /// Rollback to the last stable state
    Rollback,
}

impl SdpType {
    /// Maps a type token to the enum; unrecognized tokens yield `Unspec`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "offer" => SdpType::Offer,
            "answer" => SdpType::Answer,
            "pranswer" => SdpType::Pranswer,
            "rollback" => SdpType::Rollback,
            _ => SdpType::Unspec,
        }
    }

    /// The literal token for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            SdpType::Unspec => "unspec",
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
            SdpType::Pranswer => "pranswer",
            SdpType::Rollback => "rollback",
        }
    }
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DTLS setup role (`a=setup`, RFC 8842)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Either role is acceptable; only valid in an offer
    #[default]
    ActPass,
    /// Wait for the peer to initiate the DTLS handshake
    Passive,
    /// Initiate the DTLS handshake
    Active,
}

impl Role {
    /// The `a=setup` token for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ActPass => "actpass",
            Role::Passive => "passive",
            Role::Active => "active",
        }
    }

    /// Role an answerer takes in response to this offered role.
    ///
    /// An offered `actpass` is answered with `active`.
    pub fn reciprocate(&self) -> Role {
        match self {
            Role::ActPass | Role::Passive => Role::Active,
            Role::Active => Role::Passive,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media direction attribute (`a=sendonly`, `a=recvonly`, `a=sendrecv`, `a=inactive`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Send only
    SendOnly,
    /// Receive only
    RecvOnly,
    /// Send and receive
    SendRecv,
    /// Neither send nor receive
    Inactive,
    /// No direction attribute seen or set
    #[default]
    Unknown,
}

impl Direction {
    /// The attribute token, or `None` for `Unknown`
    pub fn as_attribute(&self) -> Option<&'static str> {
        match self {
            Direction::SendOnly => Some("sendonly"),
            Direction::RecvOnly => Some("recvonly"),
            Direction::SendRecv => Some("sendrecv"),
            Direction::Inactive => Some("inactive"),
            Direction::Unknown => None,
        }
    }

    /// Direction seen from the other side of the exchange
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::SendOnly => Direction::RecvOnly,
            Direction::RecvOnly => Direction::SendOnly,
            other => *other,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_attribute().unwrap_or("unknown"))
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "sendonly" => Ok(Direction::SendOnly),
            "recvonly" => Ok(Direction::RecvOnly),
            "sendrecv" => Ok(Direction::SendRecv),
            "inactive" => Ok(Direction::Inactive),
            other => Err(Error::MalformedLine(format!("Invalid direction: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tokens() {
        assert_eq!(SdpType::from_str_lossy("offer"), SdpType::Offer);
        assert_eq!(SdpType::from_str_lossy("answer"), SdpType::Answer);
        assert_eq!(SdpType::from_str_lossy("pranswer"), SdpType::Pranswer);
        assert_eq!(SdpType::from_str_lossy("rollback"), SdpType::Rollback);
        assert_eq!(SdpType::from_str_lossy("Offer"), SdpType::Unspec);
        assert_eq!(SdpType::from_str_lossy(""), SdpType::Unspec);
        assert_eq!(SdpType::Pranswer.to_string(), "pranswer");
    }

    #[test]
    fn test_role_reciprocate() {
        assert_eq!(Role::ActPass.reciprocate(), Role::Active);
        assert_eq!(Role::Active.reciprocate(), Role::Passive);
        assert_eq!(Role::Passive.reciprocate(), Role::Active);
        assert_eq!(Role::ActPass.to_string(), "actpass");
    }

    #[test]
    fn test_direction() {
        assert_eq!("sendrecv".parse::<Direction>().unwrap(), Direction::SendRecv);
        assert_eq!(" recvonly\t".parse::<Direction>().unwrap(), Direction::RecvOnly);
        assert!("send receive".parse::<Direction>().is_err());
        assert!("".parse::<Direction>().is_err());

        assert_eq!(Direction::SendOnly.reverse(), Direction::RecvOnly);
        assert_eq!(Direction::RecvOnly.reverse(), Direction::SendOnly);
        assert_eq!(Direction::SendRecv.reverse(), Direction::SendRecv);
        assert_eq!(Direction::Inactive.reverse(), Direction::Inactive);
        assert_eq!(Direction::Unknown.as_attribute(), None);
    }
}
