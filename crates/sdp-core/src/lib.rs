//! Session description model for WebRTC-style peer connections
//!
//! This crate parses SDP offers and answers into a [`Description`] made of
//! media sections ([`Entry`]), lets the application mutate it (codecs, SSRCs,
//! ICE credentials, candidates) and regenerates wire-format SDP text. It does
//! no I/O of its own.

// Declare modules
pub mod attributes;
pub mod candidate;
pub mod config;
pub mod description;
pub mod entry;
pub mod error;
pub mod types;

// Re-export key public items
pub use candidate::{Candidate, CandidateType, Family};
pub use config::DescriptionConfig;
pub use description::Description;
pub use entry::{Application, Entry, EntryCore, Media, RtpMap, SdpSection, Ssrc};
pub use error::{Error, Result};
pub use types::{Direction, Role, SdpType};

/// Re-export of common types and traits
pub mod prelude {
    pub use crate::candidate::Candidate;
    pub use crate::description::Description;
    pub use crate::entry::{Application, Entry, Media, RtpMap, SdpSection};
    pub use crate::error::{Error, Result};
    pub use crate::types::{Direction, Role, SdpType};
}
