//! Attribute value parsers
//!
//! nom parsers for the `a=` values the description model interprets.
//! Sections keep every other attribute line verbatim.

// Codec and source attributes
pub mod rtpmap;
pub mod ssrc;

// DTLS setup and fingerprint
pub mod dtls;

// Data channel
pub mod sctp;

// Shared helpers
pub mod common;

pub use common::*;
pub use dtls::*;
pub use rtpmap::*;
pub use sctp::*;
pub use ssrc::*;
