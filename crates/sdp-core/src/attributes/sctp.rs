//! Data channel attribute values (RFC 8841)
//!
//! `a=sctp-port:<port>` and `a=max-message-size:<size>` of an
//! `m=application` section.

use crate::attributes::common::parse_unsigned;
use crate::error::{Error, Result};

/// Value of `a=sctp-port`; 0 means no SCTP association is wanted.
pub fn parse_sctp_port(value: &str) -> Result<u16> {
    let port = parse_unsigned(value, "sctp-port")?;
    u16::try_from(port).map_err(|_| Error::MalformedLine(format!("sctp-port out of range: {}", port)))
}

/// Value of `a=max-message-size`; 0 means any size is accepted.
pub fn parse_max_message_size(value: &str) -> Result<usize> {
    let size = parse_unsigned(value, "max-message-size")?;
    usize::try_from(size)
        .map_err(|_| Error::MalformedLine(format!("max-message-size out of range: {}", size)))
}
