//! SDP SSRC Attribute Parser
//!
//! Implements parser for source-specific attributes as defined in RFC 5576.
//! Format: a=ssrc:<ssrc-id> [<attribute>[:<value>]]

use crate::attributes::common::to_result;
use crate::error::Result;
use nom::{
    branch::alt,
    character::complete::{digit1, space1},
    combinator::{eof, map_res, rest},
    sequence::{pair, preceded},
    IResult,
};

/// Parsed value of an `a=ssrc` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsrcValue {
    /// SSRC identifier
    pub ssrc: u32,
    /// Source attribute name (e.g. "cname", "msid"), if any
    pub attribute: Option<String>,
    /// Source attribute value, if any
    pub value: Option<String>,
}

/// SSRC id, then either the end of the value or whitespace and the source attribute
fn ssrc_parser(input: &str) -> IResult<&str, (u32, &str)> {
    pair(
        map_res(digit1, |s: &str| s.parse::<u32>()),
        alt((preceded(space1, rest), eof)),
    )(input)
}

/// Parses ssrc attribute value: <ssrc-id> [<attribute>[:<value>]]
pub fn parse_ssrc(value: &str) -> Result<SsrcValue> {
    let value = value.trim();
    let (ssrc, remainder) = to_result(ssrc_parser(value), &format!("Invalid ssrc value: {}", value))?;
    let remainder = remainder.trim();

    let (attribute, attr_value) = if remainder.is_empty() {
        (None, None)
    } else {
        match remainder.split_once(':') {
            Some((name, v)) => (Some(name.to_string()), Some(v.to_string())),
            None => (Some(remainder.to_string()), None),
        }
    };

    Ok(SsrcValue {
        ssrc,
        attribute,
        value: attr_value,
    })
}
