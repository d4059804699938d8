//! Codec attribute values
//!
//! `a=rtpmap:<payload type> <encoding name>/<clock rate>[/<encoding parameters>]`
//! (RFC 8866) and the payload-type-prefixed `rtcp-fb` (RFC 4585) and `fmtp`
//! values that attach to one codec.

use crate::attributes::common::{positive_integer, to_result, token};
use crate::error::{Error, Result};
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0, space1},
    combinator::{map, map_res, opt, rest},
    sequence::{preceded, terminated, tuple},
    IResult,
};

/// Parsed value of an `a=rtpmap` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMapValue {
    /// RTP payload type (0-127)
    pub payload_type: u8,
    /// Encoding name (e.g. "opus", "H264")
    pub encoding_name: String,
    /// Clock rate in Hertz
    pub clock_rate: u32,
    /// Optional encoding parameters (e.g. number of channels)
    pub encoding_params: Option<String>,
}

/// Parser for a payload type (0-127)
pub fn payload_type(input: &str) -> IResult<&str, u8> {
    map_res(positive_integer, |pt| {
        if pt <= 127 {
            Ok(pt as u8)
        } else {
            Err(())
        }
    })(input)
}

/// Parser for encoding parameters (digits, typically the channel count)
fn encoding_params(input: &str) -> IResult<&str, String> {
    map(take_while1(|c: char| c.is_ascii_digit()), |s: &str| s.to_string())(input)
}

/// Parser for the encoding part: <encoding name>/<clock rate>[/<encoding parameters>]
fn encoding_parser(input: &str) -> IResult<&str, (String, u32, Option<String>)> {
    tuple((
        map(token, |s: &str| s.to_string()),
        preceded(char('/'), positive_integer),
        opt(preceded(char('/'), encoding_params)),
    ))(input)
}

/// Parser for the complete rtpmap value: <payload type> <encoding>
fn rtpmap_parser(input: &str) -> IResult<&str, RtpMapValue> {
    map(
        tuple((payload_type, preceded(space1, encoding_parser))),
        |(payload_type, (encoding_name, clock_rate, encoding_params))| RtpMapValue {
            payload_type,
            encoding_name,
            clock_rate,
            encoding_params,
        },
    )(input)
}

/// Parses rtpmap attribute value: <payload type> <encoding name>/<clock rate>[/<encoding parameters>]
pub fn parse_rtpmap(value: &str) -> Result<RtpMapValue> {
    match rtpmap_parser(value.trim()) {
        Ok((remaining, parsed)) if remaining.trim().is_empty() => Ok(parsed),
        _ => Err(Error::MalformedLine(format!("Invalid rtpmap format: {}", value))),
    }
}

/// Parser for `<payload type> <free-form remainder>`
fn pt_prefixed_parser(input: &str) -> IResult<&str, (u8, &str)> {
    tuple((terminated(payload_type, space0), rest))(input)
}

/// Parses the value of a payload-type-prefixed attribute such as `rtcp-fb` or `fmtp`.
///
/// Returns `Ok(None)` for the `*` wildcard, which applies to every payload type
/// and is therefore not attached to a single RTP map.
pub fn parse_pt_prefixed(value: &str) -> Result<Option<(u8, String)>> {
    let value = value.trim();
    if value.starts_with('*') {
        return Ok(None);
    }
    let (pt, remainder) = to_result(
        pt_prefixed_parser(value),
        &format!("Invalid payload type prefix: {}", value),
    )?;
    if remainder.trim().is_empty() {
        return Err(Error::MalformedLine(format!(
            "Missing parameters after payload type: {}",
            value
        )));
    }
    Ok(Some((pt, remainder.trim().to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rtpmap_values() {
        for ok in ["0 PCMU/8000", "8 PCMA/8000", "96 VP8/90000", "101 telephone-event/8000", "127 rtx/90000"] {
            assert!(parse_rtpmap(ok).is_ok(), "rejected {:?}", ok);
        }

        let rtpmap = parse_rtpmap("111 opus/48000/2").unwrap();
        assert_eq!(rtpmap.payload_type, 111);
        assert_eq!(rtpmap.encoding_name, "opus");
        assert_eq!(rtpmap.clock_rate, 48000);
        assert_eq!(rtpmap.encoding_params, Some("2".to_string()));

        for bad in [
            "96VP8/90000",
            "96 VP8",
            "VP8/90000",
            "128 VP8/90000",
            "96 VP8/rate",
            "96 VP8/90000@x",
        ] {
            assert!(parse_rtpmap(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_encoding_parser() {
        let (_, (name, rate, params)) = encoding_parser("VP8/90000").unwrap();
        assert_eq!(name, "VP8");
        assert_eq!(rate, 90000);
        assert_eq!(params, None);

        assert!(encoding_parser("opus").is_err());
        assert!(encoding_parser("opus/").is_err());
    }

    #[test]
    fn test_pt_prefixed() {
        assert_eq!(
            parse_pt_prefixed("96 nack pli").unwrap(),
            Some((96, "nack pli".to_string()))
        );
        assert_eq!(
            parse_pt_prefixed("111 minptime=10;useinbandfec=1").unwrap(),
            Some((111, "minptime=10;useinbandfec=1".to_string()))
        );
        assert_eq!(parse_pt_prefixed("* transport-cc").unwrap(), None);
        assert!(parse_pt_prefixed("96").is_err());
        assert!(parse_pt_prefixed("x nack").is_err());
    }
}
