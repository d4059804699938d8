//! Common parsing utilities for SDP attributes
//!
//! Reusable nom parsers and line helpers shared by the attribute parsers and
//! by the section parsers in `entry` and `description`.

use crate::error::{Error, Result};
use nom::{
    bytes::complete::take_while1,
    character::complete::{digit1, space0},
    combinator::{all_consuming, map_res},
    sequence::delimited,
    IResult,
};

/// Token characters as defined by RFC 8866 (`token-char`)
pub fn is_token_char(c: char) -> bool {
    matches!(c,
        '!' | '#'..='\'' | '*' | '+' | '-' | '.' | '0'..='9' | 'A'..='Z' | '^'..='~')
}

/// Parses a token
pub fn token(input: &str) -> IResult<&str, &str> {
    take_while1(is_token_char)(input)
}

/// Parses a positive integer
pub fn positive_integer(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

/// Parses a decimal unsigned integer surrounded by optional blanks
pub fn unsigned(input: &str) -> IResult<&str, u64> {
    delimited(space0, map_res(digit1, |s: &str| s.parse::<u64>()), space0)(input)
}

/// Parses a value that must be a single unsigned integer and nothing else
pub fn parse_unsigned(value: &str, what: &str) -> Result<u64> {
    to_result(all_consuming(unsigned)(value), &format!("Invalid {what} value: {value}"))
}

/// Splits an attribute body (`key[:value]`) into its key and value
///
/// Flag attributes such as `sendrecv` yield an empty value.
pub fn parse_pair(attr: &str) -> (&str, &str) {
    match attr.split_once(':') {
        Some((key, value)) => (key, value),
        None => (attr, ""),
    }
}

/// Returns the attribute body of an `a=` line, if the line is one
pub fn attribute_body(line: &str) -> Option<&str> {
    line.strip_prefix("a=")
}

/// Converts nom IResult to our Result type
pub fn to_result<T>(res: IResult<&str, T>, err_msg: &str) -> Result<T> {
    match res {
        Ok((_, value)) => Ok(value),
        Err(_) => Err(Error::MalformedLine(err_msg.to_string())),
    }
}

/// Validates that a token string is valid
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(is_token_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("mid:0"), ("mid", "0"));
        assert_eq!(parse_pair("sendrecv"), ("sendrecv", ""));
        assert_eq!(parse_pair("fmtp:96 apt=97"), ("fmtp", "96 apt=97"));
        // Only the first colon separates key and value
        assert_eq!(
            parse_pair("fingerprint:sha-256 AB:CD"),
            ("fingerprint", "sha-256 AB:CD")
        );
    }

    #[test]
    fn test_parse_unsigned() {
        assert_eq!(parse_unsigned("5000", "port").unwrap(), 5000);
        assert_eq!(parse_unsigned(" 42 ", "port").unwrap(), 42);
        assert!(parse_unsigned("", "port").is_err());
        assert!(parse_unsigned("12ab", "port").is_err());
        assert!(parse_unsigned("-1", "port").is_err());
    }

    #[test]
    fn test_tokens() {
        assert!(is_valid_token("audio"));
        assert!(is_valid_token("video-1.main"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("a b"));
        assert!(!is_valid_token("a:b"));
        assert_eq!(token("opus/48000").unwrap(), ("/48000", "opus"));
    }

    #[test]
    fn test_attribute_body() {
        assert_eq!(attribute_body("a=mid:0"), Some("mid:0"));
        assert_eq!(attribute_body("b=AS:30"), None);
    }
}
