//! DTLS attribute values (RFC 8842, RFC 8122)
//!
//! `a=setup` and `a=fingerprint`.
//! The fingerprint value is kept as text; no hashing happens here.

use crate::attributes::common::token;
use crate::error::{Error, Result};
use crate::types::Role;
use nom::{
    character::complete::space1,
    combinator::rest,
    sequence::separated_pair,
    IResult,
};
use tracing::warn;

/// Hash function token, then the rest of the line as the value
fn fingerprint_parser(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(token, space1, rest)(input)
}

/// Parses fingerprint attribute: a=fingerprint:<hash-function> <fingerprint>
///
/// Returns the lowercase hash function name and the fingerprint exactly as
/// written. Only a missing hash function or value is an error.
pub fn parse_fingerprint(value: &str) -> Result<(String, String)> {
    let value = value.trim();
    match fingerprint_parser(value) {
        Ok((_, (hash, fingerprint))) if !fingerprint.trim().is_empty() => {
            Ok((hash.to_lowercase(), fingerprint.trim().to_string()))
        }
        _ => Err(Error::MalformedLine(format!("Invalid fingerprint: {}", value))),
    }
}

/// Parses setup attribute: a=setup:<role>
///
/// `holdconn` and unrecognized tokens carry no role preference and map to `actpass`.
pub fn parse_setup(value: &str) -> Role {
    match value.trim().to_lowercase().as_str() {
        "active" => Role::Active,
        "passive" => Role::Passive,
        "actpass" | "holdconn" => Role::ActPass,
        other => {
            warn!("Unknown setup value {:?}, using actpass", other);
            Role::ActPass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fingerprint_sha256() {
        let value = "sha-256 4a:ad:b9:b1:3f:82:18:3b:54:02:12:df:3e:5d:49:6b:19:e5:7c:ab:4a:ad:b9:b1:3f:82:18:3b:54:02:12:df";
        let (hash, fingerprint) = parse_fingerprint(value).unwrap();
        assert_eq!(hash, "sha-256");
        assert_eq!(
            fingerprint,
            "4a:ad:b9:b1:3f:82:18:3b:54:02:12:df:3e:5d:49:6b:19:e5:7c:ab:4a:ad:b9:b1:3f:82:18:3b:54:02:12:df"
        );
    }

    #[test]
    fn test_fingerprint_hash_case_insensitive() {
        let (hash, fingerprint) = parse_fingerprint("SHA-1 4A:AD").unwrap();
        assert_eq!(hash, "sha-1");
        assert_eq!(fingerprint, "4A:AD");
    }

    #[test]
    fn test_fingerprint_value_is_opaque() {
        let (hash, fingerprint) = parse_fingerprint(" sha-256 opaque-fp-value ").unwrap();
        assert_eq!(hash, "sha-256");
        assert_eq!(fingerprint, "opaque-fp-value");

        let (_, fingerprint) = parse_fingerprint("sha-256 4A:AD extra").unwrap();
        assert_eq!(fingerprint, "4A:AD extra");

        let (hash, _) = parse_fingerprint("unknown-hash 4A:XZ").unwrap();
        assert_eq!(hash, "unknown-hash");
    }

    #[test]
    fn test_fingerprint_without_value() {
        assert!(parse_fingerprint("").is_err());
        assert!(parse_fingerprint("sha-256").is_err());
        assert!(parse_fingerprint("sha-256   ").is_err());
    }

    #[test]
    fn test_setup() {
        assert_eq!(parse_setup("active"), Role::Active);
        assert_eq!(parse_setup("passive"), Role::Passive);
        assert_eq!(parse_setup(" actpass "), Role::ActPass);
        assert_eq!(parse_setup("holdconn"), Role::ActPass);
        assert_eq!(parse_setup("ACTIVE"), Role::Active);
    }

    #[test]
    fn test_unknown_setup_falls_back_to_actpass() {
        assert_eq!(parse_setup("holdconn2"), Role::ActPass);
        assert_eq!(parse_setup("client"), Role::ActPass);
        assert_eq!(parse_setup(""), Role::ActPass);
    }
}
