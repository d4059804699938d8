use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, building or mutating a session description
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required token is missing from an `m=` or `a=` line
    #[error("Malformed SDP line: {0}")]
    MalformedLine(String),

    /// Byte input that is not valid UTF-8
    #[error("SDP content is not valid UTF-8")]
    InvalidUtf8,

    /// Candidate text that cannot be parsed
    #[error("Invalid ICE candidate: {0}")]
    InvalidCandidate(String),

    /// `media(index)` called past the end of the entry list
    #[error("Media index {index} out of range ({count} entries)")]
    MediaIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of entries in the description
        count: usize,
    },

    /// RTP payload types are 7 bits wide
    #[error("Invalid payload type: {0}")]
    InvalidPayloadType(u8),

    /// No RTP map for the payload type
    #[error("Payload type not found: {0}")]
    PayloadTypeNotFound(u8),

    /// No RTP map with the format name
    #[error("Format not found: {0}")]
    FormatNotFound(String),

    /// SSRC not present in the media section
    #[error("SSRC not found: {0}")]
    SsrcNotFound(u32),

    /// A description may carry at most one data channel section
    #[error("Description already has an application entry")]
    DuplicateApplication,

    /// Mids must be unique within a description
    #[error("Duplicate mid: {0}")]
    DuplicateMid(String),

    /// Mids must be non-empty tokens to fit `a=mid` and `a=group:BUNDLE`
    #[error("Invalid mid: {0:?}")]
    InvalidMid(String),
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Error::MalformedLine(format!("Parsing failed: {err}"))
    }
}
