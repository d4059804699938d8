//! Defaults used when a description is created or regenerated.

use serde::{Deserialize, Serialize};

/// Line terminator used by `Display` and the `String` conversion
pub const DEFAULT_EOL: &str = "\r\n";

/// Discard port advertised on m-lines when no default candidate is known
pub const DISCARD_PORT: u16 = 9;

/// Session-level defaults for a [`Description`](crate::Description)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionConfig {
    /// Username written on the `o=` line when the input does not provide one
    pub username: String,
    /// Session name (`s=`)
    pub session_name: String,
    /// Unicast address written on the `o=` line
    pub origin_address: String,
    /// SCTP port of the data channel section emitted when none exists
    pub default_sctp_port: u16,
    /// Max message size of the data channel section emitted when none exists
    pub default_max_message_size: usize,
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            username: "rtc".to_string(),
            session_name: "-".to_string(),
            origin_address: "127.0.0.1".to_string(),
            default_sctp_port: 5000,
            default_max_message_size: 65536,
        }
    }
}
