//! Discord Rich Presence client over the local IPC socket.

pub mod codec;
pub mod error;
pub mod locator;
pub mod session;

use serde::Serialize;

use crate::models::Status;

pub use locator::Locator;
pub use session::{Session, SessionConfig};

pub const PROTOCOL_VERSION: &str = "1";

/// Payload of the opening HANDSHAKE frame.
#[derive(Debug, Serialize)]
pub struct Handshake<'a> {
    pub v: &'static str,
    pub client_id: &'a str,
}

impl<'a> Handshake<'a> {
    pub fn new(client_id: &'a str) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            client_id,
        }
    }
}

/// Payload of a MESSAGE frame. Only `SET_ACTIVITY` is ever sent.
#[derive(Debug, Serialize)]
pub struct Command<'a> {
    pub cmd: &'static str,
    pub args: ActivityArgs<'a>,
    pub nonce: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityArgs<'a> {
    pub pid: u32,
    /// `None` serializes as `null`, which clears the presence.
    pub activity: Option<&'a Status>,
}

impl<'a> Command<'a> {
    pub fn set_activity(pid: u32, activity: Option<&'a Status>) -> Self {
        Self {
            cmd: "SET_ACTIVITY",
            args: ActivityArgs { pid, activity },
            nonce: chrono::Utc::now().timestamp().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityKind;
    use serde_json::json;

    #[test]
    fn test_handshake_payload() {
        let value = serde_json::to_value(Handshake::new("1234")).unwrap();
        assert_eq!(value, json!({"v": "1", "client_id": "1234"}));
    }

    #[test]
    fn test_clear_payload() {
        let value = serde_json::to_value(Command::set_activity(77, None)).unwrap();

        assert_eq!(value["cmd"], "SET_ACTIVITY");
        assert_eq!(value["args"]["pid"], 77);
        assert!(value["args"]["activity"].is_null());
        assert!(value["nonce"].as_str().unwrap().parse::<i64>().is_ok());
    }

    #[test]
    fn test_set_payload() {
        let status = Status::new(ActivityKind::Listening, "Song", "by Artist");
        let value = serde_json::to_value(Command::set_activity(77, Some(&status))).unwrap();

        assert_eq!(value["args"]["activity"]["details"], "Song");
        assert_eq!(value["args"]["activity"]["type"], 2);
    }
}
