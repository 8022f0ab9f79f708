//! STOMP 1.2 text frames.
//!
//! The channel carries one frame per WebSocket text message:
//!
//! ```text
//! COMMAND\n
//! header:value\n
//! ...\n
//! \n
//! body\0
//! ```
//!
//! A message consisting only of end-of-line characters is a heart-beat and
//! decodes to `None`.
//!
//! # Invariants
//!
//! - Header escaping (`\\`, `\n`, `\r`, `\c`) applies to every command except
//!   `CONNECT` and `CONNECTED`, which carry headers verbatim.
//! - When a header name repeats, the first occurrence wins.
//! - With a `content-length` header the body is exactly that many bytes and
//!   may contain NUL; without it the body ends at the first NUL.

use crate::errors::{FrameError, Result};

/// Header naming the destination of SEND, SUBSCRIBE and MESSAGE frames.
pub const DESTINATION: &str = "destination";

/// Header carrying the subscription id on SUBSCRIBE and MESSAGE frames.
pub const SUBSCRIPTION: &str = "subscription";

/// Header with the byte length of the body.
pub const CONTENT_LENGTH: &str = "content-length";

/// Header with the MIME type of the body.
pub const CONTENT_TYPE: &str = "content-type";

/// Header carrying the short error description on ERROR frames.
pub const MESSAGE: &str = "message";

/// Protocol versions offered on CONNECT.
pub const ACCEPT_VERSION: &str = "1.2,1.1,1.0";

/// STOMP frame commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Client opens a session.
    Connect,
    /// Alias of CONNECT defined by STOMP 1.2.
    Stomp,
    /// Server accepted the session.
    Connected,
    /// Client publishes to a destination.
    Send,
    /// Client subscribes to a destination.
    Subscribe,
    /// Client cancels a subscription.
    Unsubscribe,
    /// Client closes the session.
    Disconnect,
    /// Server delivers a message for a subscription.
    Message,
    /// Server acknowledges a frame that requested a receipt.
    Receipt,
    /// Server reports an error; the connection is closed afterwards.
    Error,
}

impl Command {
    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    /// Parse a wire command name. `None` for anything STOMP does not define.
    pub fn parse(name: &str) -> Option<Self> {
        let command = match name {
            "CONNECT" => Self::Connect,
            "STOMP" => Self::Stomp,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            _ => return None,
        };
        Some(command)
    }

    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame command.
    pub command: Command,
    /// Headers in wire order (unescaped).
    pub headers: Vec<(String, String)>,
    /// Frame body.
    pub body: String,
}

impl Frame {
    /// Create a frame with no headers and an empty body.
    pub fn new(command: Command) -> Self {
        Self { command, headers: Vec::new(), body: String::new() }
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Destination header, present on SEND, SUBSCRIBE and MESSAGE frames.
    pub fn destination(&self) -> Option<&str> {
        self.header(DESTINATION)
    }

    /// CONNECT frame for `host` with heart-beating disabled.
    pub fn connect(host: &str) -> Self {
        Self::new(Command::Connect)
            .with_header("accept-version", ACCEPT_VERSION)
            .with_header("heart-beat", "0,0")
            .with_header("host", host)
    }

    /// SUBSCRIBE frame binding `id` to `destination`.
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(Command::Subscribe).with_header("id", id).with_header(DESTINATION, destination)
    }

    /// SEND frame carrying a JSON body.
    pub fn send(destination: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(Command::Send)
            .with_header(DESTINATION, destination)
            .with_header(CONTENT_TYPE, "application/json")
            .with_header(CONTENT_LENGTH, body.len().to_string())
            .with_body(body)
    }

    /// DISCONNECT frame asking for a receipt.
    pub fn disconnect(receipt: &str) -> Self {
        Self::new(Command::Disconnect).with_header("receipt", receipt)
    }

    /// Encode to the text carried in one WebSocket message.
    pub fn encode(&self) -> String {
        let escaped = self.command.escapes_headers();
        let mut out = String::with_capacity(self.body.len() + 64);

        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escaped {
                out.push_str(&escape(name));
                out.push(':');
                out.push_str(&escape(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Decode one WebSocket text message.
    ///
    /// Returns `Ok(None)` for a heart-beat (only end-of-line characters).
    /// Anything after the NUL terminator is ignored.
    pub fn decode(input: &str) -> Result<Option<Self>> {
        let mut cursor = input.trim_start_matches(['\r', '\n']);
        if cursor.is_empty() {
            return Ok(None);
        }

        let command_line = next_line(&mut cursor).ok_or(FrameError::Truncated)?;
        let command = Command::parse(command_line)
            .ok_or_else(|| FrameError::UnknownCommand(command_line.to_string()))?;

        let mut headers = Vec::new();
        loop {
            let line = next_line(&mut cursor).ok_or(FrameError::Truncated)?;
            if line.is_empty() {
                break;
            }
            let (name, value) =
                line.split_once(':').ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if command.escapes_headers() {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let length = headers
            .iter()
            .find(|(name, _)| name == CONTENT_LENGTH)
            .map(|(_, value)| {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| FrameError::InvalidContentLength(value.clone()))
            })
            .transpose()?;

        let body = match length {
            Some(len) => {
                if cursor.len() < len || !cursor.is_char_boundary(len) {
                    return Err(FrameError::InvalidContentLength(len.to_string()));
                }
                if cursor.as_bytes().get(len) != Some(&0) {
                    return Err(FrameError::MissingTerminator);
                }
                &cursor[..len]
            },
            None => {
                let end = cursor.find('\0').ok_or(FrameError::MissingTerminator)?;
                &cursor[..end]
            },
        };

        Ok(Some(Self { command, headers, body: body.to_string() }))
    }
}

/// Split the next `\n`-terminated line off `cursor`, dropping a trailing `\r`.
fn next_line<'a>(cursor: &mut &'a str) -> Option<&'a str> {
    let end = cursor.find('\n')?;
    let line = &cursor[..end];
    *cursor = &cursor[end + 1..];
    Some(line.strip_suffix('\r').unwrap_or(line))
}

/// Escape a header name or value.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse [`escape`]. Rejects escape sequences STOMP 1.2 does not define.
pub fn unescape(escaped: &str) -> Result<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(escaped.to_string())),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_server_message() {
        let raw = "MESSAGE\ndestination:/user/7/queue/messages\nsubscription:sub-0\n\
                   message-id:abc-1\ncontent-type:application/json\n\n{\"content\":\"hi\"}\0";

        let frame = Frame::decode(raw).unwrap().unwrap();

        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.destination(), Some("/user/7/queue/messages"));
        assert_eq!(frame.header(SUBSCRIPTION), Some("sub-0"));
        assert_eq!(frame.body, "{\"content\":\"hi\"}");
    }

    #[test]
    fn heartbeat_decodes_to_none() {
        assert_eq!(Frame::decode("\n").unwrap(), None);
        assert_eq!(Frame::decode("\r\n\r\n").unwrap(), None);
        assert_eq!(Frame::decode("").unwrap(), None);
    }

    #[test]
    fn crlf_line_endings_accepted() {
        let frame = Frame::decode("CONNECTED\r\nversion:1.2\r\n\r\n\0").unwrap().unwrap();
        assert_eq!(frame.command, Command::Connected);
        assert_eq!(frame.header("version"), Some("1.2"));
    }

    #[test]
    fn connected_headers_are_not_unescaped() {
        let frame = Frame::decode("CONNECTED\nserver:a\\cb\n\n\0").unwrap().unwrap();
        assert_eq!(frame.header("server"), Some("a\\cb"));
    }

    #[test]
    fn first_repeated_header_wins() {
        let frame = Frame::decode("MESSAGE\nfoo:first\nfoo:second\n\n\0").unwrap().unwrap();
        assert_eq!(frame.header("foo"), Some("first"));
    }

    #[test]
    fn content_length_allows_embedded_nul() {
        let frame = Frame::decode("MESSAGE\ncontent-length:3\n\na\0b\0").unwrap().unwrap();
        assert_eq!(frame.body, "a\0b");
    }

    #[test]
    fn missing_terminator_rejected() {
        assert_eq!(Frame::decode("MESSAGE\n\nbody"), Err(FrameError::MissingTerminator));
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(matches!(Frame::decode("HELLO\n\n\0"), Err(FrameError::UnknownCommand(_))));
    }

    #[test]
    fn oversized_content_length_rejected() {
        assert!(matches!(
            Frame::decode("MESSAGE\ncontent-length:99\n\nab\0"),
            Err(FrameError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn send_frame_sets_length_and_type() {
        let frame = Frame::send("/app/chat", "{\"a\":1}");
        assert_eq!(frame.header(CONTENT_LENGTH), Some("7"));
        assert_eq!(frame.header(CONTENT_TYPE), Some("application/json"));
        assert!(frame.encode().starts_with("SEND\ndestination:/app/chat\n"));
        assert!(frame.encode().ends_with("{\"a\":1}\0"));
    }

    #[test]
    fn encode_escapes_header_values() {
        let encoded = Frame::new(Command::Send).with_header("note", "a:b\nc").encode();
        assert!(encoded.contains("note:a\\cb\\nc\n"));
    }

    #[test]
    fn undefined_escape_rejected() {
        assert!(matches!(unescape("bad\\t"), Err(FrameError::InvalidEscape(_))));
        assert!(matches!(unescape("trailing\\"), Err(FrameError::InvalidEscape(_))));
    }
}
