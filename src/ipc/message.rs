use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ProtocolError;

/// Key of the single byte-array argument carried by every frame
pub const ARG1: &str = "ARG1";

/// Message vocabulary shared with the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// To the worker: list run configurations. From the worker: the newline-separated names.
    List,
    /// Run the named configuration
    Run,
    /// Terminate the running process
    Terminate,
    /// To the worker: append to process input. From the worker: append to output.
    Append,
    /// Trace text from the worker
    Trace,
}

impl MessageKind {
    /// Integer tag used on the wire
    pub fn tag(self) -> u32 {
        match self {
            MessageKind::List => 1,
            MessageKind::Run => 2,
            MessageKind::Terminate => 3,
            MessageKind::Append => 4,
            MessageKind::Trace => 5,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(MessageKind::List),
            2 => Some(MessageKind::Run),
            3 => Some(MessageKind::Terminate),
            4 => Some(MessageKind::Append),
            5 => Some(MessageKind::Trace),
            _ => None,
        }
    }
}

/// A single protocol message; the payload is opaque bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(kind: MessageKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Message with an empty payload
    pub fn empty(kind: MessageKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Payload decoded as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Wire representation of a message, one JSON object per line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub what: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Frame {
    /// Build an outbound frame addressed back to `reply_to`
    pub fn outbound(message: &Message, reply_to: &str) -> Self {
        let mut data = BTreeMap::new();
        data.insert(ARG1.to_string(), message.payload.clone());

        Self {
            what: message.kind.tag(),
            reply_to: Some(reply_to.to_string()),
            data,
        }
    }

    /// Encode as a single newline-terminated line
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(line.trim_end())?)
    }

    /// Convert an inbound frame into a message. Any reply address is ignored.
    pub fn into_message(mut self) -> Result<Message, ProtocolError> {
        let kind = MessageKind::from_tag(self.what).ok_or(ProtocolError::UnknownKind(self.what))?;
        let payload = self
            .data
            .remove(ARG1)
            .ok_or(ProtocolError::MissingArgument(ARG1))?;

        Ok(Message { kind, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_wire_values() {
        assert_eq!(MessageKind::List.tag(), 1);
        assert_eq!(MessageKind::Run.tag(), 2);
        assert_eq!(MessageKind::Terminate.tag(), 3);
        assert_eq!(MessageKind::Append.tag(), 4);
        assert_eq!(MessageKind::Trace.tag(), 5);
        assert_eq!(MessageKind::from_tag(0), None);
        assert_eq!(MessageKind::from_tag(6), None);
    }

    #[test]
    fn test_outbound_frame_layout() {
        let message = Message::new(MessageKind::Run, "hello");
        let line = Frame::outbound(&message, "42-0").encode().unwrap();

        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["what"], 2);
        assert_eq!(value["reply_to"], "42-0");
        assert_eq!(value["data"]["ARG1"], serde_json::json!([104, 101, 108, 108, 111]));
    }

    #[test]
    fn test_inbound_frame_without_reply_address() {
        let frame = Frame::decode(r#"{"what":4,"data":{"ARG1":[111,107]}}"#).unwrap();
        assert_eq!(frame.reply_to, None);

        let message = frame.into_message().unwrap();
        assert_eq!(message.kind, MessageKind::Append);
        assert_eq!(message.text(), "ok");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let frame = Frame::decode(r#"{"what":9,"data":{"ARG1":[]}}"#).unwrap();
        assert!(matches!(
            frame.into_message(),
            Err(ProtocolError::UnknownKind(9))
        ));
    }

    #[test]
    fn test_missing_argument_is_rejected() {
        let frame = Frame::decode(r#"{"what":5}"#).unwrap();
        assert!(matches!(
            frame.into_message(),
            Err(ProtocolError::MissingArgument(ARG1))
        ));
    }

    #[test]
    fn test_malformed_line() {
        assert!(matches!(
            Frame::decode("not json"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_text_is_lossy() {
        let message = Message::new(MessageKind::Trace, vec![0x61, 0xff, 0x62]);
        assert_eq!(message.text(), "a\u{fffd}b");
    }
}
