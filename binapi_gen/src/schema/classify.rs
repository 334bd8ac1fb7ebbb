use super::{CLIENT_INDEX_FIELD, CONTEXT_FIELD};
use binapi_types::MessageDef;
use serde_derive::Serialize;
use std::fmt;

/* Role of a message in the request/reply/event framing convention */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
  Request,
  Reply,
  Event,
  Other,
}

impl MessageType {
  pub fn as_str(self) -> &'static str {
    match self {
      MessageType::Request => "request",
      MessageType::Reply => "reply",
      MessageType::Event => "event",
      MessageType::Other => "other",
    }
  }

  /* Variant name used in emitted code */
  pub fn variant_name(self) -> &'static str {
    match self {
      MessageType::Request => "Request",
      MessageType::Reply => "Reply",
      MessageType::Event => "Event",
      MessageType::Other => "Other",
    }
  }
}

impl fmt::Display for MessageType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/* Classify from the declared field names, message-id field included.
 *
 * Index 1 == client_index marks an event, upgraded to a request when
 * index 2 == context. Index 1 == context marks a reply.
 */
pub fn classify_fields<'a>(names: impl IntoIterator<Item = &'a str>) -> MessageType {
  let mut message_type = MessageType::Other;
  let mut was_client_index = false;

  for (i, name) in names.into_iter().enumerate().take(3) {
    match i {
      1 if name == CLIENT_INDEX_FIELD => {
        message_type = MessageType::Event;
        was_client_index = true;
      }
      1 if name == CONTEXT_FIELD => message_type = MessageType::Reply,
      2 if was_client_index && name == CONTEXT_FIELD => message_type = MessageType::Request,
      _ => {}
    }
  }

  message_type
}

pub fn classify_message(message: &MessageDef) -> MessageType {
  classify_fields(message.fields.iter().map(|f| f.name.as_str()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn framing_positions_decide_the_type() {
    assert_eq!(classify_fields(["_vl_msg_id"]), MessageType::Other);
    assert_eq!(
      classify_fields(["_vl_msg_id", "client_index", "context"]),
      MessageType::Request
    );
    assert_eq!(classify_fields(["_vl_msg_id", "context"]), MessageType::Reply);
    assert_eq!(classify_fields(["_vl_msg_id", "sw_if_index"]), MessageType::Other);
    assert_eq!(classify_fields(["_vl_msg_id", "client_index", "pid"]), MessageType::Event);
    assert_eq!(classify_fields(Vec::<&str>::new()), MessageType::Other);
  }

  #[test]
  fn names_outside_the_framing_positions_are_ignored() {
    assert_eq!(classify_fields(["context", "_vl_msg_id"]), MessageType::Other);
    assert_eq!(
      classify_fields(["_vl_msg_id", "retval", "context"]),
      MessageType::Other
    );
    assert_eq!(
      classify_fields(["_vl_msg_id", "context", "client_index"]),
      MessageType::Reply
    );
  }
}
