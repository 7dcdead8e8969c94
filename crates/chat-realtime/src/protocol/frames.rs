//! Gateway frame format
//!
//! Every frame is a JSON object `{op, d, t?}`. Outbound frames are built from
//! typed payloads; inbound frames are decoded once into [`ServerFrame`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{
    AuthPayload, ChannelCreatePayload, ChannelDeletePayload, ClientOp, EventType,
    HeartbeatPayload, MessageCreatePayload, MessageDeletePayload, ServerOp, SubscribePayload,
};
use crate::error::FrameError;

/// Frames the client sends
#[derive(Debug, Clone)]
pub enum ClientFrame {
    Auth(AuthPayload),
    Heartbeat(HeartbeatPayload),
    Subscribe(SubscribePayload),
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    op: ClientOp,
    d: &'a T,
}

impl ClientFrame {
    /// Create an Auth frame (op=1)
    #[must_use]
    pub fn auth(token: impl Into<String>) -> Self {
        Self::Auth(AuthPayload {
            token: token.into(),
        })
    }

    /// Create a Heartbeat frame (op=2)
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::Heartbeat(HeartbeatPayload::default())
    }

    /// Create a Subscribe frame (op=5)
    #[must_use]
    pub fn subscribe(payload: SubscribePayload) -> Self {
        Self::Subscribe(payload)
    }

    /// Op code of this frame
    #[must_use]
    pub fn op(&self) -> ClientOp {
        match self {
            Self::Auth(_) => ClientOp::Auth,
            Self::Heartbeat(_) => ClientOp::Heartbeat,
            Self::Subscribe(_) => ClientOp::Subscribe,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, FrameError> {
        let op = self.op();
        let json = match self {
            Self::Auth(d) => serde_json::to_string(&Envelope { op, d }),
            Self::Heartbeat(d) => serde_json::to_string(&Envelope { op, d }),
            Self::Subscribe(d) => serde_json::to_string(&Envelope { op, d }),
        }?;
        Ok(json)
    }
}

/// Frames the server sends, decoded
#[derive(Debug, Clone)]
pub enum ServerFrame {
    /// op 1
    Hello { heartbeat_interval_ms: u64 },
    /// op 0 with no known `t`
    MessageCreate(Box<MessageCreatePayload>),
    /// op 0, t 106
    ChannelCreate(Box<ChannelCreatePayload>),
    /// op 0, t 109
    ChannelDelete(ChannelDeletePayload),
    /// op 0, t 107
    MessageDelete(MessageDeletePayload),
    /// Any op code the client does not handle
    Unhandled { op: u64 },
}

impl ServerFrame {
    /// Decode a text frame.
    ///
    /// Integers are kept as exact `u64` values throughout.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let Value::Object(mut frame) = serde_json::from_str::<Value>(text)? else {
            return Err(FrameError::NotAnObject);
        };

        let op = frame
            .get("op")
            .and_then(Value::as_u64)
            .ok_or(FrameError::MissingOpCode)?;
        let data = frame.remove("d").unwrap_or(Value::Null);

        match ServerOp::from_u64(op) {
            Some(ServerOp::Hello) => decode_hello(&data),
            Some(ServerOp::Event) => {
                let event_type = frame
                    .get("t")
                    .and_then(Value::as_u64)
                    .and_then(EventType::from_u64);

                match event_type {
                    None => {
                        let payload: MessageCreatePayload = payload("message create", data)?;
                        if let Some(field) = payload.message.zero_id_field() {
                            return Err(FrameError::ZeroId {
                                kind: "message create",
                                field,
                            });
                        }
                        Ok(Self::MessageCreate(Box::new(payload)))
                    }
                    Some(EventType::ChannelCreate) => {
                        Ok(Self::ChannelCreate(Box::new(payload("channel create", data)?)))
                    }
                    Some(EventType::ChannelDelete) => {
                        Ok(Self::ChannelDelete(payload("channel delete", data)?))
                    }
                    Some(EventType::MessageDelete) => {
                        Ok(Self::MessageDelete(payload("message delete", data)?))
                    }
                }
            }
            None => Ok(Self::Unhandled { op }),
        }
    }

    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::MessageCreate(_) => "message create",
            Self::ChannelCreate(_) => "channel create",
            Self::ChannelDelete(_) => "channel delete",
            Self::MessageDelete(_) => "message delete",
            Self::Unhandled { .. } => "unhandled",
        }
    }
}

fn payload<T: DeserializeOwned>(kind: &'static str, data: Value) -> Result<T, FrameError> {
    serde_json::from_value(data).map_err(|source| FrameError::InvalidPayload { kind, source })
}

fn decode_hello(data: &Value) -> Result<ServerFrame, FrameError> {
    let interval = data
        .get("heartbeat_interval")
        .and_then(Value::as_f64)
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .ok_or(FrameError::InvalidHeartbeatInterval)?;

    Ok(ServerFrame::Hello {
        heartbeat_interval_ms: interval.ceil() as u64,
    })
}
