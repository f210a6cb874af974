//! Bidirectional push channel to the backend.
//!
//! Frames are `{event, payload}` pairs. Outbound frames go to a [`Transport`];
//! inbound frames are routed to the handler registered for their event name.
//! Reconnection belongs to the transport, not to this layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::model::LocationUpdate;
use crate::prelude::ChannelError;

pub const LOCATION_UPDATE: &str = "location_update";
pub const EV_STATIONS: &str = "ev_stations";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

impl Frame {
    pub fn encode<P: Serialize>(event: &str, payload: &P) -> Result<Self, ChannelError> {
        let payload = serde_json::to_value(payload).map_err(|err| ChannelError::Encode {
            event: event.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            event: event.to_string(),
            payload,
        })
    }

    pub fn decode<P: for<'de> Deserialize<'de>>(&self) -> Result<P, ChannelError> {
        serde_json::from_value(self.payload.clone()).map_err(|err| ChannelError::Decode {
            event: self.event.clone(),
            reason: err.to_string(),
        })
    }
}

/// Messages the session asks the channel to send.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    LocationUpdate(LocationUpdate),
}

impl OutboundMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundMessage::LocationUpdate(_) => LOCATION_UPDATE,
        }
    }

    pub fn to_frame(&self) -> Result<Frame, ChannelError> {
        match self {
            OutboundMessage::LocationUpdate(update) => Frame::encode(self.event_name(), update),
        }
    }
}

pub trait Transport: Send {
    fn send(&mut self, frame: Frame) -> Result<(), ChannelError>;
}

/// Transport backed by an unbounded in-process queue.
pub struct MpscTransport {
    sender: mpsc::UnboundedSender<Frame>,
}

impl Transport for MpscTransport {
    fn send(&mut self, frame: Frame) -> Result<(), ChannelError> {
        self.sender.send(frame).map_err(|_| ChannelError::Closed)
    }
}

/// Creates a transport and the receiving end the peer reads from.
pub fn in_process() -> (MpscTransport, mpsc::UnboundedReceiver<Frame>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (MpscTransport { sender }, receiver)
}

type Handler = Box<dyn FnMut(&Frame) -> Result<(), ChannelError> + Send>;

pub struct ConnectionChannel {
    transport: Box<dyn Transport>,
    handlers: HashMap<String, Handler>,
}

impl ConnectionChannel {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Box::new(transport),
            handlers: HashMap::new(),
        }
    }

    pub fn emit<P: Serialize>(&mut self, event: &str, payload: &P) -> Result<(), ChannelError> {
        self.transport.send(Frame::encode(event, payload)?)
    }

    pub fn send(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.transport.send(message.to_frame()?)
    }

    /// Registers the handler for an inbound event, replacing any previous one.
    pub fn on<F>(&mut self, event: &str, handler: F)
    where
        F: FnMut(&Frame) -> Result<(), ChannelError> + Send + 'static,
    {
        self.handlers.insert(event.to_string(), Box::new(handler));
    }

    /// Routes an inbound frame. Frames without a handler are ignored.
    pub fn deliver(&mut self, frame: &Frame) -> Result<bool, ChannelError> {
        match self.handlers.get_mut(&frame.event) {
            Some(handler) => handler(frame).map(|_| true),
            None => Ok(false),
        }
    }
}
