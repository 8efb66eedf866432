// src/button/publisher.rs
//! Press events on the wire: an 8-byte big-endian millisecond count, tagged
//! with the button's content type. Delivery is at most once.

use std::sync::Arc;

use crate::button::PressEvent;
use crate::util::io::bus::BusTransport;
use crate::{log_error, log_info};

pub const PAYLOAD_LEN: usize = 8;

pub fn encode_payload(duration_millis: u64) -> [u8; PAYLOAD_LEN] {
    duration_millis.to_be_bytes()
}

/// Inverse of [`encode_payload`], for subscribers. `None` on a wrong-sized body.
pub fn decode_payload(body: &[u8]) -> Option<u64> {
    let bytes: [u8; PAYLOAD_LEN] = body.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

#[derive(Clone)]
pub struct EventPublisher {
    bus: Arc<dyn BusTransport>,
    topic: String,
}

impl EventPublisher {
    pub fn new(bus: Arc<dyn BusTransport>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Fire and forget. Returns whether the bus accepted the event; a failure
    /// is logged and the event is gone.
    pub async fn publish(&self, event: &PressEvent) -> bool {
        let content_type = event.content_type();
        let payload = encode_payload(event.duration_millis);

        match self.bus.publish(&self.topic, &content_type, &payload).await {
            Ok(()) => {
                log_info!("Sent button press {} ({} ms)", content_type, event.duration_millis);
                true
            }
            Err(e) => {
                log_error!(
                    "Dropping button press {} ({} ms): {}",
                    content_type,
                    event.duration_millis,
                    e
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("bus", &"<BusTransport>")
            .field("topic", &self.topic)
            .finish()
    }
}
