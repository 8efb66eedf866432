// src/button/command.rs
//! Control topic intake. Nothing is interpreted yet; every message goes to a
//! [`CommandHandler`], and the default one drops it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::util::io::bus::{BusMessage, BusReceiver, BusTransport};
use crate::{log_debug, log_info, log_warn};

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Must return promptly; the drain loop awaits it before the next message.
    async fn handle(&self, message: &BusMessage);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardCommands;

#[async_trait]
impl CommandHandler for DiscardCommands {
    async fn handle(&self, message: &BusMessage) {
        log_debug!(
            "Ignoring control message received at {} ({} bytes, content_type={:?})",
            message.timestamp,
            message.payload.len(),
            message.content_type
        );
    }
}

pub struct CommandIntake {
    handler: Arc<dyn CommandHandler>,
}

impl CommandIntake {
    pub fn new(handler: Arc<dyn CommandHandler>) -> Self {
        Self { handler }
    }

    /// Subscribe to `topic` and drain it on its own task until `token` is
    /// cancelled. The join handle yields the number of messages drained.
    pub async fn start(
        self,
        bus: &dyn BusTransport,
        topic: &str,
        token: CancellationToken,
    ) -> Result<JoinHandle<usize>> {
        let receiver = bus.subscribe(topic).await?;
        log_info!("Command intake listening on {}", topic);
        Ok(tokio::spawn(async move { self.run(receiver, token).await }))
    }

    pub async fn run(&self, mut receiver: BusReceiver, token: CancellationToken) -> usize {
        let mut drained = 0;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                message = receiver.recv() => match message {
                    Some(message) => {
                        self.handler.handle(&message).await;
                        drained += 1;
                    }
                    None => {
                        log_warn!("Control subscription closed");
                        break;
                    }
                },
            }
        }

        log_info!("Command intake stopped after {} message(s)", drained);
        drained
    }
}

impl std::fmt::Debug for CommandIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandIntake")
            .field("handler", &"<CommandHandler>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::io::bus::MessageBus;
    use crate::util::io::TOPIC_CONTROL;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl CommandHandler for Recorder {
        async fn handle(&self, message: &BusMessage) {
            self.seen.lock().unwrap().push(message.payload.clone());
        }
    }

    #[tokio::test]
    async fn test_messages_reach_handler() {
        let bus = MessageBus::new();
        bus.declare_topology().await.unwrap();
        let recorder = Arc::new(Recorder::default());
        let token = CancellationToken::new();

        let handle = CommandIntake::new(recorder.clone())
            .start(&bus, TOPIC_CONTROL, token.clone())
            .await
            .unwrap();

        bus.publish(TOPIC_CONTROL, "text/plain", b"blink").await.unwrap();
        bus.publish(TOPIC_CONTROL, "text/plain", b"reset").await.unwrap();
        while recorder.seen.lock().unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }
        token.cancel();

        assert_eq!(handle.await.unwrap(), 2);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![b"blink".to_vec(), b"reset".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_idle_intake() {
        let bus = MessageBus::new();
        bus.declare_topology().await.unwrap();
        let token = CancellationToken::new();

        let handle = CommandIntake::new(Arc::new(DiscardCommands))
            .start(&bus, TOPIC_CONTROL, token.clone())
            .await
            .unwrap();
        token.cancel();

        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_subscription_ends_intake() {
        let bus = MessageBus::new();
        bus.declare_topology().await.unwrap();

        let handle = CommandIntake::new(Arc::new(DiscardCommands))
            .start(&bus, TOPIC_CONTROL, CancellationToken::new())
            .await
            .unwrap();
        bus.publish(TOPIC_CONTROL, "text/plain", b"blink").await.unwrap();
        bus.publish(TOPIC_CONTROL, "application/json", b"{}").await.unwrap();
        bus.close().await.unwrap();

        // Queued messages are still drained and discarded before the end
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_failure_is_reported() {
        let bus = MessageBus::new();

        let result = CommandIntake::new(Arc::new(DiscardCommands))
            .start(&bus, TOPIC_CONTROL, CancellationToken::new())
            .await;

        assert!(result.is_err());
    }
}
