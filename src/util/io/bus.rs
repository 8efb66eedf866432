use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, RwLock};

use crate::error::{ButtonError, Result};
use crate::log_debug;
use crate::util::io::get_all_topics;

#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub content_type: String,
    pub payload: Vec<u8>,
    pub timestamp: u64,
}

impl BusMessage {
    pub fn new(topic: String, content_type: String, payload: Vec<u8>) -> Self {
        Self {
            topic,
            content_type,
            payload,
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }
}

pub type BusReceiver = mpsc::UnboundedReceiver<BusMessage>;
pub type BusSender = mpsc::UnboundedSender<BusMessage>;

/// What the button needs from a message broker.
///
/// Implementations bound their own network timeouts; callers never wrap these
/// in extra deadlines.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Declare the control and events fanout topics.
    async fn declare_topology(&self) -> Result<()>;

    async fn publish(&self, topic: &str, content_type: &str, payload: &[u8]) -> Result<()>;

    /// Open a subscription owned by the caller. Messages count as consumed
    /// as soon as they are delivered.
    async fn subscribe(&self, topic: &str) -> Result<BusReceiver>;

    async fn close(&self) -> Result<()>;
}

/// In-process fanout broker. Every subscriber of a topic receives its own copy
/// of each message.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    subscribers: Arc<RwLock<HashMap<String, Vec<BusSender>>>>,
    declared: Arc<RwLock<HashSet<String>>>,
    published: Arc<Mutex<Vec<BusMessage>>>,
    fail_publishes: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail until switched back.
    pub fn set_fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Messages accepted so far, oldest first.
    pub fn published(&self) -> Vec<BusMessage> {
        self.published
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn is_declared(&self, topic: &str) -> bool {
        self.declared.read().await.contains(topic)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ButtonError::Bus("bus is closed".into()));
        }
        Ok(())
    }

    async fn ensure_declared(&self, topic: &str) -> Result<()> {
        if !self.is_declared(topic).await {
            return Err(ButtonError::Bus(format!("topic '{}' not declared", topic)));
        }
        Ok(())
    }
}

#[async_trait]
impl BusTransport for MessageBus {
    async fn declare_topology(&self) -> Result<()> {
        self.ensure_open()?;
        let mut declared = self.declared.write().await;
        declared.extend(get_all_topics());
        Ok(())
    }

    async fn publish(&self, topic: &str, content_type: &str, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.ensure_declared(topic).await?;
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(ButtonError::Bus("publish rejected".into()));
        }

        let message = BusMessage::new(topic.to_string(), content_type.to_string(), payload.to_vec());
        log_debug!("bus publish topic={} content_type={}", topic, content_type);

        if let Ok(mut published) = self.published.lock() {
            published.push(message.clone());
        }

        let mut subscribers = self.subscribers.write().await;
        if let Some(subs) = subscribers.get_mut(topic) {
            // Receivers that went away are pruned here
            subs.retain(|subscriber| subscriber.send(message.clone()).is_ok());
        }

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<BusReceiver> {
        self.ensure_open()?;
        self.ensure_declared(topic).await?;
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut subscribers = self.subscribers.write().await;
        subscribers
            .entry(topic.to_string())
            .or_insert_with(Vec::new)
            .push(sender);

        Ok(receiver)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the senders ends every open subscription
        self.subscribers.write().await.clear();
        Ok(())
    }
}
