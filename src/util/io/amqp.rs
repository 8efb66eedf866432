// src/util/io/amqp.rs
//! AMQP 0-9-1 broker transport. Topics map to durable fanout exchanges;
//! every subscription gets its own exclusive, server-named queue.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::{
    options::{
        BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
        QueueDeclareOptions,
    },
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::util::io::{
    bus::{BusMessage, BusReceiver, BusTransport},
    get_all_topics,
};
use crate::{log_debug, log_info, log_warn};

const REPLY_SUCCESS: u16 = 200;

pub struct AmqpBus {
    connection: Connection,
    channel: Channel,
}

impl AmqpBus {
    /// Connect and open the single channel used for both directions.
    pub async fn connect(uri: &str) -> Result<Self> {
        log_info!("Connecting to broker");
        let connection = Connection::connect(uri, ConnectionProperties::default()).await?;

        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                let _ = connection.close(REPLY_SUCCESS, "channel setup failed").await;
                return Err(e.into());
            }
        };

        log_info!("Broker connection established");
        Ok(Self { connection, channel })
    }
}

#[async_trait]
impl BusTransport for AmqpBus {
    async fn declare_topology(&self) -> Result<()> {
        for topic in get_all_topics() {
            self.channel
                .exchange_declare(
                    &topic,
                    ExchangeKind::Fanout,
                    ExchangeDeclareOptions {
                        durable: true,
                        ..ExchangeDeclareOptions::default()
                    },
                    FieldTable::default(),
                )
                .await?;
            log_info!("Declared fanout exchange {}", topic);
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, content_type: &str, payload: &[u8]) -> Result<()> {
        let properties = BasicProperties::default().with_content_type(content_type.into());
        self.channel
            .basic_publish(topic, "", BasicPublishOptions::default(), payload, properties)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<BusReceiver> {
        let queue = self
            .channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        let queue_name = queue.name().as_str().to_string();

        self.channel
            .queue_bind(
                &queue_name,
                topic,
                "",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let consumer_tag = format!("gpiobutton-{}", std::process::id());
        let mut consumer = self
            .channel
            .basic_consume(
                &queue_name,
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        log_info!("Subscribed to {} via queue {}", topic, queue_name);

        let (sender, receiver) = mpsc::unbounded_channel();
        let topic = topic.to_string();
        tokio::spawn(async move {
            while let Some(delivery) = consumer.next().await {
                match delivery {
                    Ok(delivery) => {
                        let content_type = delivery
                            .properties
                            .content_type()
                            .as_ref()
                            .map(|value| value.as_str().to_string())
                            .unwrap_or_default();
                        let message = BusMessage::new(topic.clone(), content_type, delivery.data);
                        if sender.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log_warn!("Consumer on {} stopped: {}", topic, e);
                        break;
                    }
                }
            }
            log_debug!("Consumer forwarding task for {} finished", topic);
        });

        Ok(receiver)
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "shutdown").await {
            log_warn!("Failed to close broker channel: {}", e);
        }
        self.connection.close(REPLY_SUCCESS, "shutdown").await?;
        log_info!("Broker connection closed");
        Ok(())
    }
}

impl std::fmt::Debug for AmqpBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmqpBus")
            .field("connection", &"<Connection>")
            .field("channel", &self.channel.id())
            .finish()
    }
}
