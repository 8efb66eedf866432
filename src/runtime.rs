// src/runtime.rs
//! Lifecycle: startup ordering, the two concurrent loops, and teardown.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::button::{
    ButtonStateMachine, CommandHandler, CommandIntake, DiscardCommands, EventPublisher,
    PollSummary, Poller,
};
use crate::config::ButtonConfig;
use crate::error::Result;
use crate::util::io::{
    amqp::AmqpBus,
    bus::BusTransport,
    gpio::{GpioInput, SysfsGpio},
    TOPIC_CONTROL, TOPIC_EVENTS,
};
use crate::{log_error, log_info, log_warn};

/// Outcome of a full run, returned once both loops have stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub poll: PollSummary,
    pub commands_drained: usize,
}

/// A button whose GPIO line and broker are acquired and whose topology is
/// declared. Dropping it releases the GPIO line; [`Runtime::run`] also closes
/// the bus.
pub struct Runtime<G: GpioInput + 'static> {
    config: ButtonConfig,
    gpio: G,
    bus: Arc<dyn BusTransport>,
    command_handler: Arc<dyn CommandHandler>,
}

impl Runtime<SysfsGpio> {
    /// Production startup: GPIO, then broker, then topology, then both loops.
    /// Blocks until `token` is cancelled.
    pub async fn launch(config: ButtonConfig, token: CancellationToken) -> Result<RunSummary> {
        let gpio = SysfsGpio::open(&config.gpio_root, config.gpio_pin, config.active_low)?;
        log_info!("Acquired gpio{}", config.gpio_pin);

        let bus = Arc::new(AmqpBus::connect(&config.rmq_server).await?);

        let runtime = Runtime::start(config, gpio, bus).await?;
        runtime.run(token).await
    }
}

impl<G: GpioInput + 'static> Runtime<G> {
    /// Declare the topology on an already connected bus. The bus is closed
    /// if this fails.
    pub async fn start(config: ButtonConfig, gpio: G, bus: Arc<dyn BusTransport>) -> Result<Self> {
        if let Err(e) = bus.declare_topology().await {
            log_error!("Topology declaration failed: {}", e);
            close_bus(bus.as_ref()).await;
            return Err(e);
        }

        Ok(Self {
            config,
            gpio,
            bus,
            command_handler: Arc::new(DiscardCommands),
        })
    }

    pub fn with_command_handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.command_handler = handler;
        self
    }

    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    /// Start command intake, then poll on the current task until `token` is
    /// cancelled. Both loops are stopped and the bus is closed before this
    /// returns, on every path.
    pub async fn run(self, token: CancellationToken) -> Result<RunSummary> {
        let Runtime {
            config,
            gpio,
            bus,
            command_handler,
        } = self;

        let intake = match CommandIntake::new(command_handler)
            .start(bus.as_ref(), TOPIC_CONTROL, token.child_token())
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                log_error!("Command intake failed to start: {}", e);
                close_bus(bus.as_ref()).await;
                return Err(e);
            }
        };

        let machine = ButtonStateMachine::with_min_press(config.button_name.clone(), config.min_press());
        let publisher = EventPublisher::new(bus.clone(), TOPIC_EVENTS);
        let poll = Poller::new(gpio, machine, publisher, config.poll_interval())
            .run(token.clone())
            .await;

        // The poller only returns once cancelled, which also stops intake
        token.cancel();
        let commands_drained = match intake.await {
            Ok(drained) => drained,
            Err(e) => {
                log_warn!("Command intake task ended abnormally: {}", e);
                0
            }
        };

        close_bus(bus.as_ref()).await;
        log_info!("[{}] shut down", config.button_name);

        Ok(RunSummary {
            poll,
            commands_drained,
        })
    }
}

async fn close_bus(bus: &dyn BusTransport) {
    if let Err(e) = bus.close().await {
        log_warn!("Failed to close bus: {}", e);
    }
}

/// Cancel `token` on Ctrl-C. Further interrupts are only logged.
pub fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if token.is_cancelled() {
                log_info!("Interrupt received again, already shutting down");
            } else {
                log_info!("Interrupt received, shutting down");
                token.cancel();
            }
        }
    });
}

impl<G: GpioInput + 'static> std::fmt::Debug for Runtime<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("bus", &"<BusTransport>")
            .field("command_handler", &"<CommandHandler>")
            .finish()
    }
}
