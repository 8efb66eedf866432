use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::util::io::gpio::GpioInput;
use crate::{log_info, log_warn};

use super::{PollSummary, Poller};

impl<G: GpioInput> Poller<G> {
    /// Poll until `token` is cancelled. A press still held at that point
    /// produces no event.
    pub async fn run(mut self, token: CancellationToken) -> PollSummary {
        let mut summary = PollSummary::default();
        // Consecutive failed reads; only the first and the recovery are warned
        let mut failing_reads: u64 = 0;
        log_info!(
            "[{}] polling every {} ms",
            self.machine.button_name(),
            self.interval.as_millis()
        );

        loop {
            if token.is_cancelled() {
                break;
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let sample = self.gpio.sample().await;
            summary.ticks += 1;
            match &sample {
                Err(e) => {
                    summary.read_errors += 1;
                    failing_reads += 1;
                    if failing_reads == 1 {
                        log_warn!(
                            "[{}] GPIO read failing, skipping ticks until it recovers: {}",
                            self.machine.button_name(),
                            e
                        );
                    }
                }
                Ok(_) if failing_reads > 0 => {
                    log_warn!(
                        "[{}] GPIO read recovered after {} failed tick(s)",
                        self.machine.button_name(),
                        failing_reads
                    );
                    failing_reads = 0;
                }
                Ok(_) => {}
            }

            if let Some(event) = self.machine.on_sample(sample, Instant::now()) {
                summary.events += 1;
                if !self.publisher.publish(&event).await {
                    summary.dropped += 1;
                }
            }
        }

        if self.machine.is_pressed() {
            log_warn!(
                "[{}] stopped during a press, no event emitted",
                self.machine.button_name()
            );
        }
        log_info!(
            "[{}] polling stopped after {} tick(s), {} press(es), {} read error(s)",
            self.machine.button_name(),
            summary.ticks,
            summary.events,
            summary.read_errors
        );
        summary
    }
}
