use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use gpio_button_mq::util::log::{debug_enabled, init_file_logger};
use gpio_button_mq::{log_info, runtime, ButtonConfig, Runtime};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        let program = args.first().map(String::as_str).unwrap_or("gpio-button-mq");
        eprintln!("Usage: {} <config file>", program);
        std::process::exit(2);
    }

    tracing_subscriber::fmt()
        .with_max_level(if debug_enabled() { Level::DEBUG } else { Level::INFO })
        .init();
    color_eyre::install()?;

    let config = ButtonConfig::load_from_path(Path::new(&args[1]))?;
    if let Some(log_dir) = &config.log_dir {
        init_file_logger(log_dir)?;
    }
    log_info!("Starting button '{}' on gpio{}", config.button_name, config.gpio_pin);

    let token = CancellationToken::new();
    runtime::cancel_on_interrupt(token.clone());

    let summary = Runtime::launch(config, token).await?;
    log_info!(
        "Exiting after {} press(es), {} dropped, {} GPIO read error(s)",
        summary.poll.events,
        summary.poll.dropped,
        summary.poll.read_errors
    );
    Ok(())
}
