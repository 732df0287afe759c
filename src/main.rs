//! `chessboard-live`: show the board published on `chess/board/fullstate`.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use chessview::logging::init_logging;
use chessview::{Args, Coordinator, MqttSource, Renderer, Surface, ViewerConfig, ViewerError};

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging().context("failed to open log file")?;

    let config = ViewerConfig::from(args);
    info!(broker = %config.broker, topic = %config.listener.topic, "starting");

    let source = MqttSource::new(&config.broker, &config.listener);
    let surface = Surface::enter(config.alternate_screen).map_err(ViewerError::from)?;
    let renderer = Renderer::new(io::stdout(), config.refresh_per_second);
    let mut coordinator = Coordinator::new(config, renderer).with_surface(surface);

    let cancel = coordinator.cancel_token();
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .map_err(ViewerError::from)?;

    coordinator.start(source)?;
    let outcome = coordinator.run();

    // The surface is released by now; messages land on the normal screen.
    if outcome.is_failure() {
        eprintln!("{outcome}");
    } else {
        println!("{outcome}");
    }
    Ok(outcome.exit_code())
}
