mod app;
mod backend;
mod config;
mod error;
mod event;
mod logging;
mod protocol;
mod session;
mod theme;
mod transcript;

use anyhow::Context as _;
use app::AgentDeskApp;
use backend::{EventSink, HttpAgentApi};
use clap::Parser;
use config::Config;
use eframe::egui;
use session::controller::SessionController;
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::info;

/// Desktop client for a remote computer-use agent.
#[derive(Debug, Parser)]
#[command(name = "agentdesk", version)]
struct Args {
    /// Config file (defaults to ~/.agentdesk/config.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend base URL, overriding the config file and environment.
    #[arg(long)]
    base_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref(), args.base_url.as_deref())
        .context("failed to load configuration")?;
    logging::init(&config.log_level);
    info!(base_url = %config.base_url, "starting agentdesk");

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("agentdesk-runtime")
        .build()
        .context("failed to start async runtime")?;
    let runtime_handle = runtime.handle().clone();
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "AgentDesk",
        native_options,
        Box::new(move |creation_context| {
            let sink = EventSink::new(tx, Some(creation_context.egui_ctx.clone()));
            let api = HttpAgentApi::new(&config, sink, runtime_handle)?;
            let mut controller = SessionController::new(api);
            controller.start();
            Ok(Box::new(AgentDeskApp::new(
                rx,
                controller,
                config.base_url.to_string(),
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("ui terminated with an error: {err}"))?;

    Ok(())
}
