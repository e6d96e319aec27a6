use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};

use pagepress::cdp::CdpEngineFactory;
use pagepress::server::{self, AppState};
use pagepress::{EngineConfig, Viewport};

/// Render web pages into print-ready PDFs over HTTP
#[derive(Parser, Debug)]
#[command(name = "pagepress", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Maximum number of simultaneous browser processes
    #[arg(long, default_value_t = 4)]
    max_renders: usize,

    /// Hard navigation timeout in seconds
    #[arg(long, default_value_t = 60)]
    nav_timeout_secs: u64,

    /// Settle delay after navigation, in milliseconds
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,

    /// Viewport width for the rendering tab
    #[arg(long, default_value_t = 1280)]
    viewport_width: u32,

    /// Viewport height for the rendering tab
    #[arg(long, default_value_t = 720)]
    viewport_height: u32,

    /// Disable the Chrome OS-level sandbox. Only for restricted hosts
    /// (e.g. unprivileged containers) where a sandboxed Chrome cannot run.
    #[arg(long)]
    no_sandbox: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let engine_config = EngineConfig {
        viewport: Viewport {
            width: args.viewport_width,
            height: args.viewport_height,
        },
        nav_timeout_ms: args.nav_timeout_secs.saturating_mul(1_000),
        settle_ms: args.settle_ms,
        sandbox: !args.no_sandbox,
        ..EngineConfig::default()
    };

    if !engine_config.sandbox {
        warn!("Chrome sandbox disabled; every rendered page runs unsandboxed");
    }

    let state = AppState::new(
        Arc::new(CdpEngineFactory),
        engine_config,
        args.max_renders,
    );
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(
        "pagepress listening on {} (max {} concurrent renders)",
        listener.local_addr()?,
        args.max_renders
    );
    axum::serve(listener, app).await?;

    Ok(())
}
