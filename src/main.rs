//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; answer policy lives in SessionService.

use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wa_insight::adapters::backend::HttpBackend;
use wa_insight::adapters::ui::{TerminalRenderer, TuiInputPort};
use wa_insight::adapters::whatsapp::{ExportParser, LocalExportSource};
use wa_insight::ports::{AiPort, ChatSourcePort, InputPort, RenderPort};
use wa_insight::shared::config::AppConfig;
use wa_insight::usecases::SessionService;

/// Browse and analyze WhatsApp chat exports.
#[derive(Debug, Parser)]
#[command(name = "wa-insight", version, about)]
struct Cli {
    /// Export to load (.zip or .txt). With --ask, answers once and exits.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Question to answer about --file.
    #[arg(short, long, requires = "file")]
    ask: Option<String>,

    /// Parse locally and answer with the built-in analyzer only.
    #[arg(long)]
    offline: bool,

    /// Analysis backend root URL.
    #[arg(long, env = "WA_INSIGHT_BACKEND_URL")]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Ok(path) = &env_loaded {
        info!(path = %path.display(), "loaded .env");
    }

    let mut cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults");
        AppConfig::default()
    });
    if cli.offline {
        cfg.offline = Some(true);
    }
    if cli.backend_url.is_some() {
        cfg.backend_url = cli.backend_url.clone();
    }

    // --- Chat source + assistant: local parser offline, backend otherwise ---
    let (source, ai): (Arc<dyn ChatSourcePort>, Option<Arc<dyn AiPort>>) = if cfg.is_offline() {
        info!(owners = ?cfg.owner_names(), "offline mode: local parsing and analysis");
        let parser = ExportParser::new(cfg.owner_names());
        (Arc::new(LocalExportSource::new(parser)), None)
    } else {
        let timeout_secs = cfg.request_timeout_secs_or_default();
        info!(
            url = %cfg.backend_url_or_default(),
            timeout_secs,
            "using analysis backend"
        );
        let backend = Arc::new(
            HttpBackend::new(
                cfg.backend_url_or_default(),
                cfg.username_or_default(),
                Duration::from_secs(timeout_secs),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        );
        (
            Arc::clone(&backend) as Arc<dyn ChatSourcePort>,
            Some(backend as Arc<dyn AiPort>),
        )
    };

    let sessions = Arc::new(SessionService::new(source, ai));
    let renderer: Arc<dyn RenderPort> = Arc::new(TerminalRenderer::new());
    let tui = TuiInputPort::new(Arc::clone(&sessions), renderer);

    // --- One-shot: --file + --ask ---
    if let (Some(file), Some(question)) = (&cli.file, &cli.ask) {
        tui.run_once(file, question)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        return Ok(());
    }

    wa_insight::adapters::ui::init_ui();

    // --- Interactive: optional preload, then main menu ---
    if let Some(file) = &cli.file {
        if let Err(e) = sessions.load_export(file).await {
            warn!(error = %e, file = %file.display(), "preload failed");
        }
    }

    let input_port: Arc<dyn InputPort> = Arc::new(tui);
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
