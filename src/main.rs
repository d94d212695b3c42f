use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use neuronote::notes::{analyze_kind, NoteKind};
use neuronote::{
    create_router, AppState, Config, DeliveryChannel, NatsClassifier, PdfReportRenderer, ReportInput,
    ReportRenderer, SmtpDelivery,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neuronote")]
#[command(about = "Webcam emotion sampling, note analysis and PDF reports")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/neuronote")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Print the ICE configuration served to browsers
    IceConfig,
    /// Render a report for a note file, optionally emailing it
    Report {
        /// Note to analyze (PDF, JPEG or PNG)
        #[arg(short, long)]
        note: PathBuf,

        /// Recipient address
        #[arg(short, long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::IceConfig => {
            let ice = cfg.ice.resolve_credentials()?;
            println!("{}", serde_json::to_string_pretty(&ice)?);
            Ok(())
        }
        Command::Report { note, email } => report(cfg, note, email).await,
    }
}

fn build_delivery(cfg: &Config) -> Option<Arc<dyn DeliveryChannel>> {
    let smtp = cfg.smtp.as_ref()?;
    match SmtpDelivery::from_config(smtp) {
        Ok(delivery) => Some(Arc::new(delivery)),
        Err(e) => {
            warn!("Email delivery disabled: {}", e);
            None
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    info!("NeuroNote v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let classifier = NatsClassifier::connect(
        &cfg.classifier.nats_url,
        cfg.classifier.subject.clone(),
        cfg.classifier.timeout(),
    )
    .await
    .context("Failed to start emotion classifier")?;

    let report_dir = cfg.report.output_dir();
    let renderer = PdfReportRenderer::new(report_dir.clone(), cfg.report.file_name.clone());
    let delivery = build_delivery(&cfg);
    let ice = cfg.ice.clone().resolve_credentials()?;

    let state = AppState::new(
        Arc::new(classifier),
        Arc::new(renderer),
        delivery,
        ice,
        cfg.session_template()?,
        report_dir,
    )
    .with_max_ended_sessions(cfg.service.max_ended_sessions);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn report(cfg: Config, note: PathBuf, email: Option<String>) -> Result<()> {
    let extension = note
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(kind) = NoteKind::from_extension(&extension) else {
        bail!("Unsupported note type: {} (expected PDF, JPEG or PNG)", note.display());
    };

    if !note.exists() {
        bail!("Note not found: {}", note.display());
    }

    let clock_secs = chrono::Utc::now().timestamp().max(0) as u64;
    let mut analysis = analyze_kind(kind, clock_secs);
    if let Some(name) = note.file_name() {
        analysis = analysis.with_file_name(name.to_string_lossy());
    }

    let renderer = PdfReportRenderer::new(cfg.report.output_dir(), cfg.report.file_name.clone());
    let input = ReportInput {
        note_analysis: Some(analysis),
        emotion_summary: None,
    };

    let artifact = tokio::task::spawn_blocking(move || renderer.render(&input))
        .await
        .context("Report task panicked")?
        .context("Failed to render report")?;

    info!("Report generated: {}", artifact.path.display());

    if let Some(email) = email {
        let smtp = cfg
            .smtp
            .as_ref()
            .context("No [smtp] section configured; cannot send email")?;
        let delivery = SmtpDelivery::from_config(smtp)?;
        let receipt = delivery.deliver(&email, &artifact).await?;
        info!("{} to {}", receipt.detail, receipt.recipient);
    }

    Ok(())
}
