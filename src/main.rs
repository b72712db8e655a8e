mod classify;
mod config;
mod diff;
mod frame;
mod gate;
mod looper;
mod notify;
mod pipeline;
mod sampler;

use config::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        camera = config.camera.name,
        url = config.camera.snapshot_url,
        poll_interval_ms = config.camera.poll_interval_ms,
        diff_threshold = config.detection.diff_threshold,
        cooldown_ms = config.detection.cooldown_ms,
        confidence_threshold = config.classifier.confidence_threshold,
        recipients = config.smtp.recipients.len(),
        "starting snapwatch"
    );

    let source = match sampler::HttpSnapshotSource::new(config.camera.snapshot_url.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to build snapshot client");
            std::process::exit(1);
        }
    };
    let classifier = match classify::HttpClassifier::new(&config.classifier) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to build classifier client");
            std::process::exit(1);
        }
    };
    let notifier = match notify::SmtpNotifier::new(&config.smtp) {
        Ok(n) => n,
        Err(e) => {
            error!(error = %e, "failed to build SMTP transport");
            std::process::exit(1);
        }
    };

    let pipeline = pipeline::DetectionPipeline::new(
        sampler::Sampler::new(source),
        classifier,
        notifier,
        config.camera.name.clone(),
        config.detection.clone(),
        config.classifier.confidence_threshold,
    );
    let mut controller = looper::LoopController::new(
        pipeline,
        Duration::from_millis(config.camera.poll_interval_ms),
    );

    tokio::select! {
        _ = controller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, stopping");
        }
    }
}
