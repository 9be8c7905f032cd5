//! Provisioning and demo entrypoint: trains the model on synthetic history
//! when no artifact exists, then scores a sample record and emits the result
//! as a JSON line.

use threatscore::{
    config::DetectorConfig,
    detector::{DetectorState, ThreatDetector, Training},
    logging::StructuredLogger,
    metrics::{MetricsRecord, SyntheticHistory},
    scoring::ThreatLevel,
};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("THREATSCORE_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = DetectorConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(model_path = ?config.model_path, "threat scoring engine starting");

    let mut detector = ThreatDetector::open(config);

    if detector.state() != DetectorState::Trained {
        info!("no trained model found; training on synthetic history");
        let history = SyntheticHistory::default().generate();
        match detector.train(&history) {
            Training::Report(report) => info!(
                model_id = %report.model_id,
                samples = report.samples,
                "training complete"
            ),
            Training::Failed(failure) => {
                warn!(error = %failure.error, "training failed");
                return Err(failure.error.into());
            }
        }
    }

    let sample = MetricsRecord::from([
        ("request_rate", 100.0),
        ("error_rate", 0.05),
        ("response_time", 200.0),
        ("payload_size", 1024.0),
        ("unique_ips", 50.0),
        ("auth_failures", 3.0),
    ]);

    let outcome = detector.detect(&sample);
    if let Some(result) = outcome.score() {
        if result.threat_level != ThreatLevel::Normal {
            warn!(
                threat_score = result.threat_score,
                threat_level = result.threat_level.as_str(),
                "elevated threat"
            );
        }
    }
    StructuredLogger::emit_json(&outcome, &mut std::io::stdout());

    Ok(())
}
