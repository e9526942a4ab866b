// src/main.rs

use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};
use vehicle_dwell_tracker::pipeline::DwellLog;
use vehicle_dwell_tracker::video_processor::VideoProcessor;
use vehicle_dwell_tracker::Config;

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let mut config = Config::load(&config_path)?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("vehicle_dwell_tracker={}", config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚗 Vehicle Dwell Tracker Starting");
    info!("✓ Configuration loaded from {}", config_path);
    config.apply_env_overrides()?;
    info!("ROI: {}", config.roi);
    info!(
        "Detection gate: confidence >= {:.2}, classes {:?}",
        config.detection.confidence, config.detection.classes
    );

    let video_processor = VideoProcessor::new(config.clone());
    let sources = video_processor.find_sources()?;

    if sources.is_empty() {
        error!("No detection files found in {}", config.video.source);
        return Ok(());
    }

    let log_path = Path::new(&config.video.output_dir).join(&config.logging.dwell_log);
    let mut dwell_log = DwellLog::create(&log_path)?;

    for (idx, source) in sources.iter().enumerate() {
        info!("========================================");
        info!(
            "Processing source {}/{}: {}",
            idx + 1,
            sources.len(),
            source.display()
        );
        info!("========================================");

        match video_processor.process_source(source, &mut dwell_log) {
            Ok(metrics) => {
                info!("✓ Source processed successfully!");
                metrics.log_summary();
            }
            Err(e) => {
                error!("Failed to process {}: {:#}", source.display(), e);
            }
        }
    }

    if dwell_log.lines_written == 0 {
        warn!("No vehicle expired during the run; {} is empty", log_path.display());
    } else {
        info!(
            "💾 {} dwell record(s) written to {}",
            dwell_log.lines_written,
            log_path.display()
        );
    }

    Ok(())
}
