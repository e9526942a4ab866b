// src/video_processor.rs

use crate::analysis::{DwellRecord, Roi, TrackerConfig, VehicleTracker};
use crate::detection::{DetectionFilter, DetectionReader};
use crate::pipeline::{DwellLog, SessionMetrics};
use crate::types::{Config, Frame, Point};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const SOURCE_EXTENSIONS: [&str; 2] = ["jsonl", "JSONL"];

// ============================================================================
// PER-FRAME PROCESSING
// ============================================================================

/// What an overlay renderer needs for one tracked detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleAnnotation {
    pub id: u32,
    pub bbox: [f32; 4],
    pub center: Point,
    /// `ID:{id} ({MM:SS})`
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameResult {
    pub frame: u64,
    pub timestamp: f64,
    pub detections_total: usize,
    /// Vehicles created by this frame
    pub created: usize,
    /// One entry per detection that passed the ROI gate, in detection order
    pub vehicles: Vec<VehicleAnnotation>,
    pub expired: Vec<DwellRecord>,
}

/// Runs ROI gate → association → expiry for one frame at a time
pub struct FrameProcessor {
    roi: Roi,
}

impl FrameProcessor {
    pub fn new(roi: Roi) -> Self {
        Self { roi }
    }

    pub fn roi(&self) -> Roi {
        self.roi
    }

    pub fn process_frame(&self, tracker: &mut VehicleTracker, frame: &Frame) -> FrameResult {
        let now = frame.timestamp;
        let created_before = tracker.total_created();
        let mut vehicles = Vec::with_capacity(frame.detections.len());

        for det in &frame.detections {
            let [x1, y1, x2, y2] = det.bbox;
            if !self.roi.contains_box(x1, y1, x2, y2) {
                continue;
            }

            let vehicle = tracker.upsert(det.center(), now);
            vehicles.push(VehicleAnnotation {
                id: vehicle.id,
                bbox: det.bbox,
                center: vehicle.position,
                label: format!("ID:{} ({})", vehicle.id, vehicle.format_wait_time(now)),
            });
        }

        let expired = tracker.expire(now);

        FrameResult {
            frame: frame.index,
            timestamp: now,
            detections_total: frame.detections.len(),
            created: (tracker.total_created() - created_before) as usize,
            vehicles,
            expired,
        }
    }
}

// ============================================================================
// ANNOTATION OUTPUT
// ============================================================================

#[derive(Serialize)]
struct AnnotatedFrame<'a> {
    frame: u64,
    timestamp: f64,
    roi: Roi,
    vehicles: &'a [VehicleAnnotation],
    expired: &'a [DwellRecord],
}

/// One JSON line per frame with everything an overlay renderer draws
pub struct AnnotationWriter<W: Write> {
    out: W,
    roi: Roi,
}

impl<W: Write> AnnotationWriter<W> {
    pub fn new(out: W, roi: Roi) -> Self {
        Self { out, roi }
    }

    pub fn write_frame(&mut self, result: &FrameResult) -> Result<()> {
        let line = serde_json::to_string(&AnnotatedFrame {
            frame: result.frame,
            timestamp: result.timestamp,
            roi: self.roi,
            vehicles: &result.vehicles,
            expired: &result.expired,
        })?;
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

// ============================================================================
// SESSION DRIVER
// ============================================================================

pub struct VideoProcessor {
    config: Config,
}

impl VideoProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// `video.source` itself when it is a file, otherwise every `*.jsonl`
    /// below it, sorted by path
    pub fn find_sources(&self) -> Result<Vec<PathBuf>> {
        let source = Path::new(&self.config.video.source);

        if source.is_file() {
            return Ok(vec![source.to_path_buf()]);
        }
        if !source.is_dir() {
            bail!("Detection source {} does not exist", source.display());
        }

        let mut sources = Vec::new();
        for entry in WalkDir::new(source)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(ext) = path.extension() {
                if SOURCE_EXTENSIONS.contains(&ext.to_str().unwrap_or("")) {
                    sources.push(path.to_path_buf());
                }
            }
        }
        sources.sort();

        info!("Found {} detection files", sources.len());
        Ok(sources)
    }

    pub fn open_source(&self, path: &Path) -> Result<DetectionReader<std::io::BufReader<File>>> {
        DetectionReader::open(
            path,
            self.config.video.fps,
            DetectionFilter::from(&self.config.detection),
        )
    }

    pub fn create_writer(&self, input_path: &Path) -> Result<AnnotationWriter<BufWriter<File>>> {
        std::fs::create_dir_all(&self.config.video.output_dir)?;

        let input_name = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("source");
        let output_path = PathBuf::from(&self.config.video.output_dir)
            .join(format!("{}_annotated.jsonl", input_name));

        info!("Annotations: {}", output_path.display());

        let file = File::create(&output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        Ok(AnnotationWriter::new(BufWriter::new(file), self.config.roi))
    }

    /// One session: fresh tracker, every frame of `path`, expiry lines to `dwell_log`
    pub fn process_source<W: Write>(
        &self,
        path: &Path,
        dwell_log: &mut DwellLog<W>,
    ) -> Result<SessionMetrics> {
        let mut reader = self.open_source(path)?;
        let mut writer = self.create_writer(path)?;

        let mut tracker = VehicleTracker::new(TrackerConfig::from(self.config.tracker));
        let processor = FrameProcessor::new(self.config.roi);
        let mut metrics = SessionMetrics::new();

        info!(
            "ROI {} | match radius {:.0}px | stale after {:.1}s",
            processor.roi(),
            tracker.config.match_radius,
            tracker.config.stale_after_secs
        );

        while let Some(frame) = reader.read_frame()? {
            let result = processor.process_frame(&mut tracker, &frame);

            dwell_log.write_all(&result.expired)?;
            writer.write_frame(&result)?;
            metrics.record_frame(&result);

            if !result.vehicles.is_empty() {
                let labels: Vec<&str> = result.vehicles.iter().map(|v| v.label.as_str()).collect();
                if self.config.video.display {
                    info!("Frame {}: {}", result.frame, labels.join(", "));
                } else {
                    debug!("Frame {}: {}", result.frame, labels.join(", "));
                }
            }
        }

        writer.finish()?;
        metrics.vehicles_live_at_end = tracker.len() as u64;
        Ok(metrics)
    }
}
