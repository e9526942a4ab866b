// src/detection/reader.rs
//
// Reads per-frame detector output from JSON Lines, one frame per line:
//
//   {"frame": 12, "timestamp": 0.4, "detections": [
//       {"bbox": [x1, y1, x2, y2], "confidence": 0.81, "class_id": 2}]}
//
// The detector itself runs elsewhere. This reader applies the same
// confidence / class gate the detector call was configured with, and
// resolves a timestamp for every frame so the tracker never reads a clock.
// Timestamps handed out never decrease: a frame stamped earlier than its
// predecessor is held at the predecessor's time.

use crate::types::{Detection, DetectionConfig, Frame, FrameDetections};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, info, warn};

/// Confidence and class gate for raw detector boxes
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    pub min_confidence: f32,
    /// Empty = accept every class
    pub classes: Vec<u32>,
}

impl DetectionFilter {
    pub fn accepts(&self, det: &Detection) -> bool {
        det.confidence >= self.min_confidence
            && match det.class_id {
                Some(class_id) => self.classes.is_empty() || self.classes.contains(&class_id),
                // Unlabelled boxes were already class-filtered upstream
                None => true,
            }
    }
}

impl From<&DetectionConfig> for DetectionFilter {
    fn from(cfg: &DetectionConfig) -> Self {
        Self {
            min_confidence: cfg.confidence,
            classes: cfg.classes.clone(),
        }
    }
}

pub struct DetectionReader<R> {
    lines: Lines<R>,
    line_no: usize,
    fps: f64,
    filter: DetectionFilter,
    last_timestamp: Option<f64>,
    pub frames_read: u64,
}

impl DetectionReader<BufReader<File>> {
    pub fn open(path: &Path, fps: f64, filter: DetectionFilter) -> Result<Self> {
        info!("Opening detections: {}", path.display());

        let file = File::open(path)
            .with_context(|| format!("Failed to open detections file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), fps, filter))
    }
}

impl<R: BufRead> DetectionReader<R> {
    pub fn new(reader: R, fps: f64, filter: DetectionFilter) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            fps,
            filter,
            last_timestamp: None,
            frames_read: 0,
        }
    }

    /// Next frame with filtered detections, or `None` at end of stream
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            let line = match self.lines.next() {
                Some(line) => line.with_context(|| format!("Read error at line {}", self.line_no + 1))?,
                None => return Ok(None),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            let raw: FrameDetections = serde_json::from_str(&line)
                .with_context(|| format!("Malformed detection record at line {}", self.line_no))?;

            return self.resolve(raw).map(Some);
        }
    }

    fn resolve(&mut self, raw: FrameDetections) -> Result<Frame> {
        let mut timestamp = match raw.timestamp {
            Some(ts) => ts,
            None => {
                if self.fps.is_nan() || self.fps <= 0.0 {
                    bail!(
                        "Frame {} has no timestamp and fps is {}",
                        raw.frame,
                        self.fps
                    );
                }
                raw.frame as f64 / self.fps
            }
        };

        if let Some(prev) = self.last_timestamp {
            if timestamp < prev {
                warn!(
                    "Frame {} timestamp {:.3}s goes back from {:.3}s, holding at {:.3}s",
                    raw.frame, timestamp, prev, prev
                );
                timestamp = prev;
            }
        }
        self.last_timestamp = Some(timestamp);
        self.frames_read += 1;

        let total = raw.detections.len();
        let detections: Vec<Detection> = raw
            .detections
            .into_iter()
            .filter(|d| self.filter.accepts(d))
            .collect();

        debug!(
            "Frame {}: {}/{} detections pass class/confidence gate",
            raw.frame,
            detections.len(),
            total
        );

        Ok(Frame {
            index: raw.frame,
            timestamp,
            detections,
        })
    }
}
