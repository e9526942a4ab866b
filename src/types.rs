// src/types.rs

use crate::analysis::Roi;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub video: VideoConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub roi: Roi,
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    /// A single detections file or a directory scanned for `*.jsonl`
    pub source: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Used to derive timestamps for frames that carry none
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_true")]
    pub display: bool,
}

/// Filters applied by the detection source before boxes reach the tracker
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// COCO class ids to keep. Empty keeps every class.
    #[serde(default = "default_classes")]
    pub classes: Vec<u32>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            classes: default_classes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrackerSettings {
    #[serde(default = "default_match_radius")]
    pub match_radius: f32,
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: f64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            match_radius: default_match_radius(),
            stale_after_secs: default_stale_after(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Text file receiving one line per expired vehicle
    #[serde(default = "default_dwell_log")]
    pub dwell_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dwell_log: default_dwell_log(),
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_fps() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_confidence() -> f32 {
    0.3
}

fn default_classes() -> Vec<u32> {
    vec![2, 3, 5, 7] // car, motorcycle, bus, truck
}

fn default_match_radius() -> f32 {
    50.0
}

fn default_stale_after() -> f64 {
    1.0
}

fn default_level() -> String {
    "info".to_string()
}

fn default_dwell_log() -> String {
    "output.txt".to_string()
}

/// Center point in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One detector output box, as produced by the external detector
#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    pub bbox: [f32; 4], // [x1, y1, x2, y2] pixels
    #[serde(default = "full_confidence")]
    pub confidence: f32,
    /// COCO class id, when the detector reports one
    #[serde(default)]
    pub class_id: Option<u32>,
}

fn full_confidence() -> f32 {
    1.0
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            bbox: [x1, y1, x2, y2],
            confidence: 1.0,
            class_id: None,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.bbox[0] + self.bbox[2]) / 2.0,
            (self.bbox[1] + self.bbox[3]) / 2.0,
        )
    }
}

/// All detections for one video frame
#[derive(Debug, Clone, Deserialize)]
pub struct FrameDetections {
    pub frame: u64,
    /// Seconds since stream start. Derived from `frame / fps` when absent.
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A frame ready for the tracker: boxes filtered, timestamp resolved
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub timestamp: f64,
    pub detections: Vec<Detection>,
}
