// src/pipeline/metrics.rs
//
// Per-session counters, logged when a source finishes.

use crate::video_processor::FrameResult;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SessionMetrics {
    pub total_frames: u64,
    pub detections_seen: u64,
    pub detections_in_roi: u64,
    pub vehicles_created: u64,
    pub vehicles_expired: u64,
    /// Still tracked when the stream ended; these never produce a dwell record
    pub vehicles_live_at_end: u64,
    pub longest_wait_secs: f64,
    pub started_at: Instant,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: 0,
            detections_seen: 0,
            detections_in_roi: 0,
            vehicles_created: 0,
            vehicles_expired: 0,
            vehicles_live_at_end: 0,
            longest_wait_secs: 0.0,
            started_at: Instant::now(),
        }
    }

    pub fn record_frame(&mut self, result: &FrameResult) {
        self.total_frames += 1;
        self.detections_seen += result.detections_total as u64;
        self.detections_in_roi += result.vehicles.len() as u64;
        self.vehicles_created += result.created as u64;
        self.vehicles_expired += result.expired.len() as u64;
        for record in &result.expired {
            if record.elapsed_secs > self.longest_wait_secs {
                self.longest_wait_secs = record.elapsed_secs;
            }
        }
    }

    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            detections_seen: self.detections_seen,
            detections_in_roi: self.detections_in_roi,
            vehicles_created: self.vehicles_created,
            vehicles_expired: self.vehicles_expired,
            vehicles_live_at_end: self.vehicles_live_at_end,
            longest_wait_secs: self.longest_wait_secs,
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }

    pub fn log_summary(&self) {
        let s = self.summary();
        info!("📊 Session Report:");
        info!("  Total frames: {}", s.total_frames);
        info!(
            "  Detections in ROI: {}/{} ({:.1}%)",
            s.detections_in_roi,
            s.detections_seen,
            100.0 * s.detections_in_roi as f64 / s.detections_seen.max(1) as f64
        );
        info!("  🚗 Vehicles tracked: {}", s.vehicles_created);
        info!("  ⏱️  Dwell records written: {}", s.vehicles_expired);
        if s.vehicles_live_at_end > 0 {
            info!(
                "  Still in view at end of stream: {} (not logged)",
                s.vehicles_live_at_end
            );
        }
        info!(
            "  Longest wait: {}",
            crate::analysis::format_wait_time(s.longest_wait_secs)
        );
        info!("  Processing Speed: {:.1} FPS", s.fps);
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub detections_seen: u64,
    pub detections_in_roi: u64,
    pub vehicles_created: u64,
    pub vehicles_expired: u64,
    pub vehicles_live_at_end: u64,
    pub longest_wait_secs: f64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
