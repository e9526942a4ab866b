// src/analysis/vehicle_tracker.rs
//
// Centroid-proximity tracker that measures how long each vehicle dwells
// inside the monitored region.
//
// Design:
//   - Greedy first-match association: a detection joins the first live
//     vehicle whose center is within `match_radius` on BOTH axes
//   - Live vehicles are scanned in ascending id order, which is also their
//     creation order, so tie-breaking is deterministic
//   - No per-frame deduplication: two detections may hit the same vehicle,
//     the later one wins
//   - A vehicle unseen for more than `stale_after_secs` expires and yields
//     exactly one dwell record; ids are never reused
//   - Time is always passed in by the caller

use crate::types::Point;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Per-axis distance (pixels) under which a detection matches a vehicle
    pub match_radius: f32,
    /// Seconds without a match after which a vehicle expires
    pub stale_after_secs: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            match_radius: 50.0,
            stale_after_secs: 1.0,
        }
    }
}

impl From<crate::types::TrackerSettings> for TrackerConfig {
    fn from(s: crate::types::TrackerSettings) -> Self {
        Self {
            match_radius: s.match_radius,
            stale_after_secs: s.stale_after_secs,
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

/// A tracked vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: u32,
    pub position: Point,
    pub entry_time: f64,
    pub last_seen: f64,
}

impl Vehicle {
    fn new(id: u32, center: Point, now: f64) -> Self {
        Self {
            id,
            position: center,
            entry_time: now,
            last_seen: now,
        }
    }

    fn update_position(&mut self, center: Point, now: f64) {
        self.position = center;
        self.last_seen = now;
    }

    pub fn wait_time(&self, now: f64) -> f64 {
        now - self.entry_time
    }

    /// `MM:SS` label for overlays
    pub fn format_wait_time(&self, now: f64) -> String {
        format_wait_time(self.wait_time(now))
    }

    fn is_near(&self, center: Point, radius: f32) -> bool {
        (center.x - self.position.x).abs() < radius && (center.y - self.position.y).abs() < radius
    }
}

/// Emitted once per vehicle when it expires
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DwellRecord {
    pub id: u32,
    /// Seconds between creation and the expiry check
    pub elapsed_secs: f64,
}

impl DwellRecord {
    pub fn formatted_wait(&self) -> String {
        format_wait_time(self.elapsed_secs)
    }
}

impl fmt::Display for DwellRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vehicle {} waited for {}", self.id, self.formatted_wait())
    }
}

/// Whole minutes and whole seconds, each zero-padded to two digits.
/// Negative durations clamp to `00:00`.
pub fn format_wait_time(elapsed_secs: f64) -> String {
    let minutes = (elapsed_secs / 60.0).floor() as u64;
    let seconds = (elapsed_secs % 60.0).floor() as u64;
    format!("{:02}:{:02}", minutes, seconds)
}

// ============================================================================
// MAIN TRACKER
// ============================================================================

pub struct VehicleTracker {
    pub config: TrackerConfig,
    vehicles: BTreeMap<u32, Vehicle>,
    next_id: u32,
}

impl Default for VehicleTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl VehicleTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            vehicles: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// First live vehicle (ascending id) within the match radius of `center`
    pub fn find_match(&self, center: Point) -> Option<&Vehicle> {
        let radius = self.config.match_radius;
        self.vehicles.values().find(|v| v.is_near(center, radius))
    }

    /// Refresh the matching vehicle or start tracking a new one
    pub fn upsert(&mut self, center: Point, now: f64) -> &Vehicle {
        let id = match self.find_match(center).map(|v| v.id) {
            Some(id) => {
                if let Some(vehicle) = self.vehicles.get_mut(&id) {
                    vehicle.update_position(center, now);
                }
                debug!(
                    "Vehicle {} matched at ({:.1}, {:.1})",
                    id, center.x, center.y
                );
                id
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.vehicles.insert(id, Vehicle::new(id, center, now));
                debug!(
                    "Vehicle {} created at ({:.1}, {:.1}) t={:.3}",
                    id, center.x, center.y, now
                );
                id
            }
        };

        &self.vehicles[&id]
    }

    /// Remove every vehicle unseen for longer than the staleness threshold.
    /// Records come back in ascending id order.
    pub fn expire(&mut self, now: f64) -> Vec<DwellRecord> {
        let stale_after = self.config.stale_after_secs;
        let mut expired = Vec::new();

        self.vehicles.retain(|&id, v| {
            if now - v.last_seen > stale_after {
                expired.push(DwellRecord {
                    id,
                    elapsed_secs: v.wait_time(now),
                });
                false
            } else {
                true
            }
        });

        for record in &expired {
            debug!(
                "Vehicle {} expired after {:.2}s",
                record.id, record.elapsed_secs
            );
        }
        expired
    }

    pub fn get(&self, id: u32) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Live vehicles in ascending id order
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Number of vehicles created since the tracker was built or reset
    pub fn total_created(&self) -> u32 {
        self.next_id - 1
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_far_apart_detections_get_increasing_ids() {
        let mut tracker = VehicleTracker::default();

        let ids: Vec<u32> = [(20.0, 20.0), (120.0, 20.0), (20.0, 120.0), (300.0, 300.0)]
            .iter()
            .map(|&(x, y)| tracker.upsert(pt(x, y), 0.0).id)
            .collect();

        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(tracker.len(), 4);
        assert_eq!(tracker.total_created(), 4);
    }

    #[test]
    fn test_nearby_detection_updates_same_vehicle() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(100.0, 100.0), 0.0);

        let v = tracker.upsert(pt(149.0, 51.0), 0.4);
        assert_eq!(v.id, 1);
        assert_eq!(v.position, pt(149.0, 51.0));
        assert_eq!(v.last_seen, 0.4);
        assert_eq!(v.entry_time, 0.0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_match_requires_both_axes_strictly_within_radius() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(100.0, 100.0), 0.0);

        // Exactly 50 px away on one axis is not a match
        assert!(tracker.find_match(pt(150.0, 100.0)).is_none());
        assert!(tracker.find_match(pt(100.0, 50.0)).is_none());
        // Close on x, far on y
        assert!(tracker.find_match(pt(101.0, 300.0)).is_none());
        assert_eq!(tracker.find_match(pt(149.9, 50.1)).map(|v| v.id), Some(1));
    }

    #[test]
    fn test_find_match_prefers_lowest_id() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(0.0, 0.0), 0.0);
        tracker.upsert(pt(60.0, 0.0), 0.0);

        // (30, 0) is within 50 px of both vehicles
        assert_eq!(tracker.find_match(pt(30.0, 0.0)).map(|v| v.id), Some(1));
        assert_eq!(tracker.upsert(pt(30.0, 0.0), 0.1).id, 1);
    }

    #[test]
    fn test_find_match_is_read_only() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(10.0, 10.0), 0.0);

        let before = tracker.get(1).cloned();
        let _ = tracker.find_match(pt(12.0, 12.0));
        assert_eq!(tracker.get(1).cloned(), before);
    }

    #[test]
    fn test_same_frame_detections_last_writer_wins() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(100.0, 100.0), 0.0);

        // Two detections in one frame, both near vehicle 1
        tracker.upsert(pt(110.0, 100.0), 0.5);
        tracker.upsert(pt(90.0, 95.0), 0.5);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get(1).unwrap().position, pt(90.0, 95.0));
    }

    #[test]
    fn test_same_frame_chained_matches_follow_detection_order() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(0.0, 0.0), 0.0);

        // First detection drags vehicle 1 to (40, 0); the second is then
        // within reach of the moved position, not the original one
        tracker.upsert(pt(40.0, 0.0), 0.1);
        tracker.upsert(pt(85.0, 0.0), 0.1);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get(1).unwrap().position, pt(85.0, 0.0));
    }

    #[test]
    fn test_expire_uses_strict_threshold() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(10.0, 10.0), 0.0);

        assert!(tracker.expire(1.0).is_empty(), "exactly 1.0s is not stale");
        let records = tracker.expire(1.01);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert!((records[0].elapsed_secs - 1.01).abs() < 1e-9);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_expire_twice_returns_nothing_second_time() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(10.0, 10.0), 0.0);
        tracker.upsert(pt(500.0, 10.0), 0.0);

        assert_eq!(tracker.expire(5.0).len(), 2);
        assert!(tracker.expire(5.0).is_empty());
    }

    #[test]
    fn test_expire_keeps_recently_seen_vehicles() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(10.0, 10.0), 0.0);
        tracker.upsert(pt(500.0, 10.0), 0.0);
        tracker.upsert(pt(505.0, 12.0), 1.8);

        let records = tracker.expire(2.0);
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(tracker.vehicles().map(|v| v.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_expired_records_sorted_by_id() {
        let mut tracker = VehicleTracker::default();
        for i in 0..5 {
            tracker.upsert(pt(i as f32 * 200.0, 0.0), i as f64 * 0.1);
        }
        let ids: Vec<u32> = tracker.expire(10.0).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_ids_not_reused_after_expiry() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(10.0, 10.0), 0.0);
        tracker.expire(3.0);

        // Same spot after the gap: new identity
        let v = tracker.upsert(pt(10.0, 10.0), 3.0);
        assert_eq!(v.id, 2);
        assert_eq!(v.entry_time, 3.0);
    }

    #[test]
    fn test_dwell_time_measured_at_expiry() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(20.0, 20.0), 0.0);
        tracker.upsert(pt(25.0, 25.0), 0.5);

        let records = tracker.expire(2.0);
        assert_eq!(
            records,
            vec![DwellRecord {
                id: 1,
                elapsed_secs: 2.0
            }]
        );
        assert_eq!(records[0].formatted_wait(), "00:02");
        assert_eq!(records[0].to_string(), "Vehicle 1 waited for 00:02");
    }

    #[test]
    fn test_format_wait_time() {
        assert_eq!(format_wait_time(125.4), "02:05");
        assert_eq!(format_wait_time(0.0), "00:00");
        assert_eq!(format_wait_time(59.999), "00:59");
        assert_eq!(format_wait_time(60.0), "01:00");
        assert_eq!(format_wait_time(6000.0), "100:00");
        assert_eq!(format_wait_time(-3.0), "00:00");
    }

    #[test]
    fn test_vehicle_wait_label() {
        let mut tracker = VehicleTracker::default();
        let v = tracker.upsert(pt(20.0, 20.0), 10.0);
        assert_eq!(v.format_wait_time(135.4), "02:05");
    }

    #[test]
    fn test_custom_config() {
        let mut tracker = VehicleTracker::new(TrackerConfig {
            match_radius: 10.0,
            stale_after_secs: 5.0,
        });
        tracker.upsert(pt(0.0, 0.0), 0.0);
        assert_eq!(tracker.upsert(pt(20.0, 0.0), 0.0).id, 2);
        assert!(tracker.expire(4.0).is_empty());
        assert_eq!(tracker.expire(5.5).len(), 2);
    }

    #[test]
    fn test_nan_center_never_matches() {
        let mut tracker = VehicleTracker::default();
        let ids: Vec<u32> = (0..3)
            .map(|_| tracker.upsert(pt(f32::NAN, 20.0), 0.0).id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        // A finite detection does not latch onto the NaN-positioned vehicles
        assert!(tracker.find_match(pt(20.0, 20.0)).is_none());
        assert_eq!(tracker.upsert(pt(20.0, 20.0), 0.0).id, 4);
    }

    #[test]
    fn test_nan_vehicles_still_expire() {
        let mut tracker = VehicleTracker::default();
        tracker.upsert(pt(f32::NAN, f32::NAN), 0.0);
        tracker.upsert(pt(f32::INFINITY, 5.0), 0.0);

        let ids: Vec<u32> = tracker.expire(1.5).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(tracker.is_empty());
    }
}
