// src/analysis/mod.rs
//
// Tracking core. Evaluated once per frame:
//   Detections → roi_filter → centers → vehicle_tracker.upsert → vehicle_tracker.expire
//
// Everything in here is pure computation over in-memory state; I/O lives in
// the collaborators around it.

pub mod roi_filter;
pub mod vehicle_tracker;

pub use roi_filter::{is_in_roi, Roi};
pub use vehicle_tracker::{format_wait_time, DwellRecord, TrackerConfig, Vehicle, VehicleTracker};
