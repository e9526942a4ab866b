//! Vehicle dwell-time tracking over per-frame detector output.
//!
//! Detections are gated by a fixed region of interest, associated with live
//! vehicles by center proximity, and expired after a short absence. Each
//! expiry yields a record of how long the vehicle waited.
//!
//! ```rust,ignore
//! use vehicle_dwell_tracker::analysis::{Roi, VehicleTracker};
//! use vehicle_dwell_tracker::types::Point;
//!
//! let roi = Roi::new(0.0, 0.0, 100.0, 100.0);
//! let mut tracker = VehicleTracker::default();
//! if roi.contains_box(10.0, 10.0, 30.0, 30.0) {
//!     tracker.upsert(Point::new(20.0, 20.0), 0.0);
//! }
//! for record in tracker.expire(2.0) {
//!     println!("{}", record); // Vehicle 1 waited for 00:02
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod detection;
pub mod pipeline;
pub mod types;
pub mod video_processor;

pub use analysis::{is_in_roi, DwellRecord, Roi, TrackerConfig, Vehicle, VehicleTracker};
pub use types::Config;
