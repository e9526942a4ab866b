// src/detection/mod.rs

mod reader;

// Re-export public APIs
pub use reader::{DetectionFilter, DetectionReader};
