// ============================================================================
// drapto-core/src/segment/mod.rs
// ============================================================================
//
// SEGMENT PLANNER & SEGMENTER (C5 + C6)
//
// AI-ASSISTANT-INFO: Scene-aware boundary planning and stream-copy cutting

pub mod cut;
pub mod plan;

pub use cut::{cut_segments, validate_segments};
pub use plan::plan_segments;
