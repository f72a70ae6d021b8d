// ============================================================================
// drapto-core/src/encode/mod.rs
// ============================================================================
//
// SEGMENT ENCODER (C7)
//
// AI-ASSISTANT-INFO: ab-av1-driven per-segment encode with retry ladder

pub mod segment;

pub use segment::{encode_segment, MemoryCategory, SegmentStats, VmafScores};
