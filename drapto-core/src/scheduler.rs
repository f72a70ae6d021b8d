// ============================================================================
// drapto-core/src/scheduler.rs
// ============================================================================
//
// MEMORY-AWARE SCHEDULER (C8)
//
// Warms up by running the first `W` segments sequentially to calibrate a
// per-token memory cost from observed peak RSS, then dispatches the rest
// under a combined token/headroom admission policy. Plain `std::thread`
// workers, no async runtime — one thread per admitted segment, reaped by
// polling `JoinHandle::is_finished`.
//
// AI-ASSISTANT-INFO: Warm-up calibration, token admission, dispatch loop

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};
use sysinfo::System;

use crate::encode::{MemoryCategory, SegmentStats};
use crate::error::{CoreError, CoreResult};

const MEMORY_PRESSURE_PAUSE_PCT: f32 = 90.0;
const HEADROOM_FRACTION: f64 = 0.2;

/// Per-category memory model derived from warm-up peaks.
#[derive(Debug, Clone)]
pub struct MemoryProfile {
    pub base_bytes_per_token: u64,
    pub weights: HashMap<MemoryCategory, u32>,
}

impl MemoryProfile {
    pub fn weight_for(&self, category: MemoryCategory) -> u32 {
        *self.weights.get(&category).unwrap_or(&1)
    }
}

/// Derives a `MemoryProfile` from warm-up `(category, peak_rss_bytes)` pairs.
pub fn derive_profile(warmup: &[(MemoryCategory, u64)]) -> MemoryProfile {
    let mut by_category: HashMap<MemoryCategory, Vec<u64>> = HashMap::new();
    for &(cat, peak) in warmup {
        by_category.entry(cat).or_default().push(peak);
    }

    let averages: HashMap<MemoryCategory, u64> = by_category
        .iter()
        .map(|(&cat, peaks)| (cat, peaks.iter().sum::<u64>() / peaks.len() as u64))
        .collect();

    let min_cat_avg = averages.values().filter(|&&v| v > 0).min().copied();
    let actual_peak = warmup.iter().map(|&(_, p)| p).max().unwrap_or(0);

    let base = match min_cat_avg {
        Some(min_avg) => min_avg.max(actual_peak / 4),
        None => crate::config::DEFAULT_BASE_BYTES_PER_TOKEN,
    };
    let base = base.max(1);

    let mut weights = HashMap::new();
    weights.insert(MemoryCategory::Sdr, 1);
    weights.insert(
        MemoryCategory::Hd1080,
        averages
            .get(&MemoryCategory::Hd1080)
            .map(|&avg| (avg / base).max(1) as u32)
            .unwrap_or(1),
    );
    weights.insert(
        MemoryCategory::Uhd4k,
        averages
            .get(&MemoryCategory::Uhd4k)
            .map(|&avg| (avg / base).max(2) as u32)
            .unwrap_or(2),
    );

    MemoryProfile {
        base_bytes_per_token: base,
        weights,
    }
}

type EncodeFn = dyn Fn(usize) -> CoreResult<(SegmentStats, Vec<String>)> + Send + Sync;

/// Runs `encode` (indexed 0..segment_categories.len()) over all segments: the
/// first `warmup_segments` sequentially to calibrate the memory profile, the
/// rest under the admission-controlled dispatch loop. `segment_categories`
/// gives each segment's memory category up front (known from C2/C3 without
/// encoding). Returns stats in plan order; on any worker failure the loop
/// stops admitting new tasks, drains what's running, and propagates
/// `SegmentEncodingError`.
pub fn run(
    segment_categories: &[MemoryCategory],
    warmup_segments: usize,
    max_tokens: u32,
    stagger_delay_ms: u64,
    encode: Arc<EncodeFn>,
) -> CoreResult<Vec<SegmentStats>> {
    let n = segment_categories.len();
    let mut stats: Vec<Option<SegmentStats>> = (0..n).map(|_| None).collect();
    let mut log_lines: Vec<Option<Vec<String>>> = (0..n).map(|_| None).collect();

    let warmup_count = warmup_segments.min(n);
    let mut warmup_peaks = Vec::with_capacity(warmup_count);
    for i in 0..warmup_count {
        let (seg_stats, lines) = encode(i)?;
        warmup_peaks.push((segment_categories[i], seg_stats.peak_rss_bytes));
        stats[i] = Some(seg_stats);
        log_lines[i] = Some(lines);
    }

    if warmup_count == n {
        return Ok(stats.into_iter().flatten().collect());
    }

    let profile = derive_profile(&warmup_peaks);
    info!(
        "scheduler warm-up complete: base={} bytes/token, weights={:?}",
        profile.base_bytes_per_token, profile.weights
    );

    let running: Arc<Mutex<HashMap<usize, (JoinHandle<CoreResult<(SegmentStats, Vec<String>)>>, u32)>>> =
        Arc::new(Mutex::new(HashMap::new()));
    let mut system = System::new_all();

    let mut next = warmup_count;
    let mut failure: Option<CoreError> = None;

    loop {
        let running_empty = running.lock().unwrap().is_empty();
        if next >= n && running_empty {
            break;
        }

        system.refresh_memory();
        let used_pct = if system.total_memory() > 0 {
            system.used_memory() as f32 / system.total_memory() as f32 * 100.0
        } else {
            0.0
        };

        if used_pct >= MEMORY_PRESSURE_PAUSE_PCT {
            reap_completed(&running, &mut stats, &mut log_lines, &mut failure);
            thread::sleep(Duration::from_secs(1));
            continue;
        }

        if failure.is_none() {
            while next < n && admit(&running, &profile, max_tokens, &mut system, segment_categories[next]) {
                let weight = profile.weight_for(segment_categories[next]);
                let encode = Arc::clone(&encode);
                let idx = next;
                let handle = thread::spawn(move || encode(idx));
                running.lock().unwrap().insert(idx, (handle, weight));
                thread::sleep(Duration::from_millis(stagger_delay_ms));
                next += 1;
            }
        }

        reap_completed(&running, &mut stats, &mut log_lines, &mut failure);

        if !running.lock().unwrap().is_empty() {
            thread::sleep(Duration::from_millis(100));
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }

    for (i, lines) in log_lines.into_iter().enumerate() {
        if let Some(lines) = lines {
            for line in lines {
                log::debug!("[segment {i}] {line}");
            }
        }
    }

    Ok(stats.into_iter().flatten().collect())
}

fn admit(
    running: &Arc<Mutex<HashMap<usize, (JoinHandle<CoreResult<(SegmentStats, Vec<String>)>>, u32)>>>,
    profile: &MemoryProfile,
    max_tokens: u32,
    system: &mut System,
    category: MemoryCategory,
) -> bool {
    let tokens_in_use: u32 = running.lock().unwrap().values().map(|&(_, w)| w).sum();
    let weight = profile.weight_for(category);
    let estimated_bytes = weight as u64 * profile.base_bytes_per_token;

    system.refresh_memory();
    let available = system.available_memory();
    let total = system.total_memory();

    let in_use_bytes = tokens_in_use as u64 * profile.base_bytes_per_token;
    let headroom_ok = (available as f64) - (in_use_bytes + estimated_bytes) as f64 > HEADROOM_FRACTION * total as f64;
    let token_ceiling = (estimated_bytes as f64 / profile.base_bytes_per_token as f64).ceil() as u32;

    headroom_ok && tokens_in_use + token_ceiling.max(weight) <= max_tokens
}

fn reap_completed(
    running: &Arc<Mutex<HashMap<usize, (JoinHandle<CoreResult<(SegmentStats, Vec<String>)>>, u32)>>>,
    stats: &mut [Option<SegmentStats>],
    log_lines: &mut [Option<Vec<String>>],
    failure: &mut Option<CoreError>,
) {
    let finished_ids: Vec<usize> = {
        let guard = running.lock().unwrap();
        guard
            .iter()
            .filter(|(_, (handle, _))| handle.is_finished())
            .map(|(&id, _)| id)
            .collect()
    };

    for id in finished_ids {
        let (handle, _) = running.lock().unwrap().remove(&id).expect("id was just observed finished");
        match handle.join() {
            Ok(Ok((seg_stats, lines))) => {
                stats[id] = Some(seg_stats);
                log_lines[id] = Some(lines);
            }
            Ok(Err(e)) => {
                warn!("segment {id} failed: {e}");
                if failure.is_none() {
                    *failure = Some(CoreError::SegmentEncodingError(e.to_string()));
                }
            }
            Err(_) => {
                if failure.is_none() {
                    *failure = Some(CoreError::SegmentEncodingError(format!(
                        "segment {id} encoder thread panicked"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_profile_uses_observed_averages() {
        let warmup = vec![
            (MemoryCategory::Sdr, 300_000_000),
            (MemoryCategory::Sdr, 320_000_000),
            (MemoryCategory::Hd1080, 650_000_000),
            (MemoryCategory::Uhd4k, 1_200_000_000),
        ];
        let profile = derive_profile(&warmup);
        assert!(profile.base_bytes_per_token >= 300_000_000);
        assert_eq!(profile.weight_for(MemoryCategory::Sdr), 1);
        assert!(profile.weight_for(MemoryCategory::Hd1080) >= 1);
        assert!(profile.weight_for(MemoryCategory::Uhd4k) >= 2);
    }

    #[test]
    fn derive_profile_defaults_when_no_data() {
        let profile = derive_profile(&[]);
        assert_eq!(profile.base_bytes_per_token, crate::config::DEFAULT_BASE_BYTES_PER_TOKEN);
        assert_eq!(profile.weight_for(MemoryCategory::Uhd4k), 2);
    }
}
