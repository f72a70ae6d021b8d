// ============================================================================
// drapto-core/src/probe/info.rs
// ============================================================================
//
// DURATION FALLBACK LADDER
//
// `get_duration` tries, in order: stream `duration`, format `duration`,
// `nb_frames * time_base`, `size_bytes * 8 / bit_rate`, and finally the sum of
// per-packet `duration_time`s. The first strictly positive value wins.
//
// AI-ASSISTANT-INFO: Duration resolution with fallback through five sources

use crate::error::{CoreError, CoreResult};

use super::session::{Session, StreamType};

/// Resolves the duration of a stream (or the container, for `StreamType::Format`)
/// by trying each source in the fallback ladder and stopping at the first
/// strictly positive value. Fails with `MetadataError` if every source is
/// absent, unparseable, or non-positive.
pub fn get_duration(session: &Session, stream_type: StreamType, index: usize) -> CoreResult<f64> {
    if let Some(d) = session.get_float_opt("duration", stream_type, index) {
        if d > 0.0 {
            return Ok(d);
        }
    }

    if !matches!(stream_type, StreamType::Format) {
        if let Some(d) = session.get_float_opt("duration", StreamType::Format, 0) {
            if d > 0.0 {
                return Ok(d);
            }
        }
    }

    if let Some(d) = duration_from_frame_count(session, stream_type, index) {
        if d > 0.0 {
            return Ok(d);
        }
    }

    if let Some(d) = duration_from_bitrate(session, stream_type, index) {
        if d > 0.0 {
            return Ok(d);
        }
    }

    let summed = session.sum_packet_durations(stream_type, index)?;
    if summed > 0.0 {
        return Ok(summed);
    }

    Err(CoreError::MetadataError(format!(
        "unable to determine duration for {stream_type:?} stream {index}"
    )))
}

fn duration_from_frame_count(session: &Session, stream_type: StreamType, index: usize) -> Option<f64> {
    let nb_frames = session.get_int("nb_frames", stream_type, index).ok()? as f64;
    let time_base = session.get_string("time_base", stream_type, index).ok()?;
    let (num, den) = parse_ratio(&time_base)?;
    if den == 0.0 {
        return None;
    }
    Some(nb_frames * (num / den))
}

fn duration_from_bitrate(session: &Session, stream_type: StreamType, index: usize) -> Option<f64> {
    let size_bytes = session
        .get_float("size", StreamType::Format, 0)
        .or_else(|_| session.get_float("size", stream_type, index))
        .ok()?;
    let bit_rate = session
        .get_float("bit_rate", stream_type, index)
        .or_else(|_| session.get_float("bit_rate", StreamType::Format, 0))
        .ok()?;
    if bit_rate <= 0.0 {
        return None;
    }
    Some(size_bytes * 8.0 / bit_rate)
}

/// Parses a `"num/den"` ratio string (as used by ffprobe's `time_base`).
fn parse_ratio(s: &str) -> Option<(f64, f64)> {
    let (num, den) = s.split_once('/')?;
    Some((num.trim().parse().ok()?, den.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ratio_splits_num_den() {
        assert_eq!(parse_ratio("1/25000"), Some((1.0, 25000.0)));
        assert_eq!(parse_ratio("garbage"), None);
    }
}
