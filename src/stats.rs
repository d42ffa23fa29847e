// A "word" is five characters and only correct characters count towards
// speed. Degenerate results (division by zero, NaN, negative values from
// early deletions) collapse to zero.

fn net_chars(cursor: usize, mistakes: usize) -> f64 {
    cursor as f64 - mistakes as f64
}

fn clamp_metric(raw: f64) -> u32 {
    if raw.is_finite() && raw >= 0.0 {
        raw as u32
    } else {
        0
    }
}

fn wpm(cursor: usize, mistakes: usize, secs: f64) -> u32 {
    clamp_metric(((net_chars(cursor, mistakes) / 5.0) / secs * 60.0).round())
}

/// Speed while the attempt is running. Zero until a full second has passed.
pub fn live_wpm(cursor: usize, mistakes: usize, elapsed_secs: u64) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    wpm(cursor, mistakes, elapsed_secs as f64)
}

/// Speed for a finished attempt. An attempt finished within its first second
/// is treated as having taken one second.
pub fn final_wpm(cursor: usize, mistakes: usize, time_taken_secs: u64) -> u32 {
    wpm(cursor, mistakes, time_taken_secs.max(1) as f64)
}

/// Percentage of typed characters that were correct, rounded down.
pub fn accuracy(cursor: usize, mistakes: usize) -> u32 {
    clamp_metric(((net_chars(cursor, mistakes) / cursor as f64) * 100.0).floor())
}
