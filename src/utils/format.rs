//! Clock formatting

/// Format seconds as `MM:SS`. Minutes grow past two digits when needed.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
