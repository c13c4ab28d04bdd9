//! Minute/second text fields of the countdown screen

/// Largest value the seconds field accepts
const MAX_SECONDS: u64 = 59;

/// Raw minute and second texts as typed by the user.
///
/// Both fields only ever hold ASCII digits. The seconds field is clamped to
/// `0..=59`; minutes have no upper bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationInput {
    minutes_text: String,
    seconds_text: String,
}

impl DurationInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minutes_text(&self) -> &str {
        &self.minutes_text
    }

    pub fn seconds_text(&self) -> &str {
        &self.seconds_text
    }

    /// Store the digits of `text` verbatim
    pub fn set_minutes(&mut self, text: &str) {
        self.minutes_text = digits_only(text);
    }

    /// Store the digits of `text`, clamped to 59
    pub fn set_seconds(&mut self, text: &str) {
        let digits = digits_only(text);
        self.seconds_text = if digits.is_empty() {
            digits
        } else {
            // Too many digits for u64 is still "more than 59"
            digits
                .parse::<u64>()
                .map_or(MAX_SECONDS, |seconds| seconds.min(MAX_SECONDS))
                .to_string()
        };
    }

    /// Total configured seconds. Zero means the countdown must not start.
    pub fn resolve(&self) -> u64 {
        let minutes = parse_field(&self.minutes_text);
        let seconds = parse_field(&self.seconds_text);
        minutes.saturating_mul(60).saturating_add(seconds)
    }

    pub fn clear(&mut self) {
        self.minutes_text.clear();
        self.seconds_text.clear();
    }
}

fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

fn parse_field(text: &str) -> u64 {
    if text.is_empty() {
        0
    } else {
        text.parse().unwrap_or(u64::MAX)
    }
}
