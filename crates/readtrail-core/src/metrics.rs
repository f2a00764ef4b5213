//! Reading-time, words-read and progress estimates.

pub const DEFAULT_WORDS_PER_MINUTE: u32 = 250;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Estimator for a given reading speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingEstimator {
    words_per_minute: u32,
}

impl Default for ReadingEstimator {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl ReadingEstimator {
    /// A speed of zero falls back to [`DEFAULT_WORDS_PER_MINUTE`].
    pub fn new(words_per_minute: u32) -> Self {
        if words_per_minute == 0 {
            Self::default()
        } else {
            Self { words_per_minute }
        }
    }

    pub fn words_per_minute(&self) -> u32 {
        self.words_per_minute
    }

    /// Milliseconds needed to read `word_count` words, never under one minute.
    pub fn reading_time_ms(&self, word_count: usize) -> u64 {
        let minutes = (word_count as f64 / self.words_per_minute as f64).max(1.0);
        (minutes * MS_PER_MINUTE).round() as u64
    }

    /// Words covered in `time_spent_ms` at this speed.
    pub fn words_read(&self, time_spent_ms: u64) -> u64 {
        if time_spent_ms == 0 {
            return 0;
        }
        ((time_spent_ms as f64 / MS_PER_MINUTE) * self.words_per_minute as f64).floor() as u64
    }

    /// Rounded percentage of the estimated reading time already spent,
    /// clamped to `0..=100`.
    pub fn progress(&self, word_count: usize, time_spent_ms: u64) -> u8 {
        if word_count == 0 || time_spent_ms == 0 {
            return 0;
        }
        let expected = self.reading_time_ms(word_count) as f64;
        let percent = (time_spent_ms as f64 / expected * 100.0).round();
        percent.min(100.0) as u8
    }
}

pub fn estimate_reading_time(word_count: usize) -> u64 {
    ReadingEstimator::default().reading_time_ms(word_count)
}

pub fn estimate_words_read(time_spent_ms: u64) -> u64 {
    ReadingEstimator::default().words_read(time_spent_ms)
}

pub fn estimate_reading_progress(word_count: usize, time_spent_ms: u64) -> u8 {
    ReadingEstimator::default().progress(word_count, time_spent_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_time_has_one_minute_floor() {
        assert_eq!(estimate_reading_time(0), 60_000);
        assert_eq!(estimate_reading_time(100), 60_000);
        assert_eq!(estimate_reading_time(500), 120_000);
        assert_eq!(ReadingEstimator::new(100).reading_time_ms(150), 90_000);
    }

    #[test]
    fn test_words_read() {
        assert_eq!(estimate_words_read(0), 0);
        assert_eq!(estimate_words_read(60_000), 250);
        assert_eq!(estimate_words_read(30_000), 125);
        assert_eq!(estimate_words_read(1_000), 4);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(estimate_reading_progress(100, 10_000_000), 100);
        assert_eq!(estimate_reading_progress(500, 60_000), 50);
        assert_eq!(estimate_reading_progress(0, 60_000), 0);
        assert_eq!(estimate_reading_progress(500, 0), 0);
    }

    #[test]
    fn test_zero_speed_uses_default() {
        let estimator = ReadingEstimator::new(0);
        assert_eq!(estimator.words_per_minute(), DEFAULT_WORDS_PER_MINUTE);
        assert_eq!(estimator.reading_time_ms(250), 60_000);
    }
}
