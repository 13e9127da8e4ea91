use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use rand::Rng;

/// Simulated wall clock that only ever moves forward.
#[derive(Debug, Clone)]
pub struct SimClock {
    now: DateTime<FixedOffset>,
    jump_min_secs: u32,
    jump_max_secs: u32,
}

impl SimClock {
    pub fn new(start: DateTime<FixedOffset>, jump_min_secs: u32, jump_max_secs: u32) -> Self {
        // A zero-second jump would repeat a timestamp.
        let jump_min_secs = jump_min_secs.max(1);
        Self {
            now: start,
            jump_min_secs,
            jump_max_secs: jump_max_secs.max(jump_min_secs),
        }
    }

    /// Starts at the current real time, viewed from a fixed UTC offset.
    pub fn starting_now(utc_offset_hours: i32, jump_min_secs: u32, jump_max_secs: u32) -> Self {
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self::new(Utc::now().with_timezone(&offset), jump_min_secs, jump_max_secs)
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DateTime<FixedOffset> {
        let jump = rng.gen_range(self.jump_min_secs..=self.jump_max_secs);
        self.now += Duration::seconds(i64::from(jump));
        self.now
    }
}
