use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Millisecond ids that never repeat or go backwards within one process,
/// even when two posts land in the same millisecond.
#[derive(Debug, Default)]
pub struct IdClock {
    last: AtomicI64,
}

impl IdClock {
    pub fn next_id(&self) -> i64 {
        self.next_id_at(now_millis())
    }

    fn next_id_at(&self, now: i64) -> i64 {
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}
