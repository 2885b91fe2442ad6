use std::sync::Mutex;

use chrono::Utc;

/// Custom epoch: 2024-01-01T00:00:00Z in milliseconds since Unix epoch.
const FORUM_EPOCH_MS: i64 = 1_704_067_200_000;

const WORKER_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

struct State {
    last_ms: i64,
    sequence: i64,
}

/// 64-bit time-ordered ID generator used for comment IDs.
///
/// Layout (MSB → LSB):
/// - Bits 62–22: milliseconds since the forum epoch
/// - Bits 21–12: worker ID
/// - Bits 11–0:  per-millisecond sequence
///
/// If the wall clock steps backwards the generator keeps issuing IDs from
/// the last observed millisecond, so IDs never decrease.
pub struct SnowflakeGenerator {
    worker_id: i64,
    state: Mutex<State>,
}

impl SnowflakeGenerator {
    pub fn new(worker_id: u16) -> Self {
        assert!(
            u32::from(worker_id) < (1 << WORKER_BITS),
            "worker_id must fit in {WORKER_BITS} bits"
        );
        Self {
            worker_id: i64::from(worker_id),
            state: Mutex::new(State {
                last_ms: 0,
                sequence: 0,
            }),
        }
    }

    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let mut now_ms = current_ms().max(state.last_ms);

        if now_ms == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence exhausted; borrow the next millisecond.
                now_ms += 1;
            }
        } else {
            state.sequence = 0;
        }

        state.last_ms = now_ms;

        ((now_ms - FORUM_EPOCH_MS) << (WORKER_BITS + SEQUENCE_BITS))
            | (self.worker_id << SEQUENCE_BITS)
            | state.sequence
    }
}

fn current_ms() -> i64 {
    Utc::now().timestamp_millis()
}
