use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

/// Current wall-clock time as milliseconds since the Unix epoch.
#[inline]
pub fn current_time_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_time_millis_positive() {
        let now = current_time_millis();
        assert!(now > 0);
    }

    #[test]
    fn test_atomic_read_write() {
        let value = atomic(1u32);
        {
            let mut guard = value.write();
            *guard = 2;
        }
        assert_eq!(*value.read(), 2);
    }
}
