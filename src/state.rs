use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::SqlitePool;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub staff_locks: StaffLocks,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            staff_locks: StaffLocks::default(),
        }
    }
}

/// Registry of per-staff serialization points. The reservation coordinator
/// holds the staff member's lock across the conflict check and the write, so
/// overlapping requests for the same staff serialize while requests for
/// different staff proceed in parallel.
#[derive(Clone, Default)]
pub struct StaffLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl StaffLocks {
    pub fn lock_for(&self, staff_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.lock();
        // Entries nobody holds a clone of have no holder and no waiter;
        // sweep them so the registry does not outlive the staff catalog.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(staff_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_staff_gets_same_lock() {
        let locks = StaffLocks::default();
        let a = locks.lock_for("staff-1");
        let b = locks.lock_for("staff-1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_staff_get_independent_locks() {
        let locks = StaffLocks::default();
        let a = locks.lock_for("staff-1");
        let b = locks.lock_for("staff-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unreferenced_locks_are_swept() {
        let locks = StaffLocks::default();
        let held = locks.lock_for("staff-1");
        let _ = locks.lock_for("staff-2");
        let _ = locks.lock_for("staff-3");

        // The next lookup sweeps the dropped entries but keeps the held one.
        let _ = locks.lock_for("staff-4");
        assert_eq!(locks.len(), 2);
        assert!(Arc::ptr_eq(&held, &locks.lock_for("staff-1")));
    }
}
