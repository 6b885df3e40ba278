use dashmap::DashMap;
use uuid::Uuid;

use crate::models::fix::DriverFix;

/// Shared driver-fix store. Single writer per driver (the owning session),
/// any number of readers; writes replace the whole record, so readers always
/// see a complete fix without locking.
#[derive(Default)]
pub struct FixStore {
    fixes: DashMap<Uuid, DriverFix>,
}

impl FixStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_fix(&self, driver_id: Uuid, fix: DriverFix) {
        self.fixes.insert(driver_id, fix);
    }

    pub fn read_fix(&self, driver_id: &Uuid) -> Option<DriverFix> {
        self.fixes.get(driver_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::FixStore;
    use crate::models::coordinate::Coordinate;
    use crate::models::fix::{DriverFix, FixSource};

    #[test]
    fn latest_write_wins() {
        let store = FixStore::new();
        let driver_id = Uuid::new_v4();

        store.write_fix(
            driver_id,
            DriverFix::now(Coordinate::new(25.1, 55.2), FixSource::OneShot),
        );
        store.write_fix(
            driver_id,
            DriverFix {
                coordinate: Coordinate::new(25.2, 55.3),
                captured_at: Utc::now(),
                source: FixSource::Watch,
            },
        );

        let fix = store.read_fix(&driver_id).unwrap();
        assert_eq!(fix.coordinate, Coordinate::new(25.2, 55.3));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_driver_reads_none() {
        let store = FixStore::new();
        assert!(store.read_fix(&Uuid::new_v4()).is_none());
        assert!(store.is_empty());
    }
}
