//! 内存记录存储

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ScanRecord;
use crate::store::RecordStore;

type Slot = Arc<Mutex<ScanRecord>>;

/// 内存记录存储
///
/// 外层 `RwLock` 只保护键表，读锁下取出单条记录的 `Arc<Mutex<_>>` 后立即释放，
/// 真正的修改在记录自己的锁内完成。
#[derive(Default)]
pub struct InMemoryRecordStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, scan_id: &str) -> Option<Slot> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(scan_id).cloned()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, scan_id: &str) -> AppResult<Option<ScanRecord>> {
        let Some(slot) = self.slot(scan_id) else {
            return Ok(None);
        };
        let record = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(Some(record))
    }

    fn insert(&self, record: ScanRecord) -> AppResult<()> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.contains_key(&record.scan_id) {
            return Err(AppError::validation(format!(
                "扫描 ID 已存在: {}",
                record.scan_id
            )));
        }
        debug!("[扫描 {}] 新建记录", record.scan_id);
        slots.insert(record.scan_id.clone(), Arc::new(Mutex::new(record)));
        Ok(())
    }

    fn update(&self, scan_id: &str, f: &mut dyn FnMut(&mut ScanRecord)) -> AppResult<bool> {
        let Some(slot) = self.slot(scan_id) else {
            return Ok(false);
        };
        let mut record = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *record);
        Ok(true)
    }

    fn delete(&self, scan_id: &str) -> AppResult<Option<ScanRecord>> {
        let removed = {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            slots.remove(scan_id)
        };
        let Some(slot) = removed else {
            return Ok(None);
        };
        let record = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(Some(record))
    }

    fn list(&self) -> AppResult<Vec<ScanRecord>> {
        let slots: Vec<Slot> = {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            slots.values().cloned().collect()
        };
        let mut records: Vec<ScanRecord> = slots
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.scan_id.cmp(&b.scan_id))
        });
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScanOptions, ScanStatus};
    use crate::store::RecordStoreExt;

    fn record(id: &str) -> ScanRecord {
        ScanRecord::new(id, "some text", ScanOptions::default())
    }

    #[test]
    fn test_insert_get_delete() {
        let store = InMemoryRecordStore::new();
        store.insert(record("a")).unwrap();

        assert!(store.insert(record("a")).is_err());
        assert_eq!(store.get("a").unwrap().unwrap().scan_id, "a");
        assert!(store.get("missing").unwrap().is_none());

        assert!(store.delete("a").unwrap().is_some());
        assert!(store.delete("a").unwrap().is_none());
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_modify_missing_returns_none() {
        let store = InMemoryRecordStore::new();
        let out = store.modify("nope", |r| r.status).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_get_returns_snapshot() {
        let store = InMemoryRecordStore::new();
        store.insert(record("a")).unwrap();

        let mut snapshot = store.get("a").unwrap().unwrap();
        snapshot.status = ScanStatus::Error;

        assert_eq!(store.get("a").unwrap().unwrap().status, ScanStatus::Queued);
    }

    #[test]
    fn test_concurrent_appends_are_serialized() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.insert(record("a")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        store
                            .modify("a", |r| r.new_results.push(serde_json::json!({"t": i, "n": j})))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get("a").unwrap().unwrap().new_results.len(), 400);
    }

    #[test]
    fn test_list_sorted_by_creation() {
        let store = InMemoryRecordStore::new();
        store.insert(record("first")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.insert(record("second")).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.scan_id).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
