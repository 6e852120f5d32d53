//! 検出履歴ストア
//!
//! 新しい順・最大 [`HISTORY_CAPACITY`] 件の履歴を保持し、
//! 変更のたびにメタデータのみを永続化アダプタへ書き出す。
//! 書き込み失敗はログに残すだけで、メモリ上の状態を優先する。

use crate::store::KeyValueStore;
use crate::types::DetectionRecord;
use std::collections::HashSet;

/// 履歴の最大件数
pub const HISTORY_CAPACITY: usize = 10;

/// 永続化キーのデフォルト
pub const DEFAULT_STORAGE_KEY: &str = "detection_history";

pub struct HistoryStore {
    records: Vec<DetectionRecord>,
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl HistoryStore {
    /// 永続化された履歴を読み込む
    ///
    /// キーが無い・壊れている場合は空の履歴で始める。
    pub fn load(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = match store.get(&key) {
            Ok(Some(raw)) => parse_persisted(&raw, &key),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("履歴の読み込みに失敗 ({}): {}", key, e);
                Vec::new()
            }
        };

        Self { records, store, key }
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn get(&self, id: u64) -> Option<&DetectionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 先頭に追加し、容量を超えた古いレコードを返す
    ///
    /// 同じ `id` が既にあれば置き換える。
    pub fn add(&mut self, record: DetectionRecord) -> Vec<DetectionRecord> {
        self.records.retain(|r| r.id != record.id);
        self.records.insert(0, record);

        let evicted = if self.records.len() > HISTORY_CAPACITY {
            self.records.split_off(HISTORY_CAPACITY)
        } else {
            Vec::new()
        };
        if !evicted.is_empty() {
            tracing::debug!("容量超過で{}件を切り捨て", evicted.len());
        }

        self.persist();
        evicted
    }

    /// `id` のレコードを削除（無ければ何もしない）
    pub fn remove(&mut self, id: u64) -> Option<DetectionRecord> {
        let removed = self
            .records
            .iter()
            .position(|r| r.id == id)
            .map(|idx| self.records.remove(idx));

        self.persist();
        removed
    }

    /// 全件削除し、永続化キー自体も消す
    pub fn clear(&mut self) -> Vec<DetectionRecord> {
        let removed = std::mem::take(&mut self.records);

        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!("履歴キーの削除に失敗 ({}): {}", self.key, e);
        }
        removed
    }

    fn persist(&mut self) {
        let projection = &self.records[..self.records.len().min(HISTORY_CAPACITY)];

        let json = match serde_json::to_string(projection) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("履歴のシリアライズに失敗: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set(&self.key, &json) {
            tracing::warn!("履歴の保存に失敗 ({}): {}", self.key, e);
        }
    }
}

/// 永続化された値をパース（不正なら空）
fn parse_persisted(raw: &str, key: &str) -> Vec<DetectionRecord> {
    let mut records: Vec<DetectionRecord> = match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("保存済み履歴が不正なため破棄 ({}): {}", key, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    records.retain(|r| seen.insert(r.id));
    records.truncate(HISTORY_CAPACITY);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn record(id: u64) -> DetectionRecord {
        DetectionRecord {
            id,
            detections: Vec::new(),
            class_counts: Default::default(),
            confidences: Vec::new(),
            date: format!("date-{}", id),
            filename: format!("photo_{}.jpg", id),
        }
    }

    fn persisted_ids(store: &MemoryStore) -> Vec<u64> {
        let raw = store.raw(DEFAULT_STORAGE_KEY).expect("キーが無い");
        let records: Vec<DetectionRecord> = serde_json::from_str(&raw).unwrap();
        records.into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let history = HistoryStore::load(Box::new(MemoryStore::new()), DEFAULT_STORAGE_KEY);
        assert!(history.is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let mut store = MemoryStore::new();
        store.set(DEFAULT_STORAGE_KEY, "{ broken").unwrap();
        let history = HistoryStore::load(Box::new(store), DEFAULT_STORAGE_KEY);
        assert!(history.is_empty());
    }

    #[test]
    fn test_load_wrong_shape_is_empty() {
        let mut store = MemoryStore::new();
        store.set(DEFAULT_STORAGE_KEY, r#"{"id": 1}"#).unwrap();
        let history = HistoryStore::load(Box::new(store), DEFAULT_STORAGE_KEY);
        assert!(history.is_empty());
    }

    #[test]
    fn test_load_truncates_and_dedupes() {
        let records: Vec<DetectionRecord> = (0..12).map(|i| record(i % 11)).collect();
        let mut store = MemoryStore::new();
        store
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_string(&records).unwrap())
            .unwrap();

        let history = HistoryStore::load(Box::new(store), DEFAULT_STORAGE_KEY);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.records()[0].id, 0);
        let ids: HashSet<u64> = history.records().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_add_prepends_and_persists() {
        let store = MemoryStore::new();
        let mut history = HistoryStore::load(Box::new(store.clone()), DEFAULT_STORAGE_KEY);

        history.add(record(1));
        history.add(record(2));

        assert_eq!(history.records()[0].id, 2);
        assert_eq!(persisted_ids(&store), vec![2, 1]);
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_add_overflow_evicts_oldest() {
        let mut history = HistoryStore::load(Box::new(MemoryStore::new()), DEFAULT_STORAGE_KEY);
        for id in 1..=10 {
            assert!(history.add(record(id)).is_empty());
        }

        let evicted = history.add(record(11));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, 1);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.records()[0].id, 11);
        assert!(!history.contains(1));
    }

    #[test]
    fn test_add_same_id_replaces() {
        let mut history = HistoryStore::load(Box::new(MemoryStore::new()), DEFAULT_STORAGE_KEY);
        history.add(record(1));
        history.add(record(2));

        let mut updated = record(1);
        updated.filename = "renamed.jpg".to_string();
        history.add(updated);

        assert_eq!(history.len(), 2);
        assert_eq!(history.records()[0].filename, "renamed.jpg");
    }

    #[test]
    fn test_remove_keeps_order() {
        let store = MemoryStore::new();
        let mut history = HistoryStore::load(Box::new(store.clone()), DEFAULT_STORAGE_KEY);
        for id in 1..=4 {
            history.add(record(id));
        }

        let writes = store.write_count();
        let removed = history.remove(3).expect("削除対象が無い");
        assert_eq!(removed.id, 3);
        assert_eq!(persisted_ids(&store), vec![4, 2, 1]);
        assert_eq!(store.write_count(), writes + 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store = MemoryStore::new();
        let mut history = HistoryStore::load(Box::new(store.clone()), DEFAULT_STORAGE_KEY);
        history.add(record(1));

        let writes = store.write_count();
        assert!(history.remove(99).is_none());
        assert_eq!(history.len(), 1);
        assert_eq!(persisted_ids(&store), vec![1]);
        assert_eq!(store.write_count(), writes + 1);
    }

    #[test]
    fn test_clear_removes_key() {
        let store = MemoryStore::new();
        let mut history = HistoryStore::load(Box::new(store.clone()), DEFAULT_STORAGE_KEY);
        history.add(record(1));
        history.add(record(2));

        let writes = store.write_count();
        let removed = history.clear();
        assert_eq!(removed.len(), 2);
        assert!(history.is_empty());
        assert!(!store.contains_key(DEFAULT_STORAGE_KEY));
        assert_eq!(store.write_count(), writes + 1);

        // 空の状態でもキー削除を1回だけ行う
        assert!(history.clear().is_empty());
        assert_eq!(store.write_count(), writes + 2);
    }

    #[test]
    fn test_reload_round_trip() {
        let store = MemoryStore::new();
        let mut history = HistoryStore::load(Box::new(store.clone()), "custom_key");
        history.add(record(5));
        history.add(record(6));

        let reloaded = HistoryStore::load(Box::new(store), "custom_key");
        assert_eq!(reloaded.records(), history.records());
        assert_eq!(reloaded.key(), "custom_key");
    }
}
