//! 検出履歴ファサード
//!
//! 履歴ストア・プレビューキャッシュ・Undoコントローラをまとめ、
//! UIから呼ばれる操作を提供する。どの操作も同期的に完結し、
//! 履歴にあるレコードのプレビューは「無い」か「入出力が揃っている」かのどちらか。
//!
//! 削除・全消去の確認ダイアログは呼び出し側の責務。

use crate::clock::Clock;
use crate::history::HistoryStore;
use crate::preview::PreviewCache;
use crate::scheduler::{Scheduler, UndoTicket};
use crate::store::KeyValueStore;
use crate::types::{DetectionRecord, PreviewPair};
use crate::undo::{UndoController, UndoItem, UndoKind};
use std::time::Duration;

pub struct DetectionHistory {
    history: HistoryStore,
    previews: PreviewCache,
    undo: UndoController,
}

impl DetectionHistory {
    /// 永続化済みの履歴を読み込んで起動する（プレビューは空）
    pub fn new(
        store: Box<dyn KeyValueStore>,
        key: &str,
        clock: Box<dyn Clock>,
        scheduler: Box<dyn Scheduler>,
    ) -> Self {
        Self {
            history: HistoryStore::load(store, key),
            previews: PreviewCache::new(),
            undo: UndoController::new(clock, scheduler),
        }
    }

    /// 現在の履歴（新しい順）
    pub fn history(&self) -> &[DetectionRecord] {
        self.history.records()
    }

    pub fn record(&self, id: u64) -> Option<&DetectionRecord> {
        self.history.get(id)
    }

    pub fn preview(&self, id: u64) -> Option<&PreviewPair> {
        self.previews.get(id)
    }

    pub fn preview_cache(&self) -> &PreviewCache {
        &self.previews
    }

    /// 新しいレコード用の一意なID
    ///
    /// 現在時刻（ミリ秒）を基本に、履歴中の最大IDより必ず大きくする。
    pub fn next_id(&self) -> u64 {
        let now = self.undo.clock().now_millis();
        let newest = self.history.records().iter().map(|r| r.id).max();
        match newest {
            Some(max) if max >= now => max.checked_add(1).unwrap_or_else(|| {
                tracing::warn!("履歴のIDが上限に達しているため現在時刻を使用: {}", max);
                now
            }),
            _ => now,
        }
    }

    /// 検出結果を履歴の先頭に追加
    pub fn add_detection(
        &mut self,
        record: DetectionRecord,
        input_preview: impl Into<String>,
        output_preview: impl Into<String>,
    ) {
        let preview = PreviewPair::new(input_preview, output_preview);
        self.insert(record, Some(preview));
    }

    fn insert(&mut self, record: DetectionRecord, preview: Option<PreviewPair>) {
        let id = record.id;
        let evicted = self.history.add(record);

        match preview {
            Some(pair) => self.previews.set(id, pair),
            None => {
                self.previews.delete(id);
            }
        }
        for old in evicted {
            self.previews.delete(old.id);
        }
    }

    /// 1件削除（Undo可能）。該当IDが無ければ何もせず `false`。
    pub fn delete_detection(&mut self, id: u64) -> bool {
        let Some(record) = self.history.get(id).cloned() else {
            return false;
        };

        let preview = self.previews.get(id).cloned();
        self.undo
            .capture(UndoKind::Delete, vec![UndoItem { record, preview }]);

        self.history.remove(id);
        self.previews.delete(id);
        true
    }

    /// 全件削除（Undo可能）。削除した件数を返す。
    pub fn clear_history(&mut self) -> usize {
        let items: Vec<UndoItem> = self
            .history
            .records()
            .iter()
            .map(|record| UndoItem {
                record: record.clone(),
                preview: self.previews.get(record.id).cloned(),
            })
            .collect();
        let count = items.len();

        if !items.is_empty() {
            self.undo.capture(UndoKind::Clear, items);
        }

        self.history.clear();
        self.previews.clear();
        count
    }

    /// 直前の削除・全消去を取り消す
    ///
    /// 古い順に追加し直すことで元の並び（新しい順）に戻す。
    /// 保持中のスナップショットが無い・期限切れなら `None`。
    pub fn undo(&mut self) -> Option<UndoKind> {
        let snapshot = self.undo.take()?;
        tracing::debug!(
            "Undo実行: {} ({}件)",
            snapshot.kind.as_str(),
            snapshot.items.len()
        );

        for item in snapshot.items.into_iter().rev() {
            self.insert(item.record, item.preview);
        }
        Some(snapshot.kind)
    }

    /// タイマー発火をUndoコントローラへ渡す
    pub fn expire_undo(&mut self, ticket: UndoTicket) -> bool {
        self.undo.expire(ticket)
    }

    /// Undo可能な操作の種類
    pub fn undo_pending(&self) -> Option<UndoKind> {
        self.undo.pending().map(|s| s.kind)
    }

    pub fn undo_remaining(&self) -> Option<Duration> {
        self.undo.remaining()
    }

    /// 終了処理（保持中のUndoを捨ててタイマーを止める）
    pub fn close(mut self) {
        self.undo.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::history::{DEFAULT_STORAGE_KEY, HISTORY_CAPACITY};
    use crate::scheduler::ManualScheduler;
    use crate::store::MemoryStore;
    use crate::undo::UNDO_WINDOW;

    struct Fixture {
        facade: DetectionHistory,
        store: MemoryStore,
        clock: ManualClock,
        scheduler: ManualScheduler,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_700_000_000_000);
        let scheduler = ManualScheduler::new();
        let facade = DetectionHistory::new(
            Box::new(store.clone()),
            DEFAULT_STORAGE_KEY,
            Box::new(clock.clone()),
            Box::new(scheduler.clone()),
        );
        Fixture {
            facade,
            store,
            clock,
            scheduler,
        }
    }

    fn record(id: u64) -> DetectionRecord {
        DetectionRecord {
            id,
            detections: Vec::new(),
            class_counts: [("ToolBox".to_string(), id as u32)].into_iter().collect(),
            confidences: vec![0.5],
            date: format!("2026/10/18 00:00:{:02}", id % 60),
            filename: format!("img_{}.png", id),
        }
    }

    fn add(facade: &mut DetectionHistory, id: u64) {
        facade.add_detection(record(id), format!("in-{}", id), format!("out-{}", id));
    }

    fn ids(facade: &DetectionHistory) -> Vec<u64> {
        facade.history().iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_add_sets_preview() {
        let mut f = fixture();
        add(&mut f.facade, 1);

        assert_eq!(ids(&f.facade), vec![1]);
        assert_eq!(f.facade.preview(1), Some(&PreviewPair::new("in-1", "out-1")));
    }

    #[test]
    fn test_overflow_drops_preview_without_undo() {
        let mut f = fixture();
        for id in 1..=HISTORY_CAPACITY as u64 + 1 {
            add(&mut f.facade, id);
        }

        assert_eq!(f.facade.history().len(), HISTORY_CAPACITY);
        assert!(f.facade.preview(1).is_none());
        assert_eq!(f.facade.preview_cache().len(), HISTORY_CAPACITY);
        assert!(f.facade.undo_pending().is_none());
        assert!(f.scheduler.scheduled().is_empty());
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut f = fixture();
        add(&mut f.facade, 1);
        let writes = f.store.write_count();

        assert!(!f.facade.delete_detection(2));
        assert_eq!(ids(&f.facade), vec![1]);
        assert!(f.facade.undo_pending().is_none());
        assert_eq!(f.store.write_count(), writes);
    }

    #[test]
    fn test_delete_captures_preview() {
        let mut f = fixture();
        add(&mut f.facade, 1);
        add(&mut f.facade, 2);

        assert!(f.facade.delete_detection(1));
        assert!(f.facade.preview(1).is_none());
        assert_eq!(f.facade.undo_pending(), Some(UndoKind::Delete));

        assert_eq!(f.facade.undo(), Some(UndoKind::Delete));
        assert_eq!(ids(&f.facade), vec![1, 2]);
        assert_eq!(f.facade.preview(1), Some(&PreviewPair::new("in-1", "out-1")));
    }

    #[test]
    fn test_undo_record_without_preview_stays_without_preview() {
        let mut store = MemoryStore::new();
        store
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_string(&vec![record(9)]).unwrap())
            .unwrap();
        let clock = ManualClock::new(1_000);
        let mut facade = DetectionHistory::new(
            Box::new(store),
            DEFAULT_STORAGE_KEY,
            Box::new(clock),
            Box::new(ManualScheduler::new()),
        );

        // リロード直後はプレビューが無い
        assert!(facade.preview(9).is_none());
        facade.delete_detection(9);
        facade.undo();
        assert_eq!(ids(&facade), vec![9]);
        assert!(facade.preview(9).is_none());
    }

    #[test]
    fn test_clear_empty_history_keeps_pending_undo() {
        let mut f = fixture();
        add(&mut f.facade, 1);
        f.facade.delete_detection(1);

        assert_eq!(f.facade.clear_history(), 0);
        assert_eq!(f.facade.undo_pending(), Some(UndoKind::Delete));
        assert!(!f.store.contains_key(DEFAULT_STORAGE_KEY));
    }

    #[test]
    fn test_expire_via_ticket() {
        let mut f = fixture();
        add(&mut f.facade, 1);
        f.facade.delete_detection(1);

        let ticket = f.scheduler.active()[0];
        assert!(f.facade.expire_undo(ticket));
        assert!(f.facade.undo().is_none());
        assert!(f.facade.history().is_empty());
    }

    #[test]
    fn test_undo_remaining_counts_down() {
        let mut f = fixture();
        add(&mut f.facade, 1);
        f.facade.delete_detection(1);
        f.clock.advance(Duration::from_secs(2));

        assert_eq!(f.facade.undo_remaining(), Some(UNDO_WINDOW - Duration::from_secs(2)));
    }

    #[test]
    fn test_next_id_unique_within_same_millisecond() {
        let mut f = fixture();
        let first = f.facade.next_id();
        add(&mut f.facade, first);

        let second = f.facade.next_id();
        assert!(second > first);
    }

    #[test]
    fn test_next_id_with_max_stored_id_does_not_overflow() {
        let mut store = MemoryStore::new();
        store
            .set(DEFAULT_STORAGE_KEY, &format!(r#"[{{"id": {}}}]"#, u64::MAX))
            .unwrap();
        let clock = ManualClock::new(1_700_000_000_000);
        let facade = DetectionHistory::new(
            Box::new(store),
            DEFAULT_STORAGE_KEY,
            Box::new(clock),
            Box::new(ManualScheduler::new()),
        );

        assert_eq!(facade.history()[0].id, u64::MAX);
        assert_eq!(facade.next_id(), 1_700_000_000_000);
    }

    #[test]
    fn test_close_cancels_timer() {
        let mut f = fixture();
        add(&mut f.facade, 1);
        f.facade.delete_detection(1);
        let ticket = f.scheduler.active()[0];

        f.facade.close();
        assert_eq!(f.scheduler.cancelled(), vec![ticket]);
    }
}
