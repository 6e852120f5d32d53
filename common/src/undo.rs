//! Undoコントローラ
//!
//! 状態は `Idle` と `Pending(snapshot)` の2つだけ。
//!
//! - `capture`: 直前のスナップショットとタイマーを破棄して新しく保持する
//! - `take`: 期限内ならスナップショットを返して `Idle` に戻る
//! - `expire`: タイマー発火。チケットが現在のものと一致するときだけ破棄する
//!
//! タイマーが遅れても、期限切れの判定は時計で行うので復元されない。

use crate::clock::Clock;
use crate::scheduler::{ScheduledTask, Scheduler, UndoTicket};
use crate::types::{DetectionRecord, PreviewPair};
use std::time::Duration;

/// Undo可能な時間
pub const UNDO_WINDOW: Duration = Duration::from_secs(5);

/// 破壊的操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoKind {
    Delete,
    Clear,
}

impl UndoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UndoKind::Delete => "delete",
            UndoKind::Clear => "clear",
        }
    }
}

/// 削除されたレコードとそのプレビュー
#[derive(Debug, Clone, PartialEq)]
pub struct UndoItem {
    pub record: DetectionRecord,
    pub preview: Option<PreviewPair>,
}

/// 取り消し用に退避したデータ
#[derive(Debug, Clone, PartialEq)]
pub struct UndoSnapshot {
    pub kind: UndoKind,
    /// 削除時点の履歴順（新しい順）
    pub items: Vec<UndoItem>,
    /// 期限（UNIXミリ秒）
    pub expires_at: u64,
}

struct Pending {
    snapshot: UndoSnapshot,
    ticket: UndoTicket,
    task: Box<dyn ScheduledTask>,
}

pub struct UndoController {
    pending: Option<Pending>,
    next_ticket: u64,
    window: Duration,
    clock: Box<dyn Clock>,
    scheduler: Box<dyn Scheduler>,
}

impl UndoController {
    pub fn new(clock: Box<dyn Clock>, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            pending: None,
            next_ticket: 1,
            window: UNDO_WINDOW,
            clock,
            scheduler,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// スナップショットを保持してタイマーを張る
    pub fn capture(&mut self, kind: UndoKind, items: Vec<UndoItem>) -> UndoTicket {
        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                "Undoスナップショットを置き換え: {} ({}件) を破棄",
                previous.snapshot.kind.as_str(),
                previous.snapshot.items.len()
            );
            previous.task.cancel();
        }

        let ticket = UndoTicket(self.next_ticket);
        self.next_ticket += 1;

        let expires_at = self.clock.now_millis() + self.window.as_millis() as u64;
        let task = self.scheduler.schedule(self.window, ticket);
        tracing::debug!("Undo待機: {} ({}件)", kind.as_str(), items.len());

        self.pending = Some(Pending {
            snapshot: UndoSnapshot {
                kind,
                items,
                expires_at,
            },
            ticket,
            task,
        });
        ticket
    }

    /// 期限内のスナップショットを取り出す
    ///
    /// 期限切れ・未保持なら `None`。どちらの場合も `Idle` に戻る。
    pub fn take(&mut self) -> Option<UndoSnapshot> {
        let pending = self.pending.take()?;
        pending.task.cancel();

        if self.clock.now_millis() >= pending.snapshot.expires_at {
            tracing::debug!("Undo期限切れ: {}", pending.snapshot.kind.as_str());
            return None;
        }
        Some(pending.snapshot)
    }

    /// タイマー発火時の処理
    ///
    /// 置き換え済みの古いチケットなら何もしない。
    pub fn expire(&mut self, ticket: UndoTicket) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {}
            _ => return false,
        }

        if let Some(expired) = self.pending.take() {
            tracing::debug!("Undo期限切れ: {}", expired.snapshot.kind.as_str());
        }
        true
    }

    /// 期限内の保持中スナップショット
    pub fn pending(&self) -> Option<&UndoSnapshot> {
        let pending = self.pending.as_ref()?;
        (self.clock.now_millis() < pending.snapshot.expires_at).then_some(&pending.snapshot)
    }

    /// 現在のチケット
    pub fn ticket(&self) -> Option<UndoTicket> {
        self.pending.as_ref().map(|p| p.ticket)
    }

    /// 期限までの残り時間
    pub fn remaining(&self) -> Option<Duration> {
        let snapshot = self.pending()?;
        Some(Duration::from_millis(
            snapshot.expires_at - self.clock.now_millis(),
        ))
    }

    /// 保持中のスナップショットを捨ててタイマーを止める
    pub fn discard(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.cancel();
        }
    }
}

impl Drop for UndoController {
    fn drop(&mut self) {
        self.discard();
    }
}
