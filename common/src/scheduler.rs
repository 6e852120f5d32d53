//! Undo期限タイマーの抽象
//!
//! タイマーは「期限が来たらチケットを返す」だけで、Undo状態には触らない。
//! 発火したチケットは呼び出し側のイベントループが
//! [`crate::DetectionHistory::expire_undo`] に渡す。

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// 1つのUndoスナップショットを識別するチケット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UndoTicket(pub(crate) u64);

impl UndoTicket {
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

/// 予約済みタスクのハンドル
pub trait ScheduledTask {
    /// 発火前なら取り消す。発火後に呼んでも害はない。
    fn cancel(self: Box<Self>);
}

/// `delay` 後にチケットを届けるスケジューラ
pub trait Scheduler {
    fn schedule(&self, delay: Duration, ticket: UndoTicket) -> Box<dyn ScheduledTask>;
}

/// 何も予約しないスケジューラ（期限は時計で判定）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScheduler;

struct NoopTask;

impl ScheduledTask for NoopTask {
    fn cancel(self: Box<Self>) {}
}

impl Scheduler for NoopScheduler {
    fn schedule(&self, _delay: Duration, _ticket: UndoTicket) -> Box<dyn ScheduledTask> {
        Box::new(NoopTask)
    }
}

#[derive(Debug, Default)]
struct ManualState {
    scheduled: Vec<(UndoTicket, Duration)>,
    cancelled: Vec<UndoTicket>,
}

/// 予約と取り消しを記録するだけのスケジューラ
///
/// テストや、自前のイベントループで期限を回す場合に使う。
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 予約されたチケット（予約順）
    pub fn scheduled(&self) -> Vec<UndoTicket> {
        self.state.borrow().scheduled.iter().map(|(t, _)| *t).collect()
    }

    /// 予約時の待ち時間
    pub fn delay_of(&self, ticket: UndoTicket) -> Option<Duration> {
        self.state
            .borrow()
            .scheduled
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, d)| *d)
    }

    /// 取り消されたチケット
    pub fn cancelled(&self) -> Vec<UndoTicket> {
        self.state.borrow().cancelled.clone()
    }

    /// 予約済みで取り消されていないチケット
    pub fn active(&self) -> Vec<UndoTicket> {
        let state = self.state.borrow();
        state
            .scheduled
            .iter()
            .map(|(t, _)| *t)
            .filter(|t| !state.cancelled.contains(t))
            .collect()
    }
}

struct ManualTask {
    ticket: UndoTicket,
    state: Rc<RefCell<ManualState>>,
}

impl ScheduledTask for ManualTask {
    fn cancel(self: Box<Self>) {
        self.state.borrow_mut().cancelled.push(self.ticket);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, ticket: UndoTicket) -> Box<dyn ScheduledTask> {
        self.state.borrow_mut().scheduled.push((ticket, delay));
        Box::new(ManualTask {
            ticket,
            state: Rc::clone(&self.state),
        })
    }
}
