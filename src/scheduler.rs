//! tokioベースのUndo期限タイマー
//!
//! 期限が来たらチケットをチャネルへ送る。受け取った側が
//! `DetectionHistory::expire_undo` を呼ぶ。

use detection_history_common::{ScheduledTask, Scheduler, UndoTicket};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

pub struct TokioScheduler {
    tx: UnboundedSender<UndoTicket>,
}

impl TokioScheduler {
    /// スケジューラと発火チケットの受信側を作る
    pub fn channel() -> (Self, UnboundedReceiver<UndoTicket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

struct TokioTask(JoinHandle<()>);

impl ScheduledTask for TokioTask {
    fn cancel(self: Box<Self>) {
        self.0.abort();
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, ticket: UndoTicket) -> Box<dyn ScheduledTask> {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ticket);
        });
        Box::new(TokioTask(handle))
    }
}
