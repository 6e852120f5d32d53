//! setTimeoutベースのUndo期限タイマー

use detection_history_common::{ScheduledTask, Scheduler, UndoTicket};
use futures::future::{abortable, AbortHandle};
use gloo::timers::future::TimeoutFuture;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;

/// 期限が来たら `on_fire` にチケットを渡す
pub struct TimeoutScheduler {
    on_fire: Rc<dyn Fn(UndoTicket)>,
}

impl TimeoutScheduler {
    pub fn new(on_fire: impl Fn(UndoTicket) + 'static) -> Self {
        Self {
            on_fire: Rc::new(on_fire),
        }
    }
}

struct TimeoutTask(AbortHandle);

impl ScheduledTask for TimeoutTask {
    fn cancel(self: Box<Self>) {
        self.0.abort();
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, ticket: UndoTicket) -> Box<dyn ScheduledTask> {
        let on_fire = Rc::clone(&self.on_fire);
        let (task, handle) = abortable(async move {
            TimeoutFuture::new(delay.as_millis() as u32).await;
            on_fire(ticket);
        });
        spawn_local(async move {
            let _ = task.await;
        });
        Box::new(TimeoutTask(handle))
    }
}
