//! Cooperative deferred queue
//!
//! Host крутит `resume_deferred()` раз в кадр (PreUpdate), до decision loop.
//! Jobs, отложенные во время resume, ждут следующего кадра.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

type Job = Box<dyn FnOnce()>;

#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<(TaskHandle, Job)>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&self, job: impl FnOnce() + 'static) -> TaskHandle {
        let handle = TaskHandle::default();
        self.queue
            .borrow_mut()
            .push_back((handle.clone(), Box::new(job)));
        handle
    }

    /// Выполняет всё, что было в очереди на момент вызова. Возвращает
    /// число реально запущенных jobs (отменённые не считаются).
    pub fn resume_deferred(&self) -> usize {
        let batch: Vec<(TaskHandle, Job)> = self.queue.borrow_mut().drain(..).collect();

        let mut ran = 0;
        for (handle, job) in batch {
            if handle.is_cancelled() {
                continue;
            }
            handle.finished.set(true);
            job();
            ran += 1;
        }
        ran
    }

    /// Сбрасывает очередь без запуска (teardown)
    pub fn clear(&self) {
        let dropped: Vec<(TaskHandle, Job)> = self.queue.borrow_mut().drain(..).collect();
        for (handle, _) in &dropped {
            handle.cancel();
        }
    }

    pub fn pending(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|(handle, _)| !handle.is_cancelled())
            .count()
    }
}

#[derive(Clone, Default, Debug)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
    finished: Rc<Cell<bool>>,
}

impl TaskHandle {
    /// No-op для уже запущенного job
    pub fn cancel(&self) {
        if !self.finished.get() {
            self.cancelled.set(true);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}
