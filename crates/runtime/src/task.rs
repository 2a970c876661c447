//! Cancellable repeating task used to drive the render loop.
//!
//! The loop is modelled as an explicit handle instead of a self-requeueing
//! callback: the host calls [`RepeatingTask::tick`] once per display frame
//! and teardown cancels through any clone of the [`TaskHandle`].

use std::cell::Cell;
use std::ops::ControlFlow;
use std::rc::Rc;

use crate::frame::{Frame, FrameClock};

/// Shared cancellation flag for a scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: &'static str,
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn cancel(&self) {
        if !self.cancelled.replace(true) {
            tracing::debug!(task = self.id, "task cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// A task that runs once per frame until cancelled.
#[derive(Debug)]
pub struct RepeatingTask {
    handle: TaskHandle,
    clock: FrameClock,
}

impl RepeatingTask {
    pub fn new(id: &'static str, clock: FrameClock) -> Self {
        Self {
            handle: TaskHandle {
                id,
                cancelled: Rc::new(Cell::new(false)),
            },
            clock,
        }
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    pub fn frames_run(&self) -> u64 {
        self.clock.frames_elapsed()
    }

    /// Run `body` for the next frame unless the task was cancelled.
    ///
    /// `body` may request cancellation by returning `ControlFlow::Break`.
    pub fn tick<F>(&mut self, body: F) -> Option<Frame>
    where
        F: FnOnce(Frame) -> ControlFlow<()>,
    {
        if self.handle.is_cancelled() {
            return None;
        }
        let frame = self.clock.advance();
        if body(frame).is_break() {
            self.handle.cancel();
        }
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::RepeatingTask;
    use crate::frame::FrameClock;
    use std::ops::ControlFlow;

    #[test]
    fn ticks_until_cancelled_through_handle() {
        let mut task = RepeatingTask::new("render", FrameClock::new(60.0));
        let handle = task.handle();
        let mut seen = Vec::new();

        assert!(task.tick(|f| {
            seen.push(f.index);
            ControlFlow::Continue(())
        })
        .is_some());
        handle.cancel();
        assert!(task.tick(|f| {
            seen.push(f.index);
            ControlFlow::Continue(())
        })
        .is_none());

        assert_eq!(seen, vec![0]);
        assert!(task.is_cancelled());
    }

    #[test]
    fn body_can_break_the_loop() {
        let mut task = RepeatingTask::new("render", FrameClock::default());
        for _ in 0..10 {
            let ran = task.tick(|f| {
                if f.index == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });
            if ran.is_none() {
                break;
            }
        }
        assert!(task.is_cancelled());
        assert_eq!(task.frames_run(), 3);
    }
}
