//! Long-press timers on a calloop event loop
//!
//! [`TouchSurface`] pairs a recognizer with at most one registered
//! [`Timer`]. The timer is armed when a session schedules a long press and
//! removed on every way out: a move, the end of the contact, a cancel, or the
//! surface being dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use tracing::{trace, warn};

use super::gestures::{GestureRecognizer, Response};
use super::pointer::PointerSample;

struct ArmedTimer {
    deadline: Instant,
    token: RegistrationToken,
    /// Cleared by the timer callback once the source has dropped itself
    live: Rc<Cell<bool>>,
}

/// A gesture surface driven by a calloop event loop
pub struct TouchSurface<'l, D> {
    recognizer: Rc<RefCell<GestureRecognizer>>,
    loop_handle: LoopHandle<'l, D>,
    armed: Option<ArmedTimer>,
}

impl<'l, D> TouchSurface<'l, D> {
    pub fn new(loop_handle: LoopHandle<'l, D>, recognizer: GestureRecognizer) -> Self {
        Self {
            recognizer: Rc::new(RefCell::new(recognizer)),
            loop_handle,
            armed: None,
        }
    }

    /// Shared recognizer, e.g. for reporting scroll offsets
    pub fn recognizer(&self) -> &Rc<RefCell<GestureRecognizer>> {
        &self.recognizer
    }

    pub fn is_armed(&self) -> bool {
        self.armed.as_ref().is_some_and(|a| a.live.get())
    }

    pub fn handle(&mut self, sample: PointerSample) -> Response {
        let response = self.recognizer.borrow_mut().handle(sample);
        self.sync_timer();
        response
    }

    /// Make the registered timer match the recognizer's deadline
    fn sync_timer(&mut self) {
        let deadline = self.recognizer.borrow().long_press_deadline();
        let armed_for = self.armed.as_ref().filter(|a| a.live.get()).map(|a| a.deadline);
        if armed_for == deadline {
            return;
        }

        self.disarm();

        let Some(deadline) = deadline else {
            return;
        };

        let recognizer = Rc::downgrade(&self.recognizer);
        let live = Rc::new(Cell::new(true));
        let live_in_timer = live.clone();
        let inserted = self
            .loop_handle
            .insert_source(Timer::from_deadline(deadline), move |_, _, _| {
                live_in_timer.set(false);
                if let Some(recognizer) = recognizer.upgrade() {
                    match recognizer.try_borrow_mut() {
                        Ok(mut recognizer) => {
                            recognizer.poll_long_press(deadline);
                        }
                        Err(_) => warn!("Recognizer busy when long-press timer fired"),
                    }
                }
                TimeoutAction::Drop
            });

        match inserted {
            Ok(token) => {
                trace!("Long-press timer armed");
                self.armed = Some(ArmedTimer { deadline, token, live });
            }
            Err(e) => warn!("Failed to arm long-press timer: {}", e.error),
        }
    }

    fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            if armed.live.get() {
                self.loop_handle.remove(armed.token);
                trace!("Long-press timer removed");
            }
        }
    }
}

impl<D> Drop for TouchSurface<'_, D> {
    fn drop(&mut self) {
        self.disarm();
        if let Ok(mut recognizer) = self.recognizer.try_borrow_mut() {
            recognizer.teardown();
        }
    }
}
