//! Pull to refresh
//!
//! While a downward drag that started on a scrolled-to-top surface is in
//! progress, the binding tracks a damped pull distance for the indicator.
//! Releasing past the threshold runs the refresh action once on the calloop
//! executor; no new pull can start until it settles.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use calloop::futures::Scheduler;
use tracing::{debug, error, info};

use crate::input::{Disposition, Phase, PointerSample, Session};

/// Drag distance is halved before it moves the indicator
pub const PULL_DAMPING: f64 = 0.5;

/// Pull distance never exceeds this multiple of the threshold
pub const PULL_CAP_FACTOR: f64 = 1.5;

pub type RefreshFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;

#[derive(Debug, Clone)]
pub struct PullToRefreshConfig {
    /// Damped pull distance needed to trigger a refresh
    pub threshold: f64,
    pub disabled: bool,
}

impl Default for PullToRefreshConfig {
    fn default() -> Self {
        Self {
            threshold: 80.0,
            disabled: false,
        }
    }
}

pub struct PullToRefresh {
    pub config: PullToRefreshConfig,
    action: Box<dyn FnMut() -> RefreshFuture>,
    scheduler: Scheduler<()>,
    session: Option<Session>,
    scroll_offset: f64,
    pull_distance: f64,
    can_refresh: bool,
    refreshing: Rc<Cell<bool>>,
}

impl PullToRefresh {
    pub fn new(
        config: PullToRefreshConfig,
        scheduler: Scheduler<()>,
        action: impl FnMut() -> RefreshFuture + 'static,
    ) -> Self {
        Self {
            config,
            action: Box::new(action),
            scheduler,
            session: None,
            scroll_offset: 0.0,
            pull_distance: 0.0,
            can_refresh: false,
            refreshing: Rc::new(Cell::new(false)),
        }
    }

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset;
    }

    /// Damped pull distance, for translating the content
    pub fn pull_distance(&self) -> f64 {
        self.pull_distance
    }

    /// Releasing now would refresh
    pub fn can_refresh(&self) -> bool {
        self.can_refresh
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.get()
    }

    /// Indicator opacity and scale, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        (self.pull_distance / self.config.threshold).min(1.0)
    }

    /// Vertical offset of the indicator; hidden above the surface at rest
    pub fn indicator_offset(&self) -> f64 {
        (self.pull_distance - self.config.threshold).max(-self.config.threshold)
    }

    fn at_top(&self) -> bool {
        self.scroll_offset <= 0.0
    }

    pub fn handle(&mut self, sample: PointerSample) -> Disposition {
        if self.config.disabled {
            return Disposition::Passthrough;
        }

        match sample.phase {
            Phase::Start => {
                if self.at_top() && !self.is_refreshing() {
                    self.session = Some(Session::new(&sample));
                } else {
                    self.session = None;
                }
                Disposition::Passthrough
            }
            Phase::Move => self.pull(&sample),
            Phase::End => {
                if self.can_refresh && !self.is_refreshing() {
                    self.start_refresh();
                }
                self.reset();
                Disposition::Passthrough
            }
            Phase::Cancel => {
                self.reset();
                Disposition::Passthrough
            }
        }
    }

    fn pull(&mut self, sample: &PointerSample) -> Disposition {
        if !self.at_top() || self.is_refreshing() {
            return Disposition::Passthrough;
        }
        let Some(session) = self.session.as_mut() else {
            return Disposition::Passthrough;
        };

        session.update(sample);
        let distance = session.delta().y;
        if distance <= 0.0 {
            self.pull_distance = 0.0;
            self.can_refresh = false;
            return Disposition::Passthrough;
        }

        let cap = self.config.threshold * PULL_CAP_FACTOR;
        self.pull_distance = (distance * PULL_DAMPING).min(cap);
        self.can_refresh = self.pull_distance >= self.config.threshold;
        Disposition::Captured
    }

    fn start_refresh(&mut self) {
        info!("Pull to refresh triggered");
        self.refreshing.set(true);

        let refresh = (self.action)();
        let refreshing = self.refreshing.clone();
        let task = async move {
            match refresh.await {
                Ok(()) => debug!("Refresh finished"),
                Err(e) => error!("Refresh failed: {:#}", e),
            }
            refreshing.set(false);
        };

        if let Err(e) = self.scheduler.schedule(task) {
            error!("Refresh could not be scheduled: {:?}", e);
            self.refreshing.set(false);
        }
    }

    fn reset(&mut self) {
        self.session = None;
        self.pull_distance = 0.0;
        self.can_refresh = false;
    }
}

impl fmt::Debug for PullToRefresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullToRefresh")
            .field("config", &self.config)
            .field("pull_distance", &self.pull_distance)
            .field("can_refresh", &self.can_refresh)
            .field("refreshing", &self.refreshing.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Point;
    use calloop::EventLoop;
    use std::time::{Duration, Instant};

    fn event_loop() -> (EventLoop<'static, ()>, Scheduler<()>) {
        let event_loop = EventLoop::try_new().unwrap();
        let (executor, scheduler) = calloop::futures::executor::<()>().unwrap();
        event_loop
            .handle()
            .insert_source(executor, |(), _, _| {})
            .unwrap();
        (event_loop, scheduler)
    }

    fn settle(event_loop: &mut EventLoop<'static, ()>) {
        for _ in 0..3 {
            event_loop.dispatch(Some(Duration::ZERO), &mut ()).unwrap();
        }
    }

    fn sample(phase: Phase, x: f64, y: f64) -> PointerSample {
        PointerSample::new(phase, Point::from((x, y)), Instant::now())
    }

    fn counting_action(calls: Rc<Cell<u32>>, fail: bool) -> impl FnMut() -> RefreshFuture {
        move || -> RefreshFuture {
            calls.set(calls.get() + 1);
            Box::pin(async move {
                if fail {
                    anyhow::bail!("network unreachable");
                }
                Ok(())
            })
        }
    }

    #[test]
    fn test_pull_triggers_refresh_once() {
        let (mut event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), false),
        );

        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        let disposition = ptr.handle(sample(Phase::Move, 0.0, 200.0));
        assert_eq!(disposition, Disposition::Captured);
        assert_eq!(ptr.pull_distance(), 100.0);
        assert!(ptr.can_refresh());
        assert_eq!(ptr.progress(), 1.0);

        ptr.handle(sample(Phase::End, 0.0, 200.0));
        assert_eq!(calls.get(), 1);
        assert!(ptr.is_refreshing());
        assert_eq!(ptr.pull_distance(), 0.0);
        assert!(!ptr.can_refresh());

        settle(&mut event_loop);
        assert!(!ptr.is_refreshing());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_pull_distance_is_capped() {
        let (_event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls, false),
        );

        ptr.handle(sample(Phase::Start, 0.0, 10.0));
        ptr.handle(sample(Phase::Move, 0.0, 1010.0));
        assert_eq!(ptr.pull_distance(), 120.0);
        assert_eq!(ptr.indicator_offset(), 40.0);
    }

    #[test]
    fn test_short_pull_does_not_refresh() {
        let (_event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), false),
        );

        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        ptr.handle(sample(Phase::Move, 0.0, 100.0));
        assert_eq!(ptr.pull_distance(), 50.0);
        assert!(!ptr.can_refresh());
        ptr.handle(sample(Phase::End, 0.0, 100.0));

        assert_eq!(calls.get(), 0);
        assert!(!ptr.is_refreshing());
    }

    #[test]
    fn test_refresh_in_flight_blocks_new_pulls() {
        let (mut event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), false),
        );

        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        ptr.handle(sample(Phase::Move, 0.0, 240.0));
        ptr.handle(sample(Phase::End, 0.0, 240.0));
        assert!(ptr.is_refreshing());

        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        let disposition = ptr.handle(sample(Phase::Move, 0.0, 240.0));
        assert_eq!(disposition, Disposition::Passthrough);
        assert_eq!(ptr.pull_distance(), 0.0);
        ptr.handle(sample(Phase::End, 0.0, 240.0));
        assert_eq!(calls.get(), 1);

        settle(&mut event_loop);
        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        ptr.handle(sample(Phase::Move, 0.0, 240.0));
        ptr.handle(sample(Phase::End, 0.0, 240.0));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_failed_refresh_is_swallowed() {
        let (mut event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), true),
        );

        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        ptr.handle(sample(Phase::Move, 0.0, 200.0));
        ptr.handle(sample(Phase::End, 0.0, 200.0));
        settle(&mut event_loop);

        assert_eq!(calls.get(), 1);
        assert!(!ptr.is_refreshing());
        assert_eq!(ptr.pull_distance(), 0.0);
    }

    #[test]
    fn test_scrolled_or_disabled_surface_ignores_pulls() {
        let (_event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), false),
        );

        ptr.set_scroll_offset(120.0);
        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        ptr.handle(sample(Phase::Move, 0.0, 300.0));
        ptr.handle(sample(Phase::End, 0.0, 300.0));

        ptr.set_scroll_offset(0.0);
        ptr.config.disabled = true;
        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        ptr.handle(sample(Phase::Move, 0.0, 300.0));
        ptr.handle(sample(Phase::End, 0.0, 300.0));

        assert_eq!(calls.get(), 0);
        assert_eq!(ptr.pull_distance(), 0.0);
    }

    #[test]
    fn test_pulling_back_up_drops_the_refresh() {
        let (_event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), false),
        );

        ptr.handle(sample(Phase::Start, 0.0, 50.0));
        ptr.handle(sample(Phase::Move, 0.0, 250.0));
        assert!(ptr.can_refresh());

        let disposition = ptr.handle(sample(Phase::Move, 0.0, 20.0));
        assert_eq!(disposition, Disposition::Passthrough);
        assert_eq!(ptr.pull_distance(), 0.0);
        assert!(!ptr.can_refresh());

        ptr.handle(sample(Phase::End, 0.0, 20.0));
        assert_eq!(calls.get(), 0);
        assert!(!ptr.is_refreshing());
    }

    #[test]
    fn test_pull_may_start_anywhere_on_a_top_scrolled_surface() {
        let (_event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), false),
        );

        ptr.handle(sample(Phase::Start, 0.0, 500.0));
        ptr.handle(sample(Phase::Move, 0.0, 700.0));
        ptr.handle(sample(Phase::End, 0.0, 700.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_cancel_resets_without_refresh() {
        let (_event_loop, scheduler) = event_loop();
        let calls = Rc::new(Cell::new(0));
        let mut ptr = PullToRefresh::new(
            PullToRefreshConfig::default(),
            scheduler,
            counting_action(calls.clone(), false),
        );

        ptr.handle(sample(Phase::Start, 0.0, 0.0));
        ptr.handle(sample(Phase::Move, 0.0, 200.0));
        ptr.handle(sample(Phase::Cancel, 0.0, 200.0));
        ptr.handle(sample(Phase::End, 0.0, 200.0));

        assert_eq!(calls.get(), 0);
        assert_eq!(ptr.pull_distance(), 0.0);
    }
}
