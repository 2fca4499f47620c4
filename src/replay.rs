//! Replay recorded pointer traces through a binding
//!
//! A trace is JSON lines, one sample per line:
//!
//! ```text
//! {"phase": "start", "x": 100, "y": 100, "t_ms": 0}
//! {"phase": "move",  "x": 10,  "y": 100, "t_ms": 40, "source": "mouse"}
//! {"phase": "end",   "x": 10,  "y": 100, "t_ms": 60}
//! ```
//!
//! `source` defaults to touch. `scroll` reports the surface scroll offset
//! from that sample on. Blank lines and lines starting with `#` are skipped.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use calloop::EventLoop;
use serde::Deserialize;
use tracing::{debug, info};

use crate::bindings::{
    page_recognizer, ItemActionKind, ItemActions, Page, PageNavigator, PullToRefresh,
    RefreshFuture, SwipeableItem,
};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::input::{
    Gesture, GestureHandlers, GestureRecognizer, InputSource, Phase, Point, PointerSample,
};

/// Surface a trace is replayed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Binding {
    /// Plain classifier with every handler bound
    Gestures,
    /// Page container
    Pages,
    /// Pull-to-refresh container
    Refresh,
    /// Swipeable list item
    Item,
}

#[derive(Debug, Clone, Deserialize)]
struct TraceLine {
    phase: Phase,
    x: f64,
    y: f64,
    t_ms: u64,
    #[serde(default)]
    source: InputSource,
    #[serde(default)]
    scroll: Option<f64>,
}

/// One parsed trace sample, timed relative to the start of the trace
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub phase: Phase,
    pub position: Point,
    pub offset: Duration,
    pub source: InputSource,
    pub scroll: Option<f64>,
}

impl TraceEvent {
    fn sample(&self, base: Instant) -> PointerSample {
        PointerSample::new(self.phase, self.position, base + self.offset).with_source(self.source)
    }
}

pub fn parse_trace(input: &str) -> Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    let mut last_offset = Duration::ZERO;

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed: TraceLine = serde_json::from_str(line).map_err(|e| Error::InvalidTrace {
            line: index + 1,
            reason: e.to_string(),
        })?;

        let offset = Duration::from_millis(parsed.t_ms);
        if offset < last_offset {
            return Err(Error::InvalidTrace {
                line: index + 1,
                reason: format!("t_ms {} goes back in time", parsed.t_ms),
            });
        }
        last_offset = offset;

        events.push(TraceEvent {
            phase: parsed.phase,
            position: Point::from((parsed.x, parsed.y)),
            offset,
            source: parsed.source,
            scroll: parsed.scroll,
        });
    }

    Ok(events)
}

/// Something a binding did during a replay
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    Gesture { at: Duration, gesture: Gesture },
    PageChanged { at: Duration, page: Page },
    Refreshed { at: Duration },
    ItemAction { at: Duration, action: ItemActionKind },
}

impl fmt::Display for ReplayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayEvent::Gesture { at, gesture } => {
                write!(f, "{:>6}ms  gesture  {:?}", at.as_millis(), gesture)
            }
            ReplayEvent::PageChanged { at, page } => {
                write!(f, "{:>6}ms  page     {}", at.as_millis(), page)
            }
            ReplayEvent::Refreshed { at } => write!(f, "{:>6}ms  refresh", at.as_millis()),
            ReplayEvent::ItemAction { at, action } => {
                write!(f, "{:>6}ms  item     {:?}", at.as_millis(), action)
            }
        }
    }
}

/// Run `events` through a fresh surface of kind `binding`
pub fn replay(binding: Binding, settings: &Settings, events: &[TraceEvent]) -> Result<Vec<ReplayEvent>> {
    info!(?binding, samples = events.len(), "Replaying trace");
    let base = Instant::now();

    let out = match binding {
        Binding::Gestures => replay_gestures(settings, events, base),
        Binding::Pages => replay_pages(settings, events, base),
        Binding::Refresh => replay_refresh(settings, events, base)?,
        Binding::Item => replay_item(settings, events, base),
    };

    debug!(outcomes = out.len(), "Replay finished");
    Ok(out)
}

fn replay_gestures(settings: &Settings, events: &[TraceEvent], base: Instant) -> Vec<ReplayEvent> {
    // No-op handlers so long presses get scheduled and pulls get tracked
    let handlers = GestureHandlers::new()
        .on_long_press(|| {})
        .on_pull_to_refresh(|| {});
    let mut recognizer = GestureRecognizer::new(settings.gesture_config(), handlers);

    let mut out = Vec::new();
    for event in events {
        if let Some(scroll) = event.scroll {
            recognizer.set_scroll_offset(scroll);
        }
        if let Some(gesture) = recognizer.handle(event.sample(base)).gesture {
            out.push(ReplayEvent::Gesture { at: event.offset, gesture });
        }
    }
    out
}

fn replay_pages(settings: &Settings, events: &[TraceEvent], base: Instant) -> Vec<ReplayEvent> {
    let navigator = Rc::new(RefCell::new(PageNavigator::new(settings.pages.start_page)));
    let mut recognizer = page_recognizer(settings.page_config(), navigator.clone());

    let mut out = Vec::new();
    for event in events {
        let before = navigator.borrow().current();
        recognizer.handle(event.sample(base));
        let after = navigator.borrow().current();
        if after != before {
            out.push(ReplayEvent::PageChanged { at: event.offset, page: after });
        }
    }
    out
}

fn replay_refresh(settings: &Settings, events: &[TraceEvent], base: Instant) -> Result<Vec<ReplayEvent>> {
    let mut event_loop: EventLoop<()> = EventLoop::try_new()?;
    let (executor, scheduler) = calloop::futures::executor::<()>()?;
    event_loop
        .handle()
        .insert_source(executor, |(), _, _| {})
        .map_err(|e| e.error)?;

    let refreshes = Rc::new(Cell::new(0u32));
    let counter = refreshes.clone();
    let mut surface = PullToRefresh::new(settings.pull_to_refresh_config(), scheduler, move || -> RefreshFuture {
        counter.set(counter.get() + 1);
        Box::pin(async { Ok(()) })
    });

    let mut out = Vec::new();
    for event in events {
        if let Some(scroll) = event.scroll {
            surface.set_scroll_offset(scroll);
        }
        let before = refreshes.get();
        surface.handle(event.sample(base));
        if refreshes.get() != before {
            out.push(ReplayEvent::Refreshed { at: event.offset });
        }
        event_loop.dispatch(Some(Duration::ZERO), &mut ())?;
    }
    Ok(out)
}

fn replay_item(settings: &Settings, events: &[TraceEvent], base: Instant) -> Vec<ReplayEvent> {
    let actions = ItemActions::new()
        .on_delete(|| Ok(()))
        .on_favorite(|| Ok(()))
        .on_share(|| Ok(()));
    let mut item = SwipeableItem::new(settings.swipeable_config(), actions);

    let mut out = Vec::new();
    for event in events {
        if let Some(action) = item.handle(event.sample(base)) {
            out.push(ReplayEvent::ItemAction { at: event.offset, action });
        }
    }
    out
}
