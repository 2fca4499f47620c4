//! Gesture recognition for a single pointer surface
//!
//! One contact at a time is tracked as a [`Session`]. When the contact ends
//! the session is classified into at most one gesture:
//! - Tap
//! - Long press (fires mid-session once the delay elapses without movement)
//! - Swipe left/right/up/down
//! - Pull to refresh (contact started at the top of a scrolled-to-top surface)
//!
//! The recognizer never owns a clock. Sample timestamps drive everything, and
//! hosts with a real event loop arm a timer from [`GestureRecognizer::long_press_deadline`]
//! (see [`super::timer::TouchSurface`]).

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::pointer::{Phase, Point, PointerSample};

/// Direction of a swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Recognized gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Contact released without meaningful movement
    Tap,

    /// Contact held still past the long-press delay
    LongPress,

    /// Directional swipe, `distance` measured along the dominant axis
    Swipe {
        direction: SwipeDirection,
        distance: f64,
    },

    /// Downward pull that started at the top of the surface
    PullToRefresh,
}

/// What the host should do with the platform's native handling of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Let the platform scroll as usual
    #[default]
    Passthrough,
    /// The sample belongs to a gesture; suppress native scrolling
    Captured,
}

/// Result of feeding one sample to a recognizer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Response {
    pub gesture: Option<Gesture>,
    pub disposition: Disposition,
}

impl Response {
    fn gesture(gesture: Option<Gesture>) -> Self {
        Self {
            gesture,
            disposition: Disposition::Passthrough,
        }
    }
}

/// Configuration for gesture recognition
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Distance along the dominant axis required for a swipe
    pub swipe_threshold: f64,

    /// Hold time before a long press fires
    pub long_press_delay: Duration,

    /// Maximum movement on each axis for a moved contact to still count as a tap
    pub tap_jitter: f64,

    /// Height of the top-edge zone a pull must start in, and the downward
    /// distance it must travel
    pub pull_zone: f64,

    /// Maximum sideways drift for a pull to refresh
    pub pull_max_drift: f64,

    /// Ignore all input
    pub disabled: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 50.0,
            long_press_delay: Duration::from_millis(500),
            tap_jitter: 10.0,
            pull_zone: 100.0,
            pull_max_drift: 50.0,
            disabled: false,
        }
    }
}

/// State of one continuous pointer contact
#[derive(Debug, Clone)]
pub struct Session {
    pub start_pos: Point,
    pub start_time: Instant,
    pub current_pos: Point,
    pub last_time: Instant,
    /// At least one move sample was seen
    pub moved: bool,
    /// Started at the top of a scrolled-to-top surface with a pull handler bound
    pub pull_candidate: bool,
    pub long_press_deadline: Option<Instant>,
    pub long_press_fired: bool,
}

impl Session {
    pub fn new(sample: &PointerSample) -> Self {
        Self {
            start_pos: sample.position,
            start_time: sample.time,
            current_pos: sample.position,
            last_time: sample.time,
            moved: false,
            pull_candidate: false,
            long_press_deadline: None,
            long_press_fired: false,
        }
    }

    pub fn update(&mut self, sample: &PointerSample) {
        self.current_pos = sample.position;
        self.last_time = sample.time;
        self.moved = true;
    }

    pub fn delta(&self) -> Point {
        self.current_pos.delta_from(self.start_pos)
    }

    pub fn long_press_scheduled(&self) -> bool {
        self.long_press_deadline.is_some()
    }
}

/// Classify a finished session.
///
/// Pull to refresh is checked before directional swipes. Equal horizontal
/// and vertical deltas count as neither direction.
pub fn classify(session: &Session, config: &GestureConfig) -> Option<Gesture> {
    if !session.moved {
        return (!session.long_press_fired).then_some(Gesture::Tap);
    }

    let delta = session.delta();
    let (abs_x, abs_y) = (delta.x.abs(), delta.y.abs());

    if session.pull_candidate && delta.y > config.pull_zone && abs_x < config.pull_max_drift {
        return Some(Gesture::PullToRefresh);
    }

    if abs_x > abs_y && abs_x > config.swipe_threshold {
        let direction = if delta.x < 0.0 {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        };
        return Some(Gesture::Swipe { direction, distance: abs_x });
    }

    if abs_y > abs_x && abs_y > config.swipe_threshold {
        let direction = if delta.y < 0.0 {
            SwipeDirection::Up
        } else {
            SwipeDirection::Down
        };
        return Some(Gesture::Swipe { direction, distance: abs_y });
    }

    if abs_x < config.tap_jitter && abs_y < config.tap_jitter {
        return Some(Gesture::Tap);
    }

    None
}

pub type Callback = Box<dyn FnMut()>;

/// Callbacks bound to a recognizer, all optional.
///
/// Binding `on_long_press` is what schedules long-press timers, and binding
/// `on_pull_to_refresh` is what makes top-of-surface contacts pull candidates.
#[derive(Default)]
pub struct GestureHandlers {
    swipe_left: Option<Callback>,
    swipe_right: Option<Callback>,
    swipe_up: Option<Callback>,
    swipe_down: Option<Callback>,
    tap: Option<Callback>,
    long_press: Option<Callback>,
    pull_to_refresh: Option<Callback>,
}

impl GestureHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_swipe_left(mut self, f: impl FnMut() + 'static) -> Self {
        self.swipe_left = Some(Box::new(f));
        self
    }

    pub fn on_swipe_right(mut self, f: impl FnMut() + 'static) -> Self {
        self.swipe_right = Some(Box::new(f));
        self
    }

    pub fn on_swipe_up(mut self, f: impl FnMut() + 'static) -> Self {
        self.swipe_up = Some(Box::new(f));
        self
    }

    pub fn on_swipe_down(mut self, f: impl FnMut() + 'static) -> Self {
        self.swipe_down = Some(Box::new(f));
        self
    }

    pub fn on_tap(mut self, f: impl FnMut() + 'static) -> Self {
        self.tap = Some(Box::new(f));
        self
    }

    pub fn on_long_press(mut self, f: impl FnMut() + 'static) -> Self {
        self.long_press = Some(Box::new(f));
        self
    }

    pub fn on_pull_to_refresh(mut self, f: impl FnMut() + 'static) -> Self {
        self.pull_to_refresh = Some(Box::new(f));
        self
    }

    pub fn has_long_press(&self) -> bool {
        self.long_press.is_some()
    }

    pub fn has_pull_to_refresh(&self) -> bool {
        self.pull_to_refresh.is_some()
    }

    /// Invoke the callback bound to `gesture`, if any
    pub fn dispatch(&mut self, gesture: &Gesture) {
        let callback = match gesture {
            Gesture::Tap => &mut self.tap,
            Gesture::LongPress => &mut self.long_press,
            Gesture::PullToRefresh => &mut self.pull_to_refresh,
            Gesture::Swipe { direction, .. } => match direction {
                SwipeDirection::Left => &mut self.swipe_left,
                SwipeDirection::Right => &mut self.swipe_right,
                SwipeDirection::Up => &mut self.swipe_up,
                SwipeDirection::Down => &mut self.swipe_down,
            },
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl fmt::Debug for GestureHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureHandlers")
            .field("swipe_left", &self.swipe_left.is_some())
            .field("swipe_right", &self.swipe_right.is_some())
            .field("swipe_up", &self.swipe_up.is_some())
            .field("swipe_down", &self.swipe_down.is_some())
            .field("tap", &self.tap.is_some())
            .field("long_press", &self.long_press.is_some())
            .field("pull_to_refresh", &self.pull_to_refresh.is_some())
            .finish()
    }
}

/// Gesture recognizer owning the session state of one surface
#[derive(Debug)]
pub struct GestureRecognizer {
    pub config: GestureConfig,
    handlers: GestureHandlers,
    session: Option<Session>,
    /// Vertical scroll position of the surface, reported by the host
    scroll_offset: f64,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig, handlers: GestureHandlers) -> Self {
        Self {
            config,
            handlers,
            session: None,
            scroll_offset: 0.0,
        }
    }

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn has_active_session(&self) -> bool {
        self.session.is_some()
    }

    /// When the pending long press fires, if one is scheduled
    pub fn long_press_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and_then(|s| s.long_press_deadline)
    }

    /// Feed one sample through the recognizer
    pub fn handle(&mut self, sample: PointerSample) -> Response {
        if self.config.disabled {
            return Response::default();
        }

        // A timer would already have fired before this sample arrived
        let flushed = self.poll_long_press(sample.time);
        let mut response = self.dispatch_sample(&sample);
        if flushed.is_some() {
            response.gesture = response.gesture.or(flushed);
        }
        response
    }

    fn dispatch_sample(&mut self, sample: &PointerSample) -> Response {
        match sample.phase {
            Phase::Start => self.pointer_down(sample),
            Phase::Move => self.pointer_motion(sample),
            Phase::End => self.pointer_up(sample),
            Phase::Cancel => {
                self.cancel();
                Response::default()
            }
        }
    }

    fn pointer_down(&mut self, sample: &PointerSample) -> Response {
        if self.session.take().is_some() {
            debug!("New contact replaced an unfinished session");
        }

        let mut session = Session::new(sample);
        if self.handlers.has_long_press() {
            session.long_press_deadline = Some(sample.time + self.config.long_press_delay);
        }
        if self.handlers.has_pull_to_refresh()
            && self.scroll_offset <= 0.0
            && sample.position.y < self.config.pull_zone
        {
            session.pull_candidate = true;
        }

        trace!(x = sample.position.x, y = sample.position.y, "Session started");
        self.session = Some(session);
        Response::default()
    }

    fn pointer_motion(&mut self, sample: &PointerSample) -> Response {
        let Some(session) = self.session.as_mut() else {
            return Response::default();
        };

        session.update(sample);
        // Any movement at all cancels a pending long press
        session.long_press_deadline = None;

        let disposition = if session.pull_candidate && session.delta().y > self.config.pull_zone {
            Disposition::Captured
        } else {
            Disposition::Passthrough
        };

        Response {
            gesture: None,
            disposition,
        }
    }

    fn pointer_up(&mut self, _sample: &PointerSample) -> Response {
        let Some(mut session) = self.session.take() else {
            return Response::default();
        };
        session.long_press_deadline = None;

        let gesture = classify(&session, &self.config);
        if let Some(ref g) = gesture {
            debug!(gesture = ?g, "Gesture recognized");
            self.handlers.dispatch(g);
        }
        Response::gesture(gesture)
    }

    /// Fire the long press if its deadline has passed by `now`
    pub fn poll_long_press(&mut self, now: Instant) -> Option<Gesture> {
        if self.config.disabled {
            return None;
        }
        let session = self.session.as_mut()?;
        let deadline = session.long_press_deadline?;
        if now < deadline {
            return None;
        }

        session.long_press_deadline = None;
        session.long_press_fired = true;
        debug!("Long press recognized");
        self.handlers.dispatch(&Gesture::LongPress);
        Some(Gesture::LongPress)
    }

    /// Abandon the current session without emitting anything
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            trace!("Session cancelled");
        }
    }

    /// Surface is going away; nothing may fire after this
    pub fn teardown(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample(phase: Phase, x: f64, y: f64, time: Instant) -> PointerSample {
        PointerSample::new(phase, Point::from((x, y)), time)
    }

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    /// Recognizer with every handler bound, recording gesture names
    fn recording(config: GestureConfig) -> (GestureRecognizer, Rc<RefCell<Vec<&'static str>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let push = |name: &'static str| {
            let log = log.clone();
            move || log.borrow_mut().push(name)
        };
        let handlers = GestureHandlers::new()
            .on_swipe_left(push("left"))
            .on_swipe_right(push("right"))
            .on_swipe_up(push("up"))
            .on_swipe_down(push("down"))
            .on_tap(push("tap"))
            .on_long_press(push("long_press"))
            .on_pull_to_refresh(push("pull"));
        (GestureRecognizer::new(config, handlers), log)
    }

    #[test]
    fn test_tap_without_moves() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 0.0, 0.0, t));
        let response = r.handle(sample(Phase::End, 0.0, 0.0, ms(t, 50)));

        assert_eq!(response.gesture, Some(Gesture::Tap));
        assert_eq!(*log.borrow(), vec!["tap"]);
        assert!(!r.has_active_session());
    }

    #[test]
    fn test_swipe_left() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 100.0, 100.0, t));
        r.handle(sample(Phase::Move, 10.0, 100.0, ms(t, 20)));
        let response = r.handle(sample(Phase::End, 10.0, 100.0, ms(t, 40)));

        assert_eq!(
            response.gesture,
            Some(Gesture::Swipe { direction: SwipeDirection::Left, distance: 90.0 })
        );
        assert_eq!(*log.borrow(), vec!["left"]);
    }

    #[test]
    fn test_vertical_swipes() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.set_scroll_offset(300.0);

        r.handle(sample(Phase::Start, 200.0, 400.0, t));
        r.handle(sample(Phase::Move, 210.0, 300.0, ms(t, 10)));
        r.handle(sample(Phase::End, 210.0, 300.0, ms(t, 20)));

        r.handle(sample(Phase::Start, 200.0, 300.0, ms(t, 100)));
        r.handle(sample(Phase::Move, 190.0, 380.0, ms(t, 110)));
        r.handle(sample(Phase::End, 190.0, 380.0, ms(t, 120)));

        assert_eq!(*log.borrow(), vec!["up", "down"]);
    }

    #[test]
    fn test_equal_deltas_are_not_a_swipe() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 200.0, 200.0, t));
        r.handle(sample(Phase::Move, 280.0, 280.0, ms(t, 10)));
        let response = r.handle(sample(Phase::End, 280.0, 280.0, ms(t, 20)));

        assert_eq!(response.gesture, None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_small_move_is_tap() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 200.0, 200.0, t));
        r.handle(sample(Phase::Move, 204.0, 197.0, ms(t, 10)));
        r.handle(sample(Phase::End, 204.0, 197.0, ms(t, 20)));

        assert_eq!(*log.borrow(), vec!["tap"]);
    }

    #[test]
    fn test_below_threshold_is_nothing() {
        let (mut r, _log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 200.0, 200.0, t));
        r.handle(sample(Phase::Move, 230.0, 200.0, ms(t, 10)));
        let response = r.handle(sample(Phase::End, 230.0, 200.0, ms(t, 20)));
        assert_eq!(response.gesture, None);
    }

    #[test]
    fn test_long_press_fires_once() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 0.0, 0.0, t));
        assert_eq!(r.long_press_deadline(), Some(ms(t, 500)));

        assert_eq!(r.poll_long_press(ms(t, 499)), None);
        assert_eq!(r.poll_long_press(ms(t, 500)), Some(Gesture::LongPress));
        assert_eq!(r.poll_long_press(ms(t, 550)), None);

        let response = r.handle(sample(Phase::End, 0.0, 0.0, ms(t, 600)));
        assert_eq!(response.gesture, None);
        assert_eq!(*log.borrow(), vec!["long_press"]);
    }

    #[test]
    fn test_overdue_long_press_flushed_on_end() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 0.0, 0.0, t));
        let response = r.handle(sample(Phase::End, 0.0, 0.0, ms(t, 600)));

        assert_eq!(response.gesture, Some(Gesture::LongPress));
        assert_eq!(*log.borrow(), vec!["long_press"]);
    }

    #[test]
    fn test_any_move_cancels_long_press() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 50.0, 50.0, t));
        r.handle(sample(Phase::Move, 50.5, 50.0, ms(t, 100)));
        assert_eq!(r.long_press_deadline(), None);

        assert_eq!(r.poll_long_press(ms(t, 700)), None);
        r.handle(sample(Phase::End, 50.5, 50.0, ms(t, 800)));
        assert_eq!(*log.borrow(), vec!["tap"]);
    }

    #[test]
    fn test_no_long_press_without_handler() {
        let mut r = GestureRecognizer::new(GestureConfig::default(), GestureHandlers::new());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 0.0, 0.0, t));
        assert_eq!(r.long_press_deadline(), None);
        let response = r.handle(sample(Phase::End, 0.0, 0.0, ms(t, 900)));
        assert_eq!(response.gesture, Some(Gesture::Tap));
    }

    #[test]
    fn test_pull_to_refresh_beats_swipe() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 100.0, 20.0, t));
        let moved = r.handle(sample(Phase::Move, 120.0, 180.0, ms(t, 50)));
        assert_eq!(moved.disposition, Disposition::Captured);
        let response = r.handle(sample(Phase::End, 120.0, 180.0, ms(t, 80)));

        assert_eq!(response.gesture, Some(Gesture::PullToRefresh));
        assert_eq!(*log.borrow(), vec!["pull"]);
    }

    #[test]
    fn test_pull_requires_top_of_surface() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();

        // Too far from the top edge
        r.handle(sample(Phase::Start, 100.0, 150.0, t));
        r.handle(sample(Phase::Move, 100.0, 300.0, ms(t, 50)));
        r.handle(sample(Phase::End, 100.0, 300.0, ms(t, 80)));

        // Surface is scrolled
        r.set_scroll_offset(40.0);
        r.handle(sample(Phase::Start, 100.0, 20.0, ms(t, 200)));
        let moved = r.handle(sample(Phase::Move, 100.0, 180.0, ms(t, 250)));
        assert_eq!(moved.disposition, Disposition::Passthrough);
        r.handle(sample(Phase::End, 100.0, 180.0, ms(t, 280)));

        assert_eq!(*log.borrow(), vec!["down", "down"]);
    }

    #[test]
    fn test_pull_with_drift_falls_back_to_swipe() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 100.0, 20.0, t));
        r.handle(sample(Phase::Move, 160.0, 180.0, ms(t, 50)));
        r.handle(sample(Phase::End, 160.0, 180.0, ms(t, 80)));
        assert_eq!(*log.borrow(), vec!["down"]);
    }

    #[test]
    fn test_new_start_abandons_session() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 100.0, 100.0, t));
        r.handle(sample(Phase::Move, 10.0, 100.0, ms(t, 10)));
        r.handle(sample(Phase::Start, 300.0, 300.0, ms(t, 20)));
        assert_eq!(r.session().map(|s| s.moved), Some(false));

        r.handle(sample(Phase::End, 300.0, 300.0, ms(t, 30)));
        assert_eq!(*log.borrow(), vec!["tap"]);
    }

    #[test]
    fn test_cancel_emits_nothing() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 100.0, 100.0, t));
        r.handle(sample(Phase::Move, 10.0, 100.0, ms(t, 10)));
        r.handle(sample(Phase::Cancel, 10.0, 100.0, ms(t, 20)));
        let response = r.handle(sample(Phase::End, 10.0, 100.0, ms(t, 30)));

        assert_eq!(response.gesture, None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_teardown_drops_pending_long_press() {
        let (mut r, log) = recording(GestureConfig::default());
        let t = Instant::now();
        r.handle(sample(Phase::Start, 0.0, 0.0, t));
        r.teardown();
        assert_eq!(r.poll_long_press(ms(t, 1000)), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_disabled_fires_nothing() {
        let config = GestureConfig { disabled: true, ..GestureConfig::default() };
        let (mut r, log) = recording(config);
        let t = Instant::now();

        r.handle(sample(Phase::Start, 0.0, 0.0, t));
        r.handle(sample(Phase::End, 0.0, 0.0, ms(t, 10)));
        r.handle(sample(Phase::Start, 100.0, 100.0, ms(t, 20)));
        r.handle(sample(Phase::Move, 10.0, 100.0, ms(t, 30)));
        r.handle(sample(Phase::End, 10.0, 100.0, ms(t, 40)));
        r.handle(sample(Phase::Start, 0.0, 0.0, ms(t, 50)));
        assert_eq!(r.poll_long_press(ms(t, 2000)), None);

        assert!(log.borrow().is_empty());
        assert!(!r.has_active_session());
    }

    #[test]
    fn test_classify_swipe_law() {
        let config = GestureConfig::default();
        let t = Instant::now();
        for (dx, dy) in [(60.0, 10.0), (-75.0, 40.0), (200.0, -199.0), (-51.0, 0.0)] {
            let mut session = Session::new(&sample(Phase::Start, 500.0, 500.0, t));
            session.update(&sample(Phase::Move, 500.0 + dx, 500.0 + dy, t));
            let expected = if dx < 0.0 { SwipeDirection::Left } else { SwipeDirection::Right };
            match classify(&session, &config) {
                Some(Gesture::Swipe { direction, .. }) => assert_eq!(direction, expected),
                other => panic!("expected horizontal swipe for ({dx}, {dy}), got {other:?}"),
            }
        }
    }
}
