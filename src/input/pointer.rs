//! Pointer samples - one stream for touch and mouse input
//!
//! Hosts translate their raw events (touch start/move/end, mouse
//! down/move/up) into [`PointerSample`]s. Every recognizer and binding in
//! this crate consumes samples only, so desktop mouse testing runs exactly
//! the same logic as touch on a phone.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Position in surface coordinates (CSS pixels for a web view)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Point {
    /// Vector from `origin` to `self`
    pub fn delta_from(&self, origin: Point) -> Point {
        Point::from((self.x - origin.x, self.y - origin.y))
    }
}

/// Phase of a pointer contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Move,
    End,
    /// Pointer left the surface or the platform aborted the contact
    Cancel,
}

/// Where a sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    #[default]
    Touch,
    Mouse,
}

/// A single pointer sample
#[derive(Debug, Clone, Copy)]
pub struct PointerSample {
    pub phase: Phase,
    pub position: Point,
    pub time: Instant,
    pub source: InputSource,
}

impl PointerSample {
    pub fn new(phase: Phase, position: Point, time: Instant) -> Self {
        Self {
            phase,
            position,
            time,
            source: InputSource::Touch,
        }
    }

    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = source;
        self
    }
}

/// Raw touch event from the host (first touch only)
#[derive(Debug, Clone)]
pub enum TouchEvent {
    Down { position: Point },
    Motion { position: Point },
    /// Touch lifted. Browsers report no position on touchend, so the last
    /// known one is reused.
    Up,
    Cancel,
}

/// Raw mouse event from the host (primary button only)
#[derive(Debug, Clone)]
pub enum MouseEvent {
    Down { position: Point },
    Motion { position: Point },
    Up { position: Point },
    /// Cursor left the surface
    Leave,
}

/// Converts host touch/mouse events into samples.
///
/// Tracks the last position so end/cancel samples carry one even when the
/// host event does not. Mouse motion without a pressed button is dropped.
#[derive(Debug, Default)]
pub struct SampleTranslator {
    last_position: Point,
    mouse_pressed: bool,
}

impl SampleTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self, event: &TouchEvent, time: Instant) -> PointerSample {
        let (phase, position) = match *event {
            TouchEvent::Down { position } => (Phase::Start, position),
            TouchEvent::Motion { position } => (Phase::Move, position),
            TouchEvent::Up => (Phase::End, self.last_position),
            TouchEvent::Cancel => (Phase::Cancel, self.last_position),
        };
        self.last_position = position;
        PointerSample::new(phase, position, time).with_source(InputSource::Touch)
    }

    pub fn mouse(&mut self, event: &MouseEvent, time: Instant) -> Option<PointerSample> {
        let (phase, position) = match *event {
            MouseEvent::Down { position } => {
                self.mouse_pressed = true;
                (Phase::Start, position)
            }
            MouseEvent::Motion { position } if self.mouse_pressed => (Phase::Move, position),
            MouseEvent::Motion { .. } => return None,
            MouseEvent::Up { position } if self.mouse_pressed => {
                self.mouse_pressed = false;
                (Phase::End, position)
            }
            MouseEvent::Up { .. } => return None,
            MouseEvent::Leave if self.mouse_pressed => {
                self.mouse_pressed = false;
                (Phase::Cancel, self.last_position)
            }
            MouseEvent::Leave => return None,
        };
        self.last_position = position;
        Some(PointerSample::new(phase, position, time).with_source(InputSource::Mouse))
    }
}
