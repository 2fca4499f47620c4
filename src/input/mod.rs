//! Input handling - pointer samples, gestures, timers
//!
//! This module provides:
//! - One pointer-sample type for touch and mouse input
//! - Gesture recognition (tap, long press, swipes, pull to refresh)
//! - Long-press timers on a calloop event loop

mod gestures;
mod pointer;
mod timer;

pub use gestures::*;
pub use pointer::*;
pub use timer::*;
