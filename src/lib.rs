//! Capy gestures - touch interaction core for the Capy assistant app
//!
//! - Pointer samples unify touch and mouse input
//! - Gesture classifier: tap, long press, four-way swipe, pull to refresh
//! - Long-press timers on a calloop event loop
//! - Bindings for page navigation, pull-to-refresh and swipeable list items
//! - Settings file, interaction history and trace replay

pub mod bindings;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod replay;

pub use error::{Error, Result};
