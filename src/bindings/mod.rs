//! Gesture bindings for the app's surfaces
//!
//! - Page container: swipe left/right between pages
//! - Refresh container: pull down at the top to refresh
//! - List items: swipe to reveal and fire delete/favorite/share

pub mod pages;
pub mod pull_to_refresh;
pub mod swipeable;

pub use pages::{page_gesture_config, page_recognizer, Page, PageNavigator};
pub use pull_to_refresh::{PullToRefresh, PullToRefreshConfig, RefreshFuture};
pub use swipeable::{ItemActionKind, ItemActions, RevealedSide, SwipeableConfig, SwipeableItem};
