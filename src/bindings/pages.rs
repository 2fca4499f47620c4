//! Swipe navigation between the app's top-level pages

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::input::{GestureConfig, GestureHandlers, GestureRecognizer};

/// Swipe distance for page changes; longer than the classifier default so
/// horizontal scrolling inside a page does not flip pages
pub const PAGE_SWIPE_THRESHOLD: f64 = 100.0;

/// Top-level pages, in swipe order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Tools,
    Explore,
    Profile,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::Tools, Page::Explore, Page::Profile];

    pub fn index(self) -> usize {
        match self {
            Page::Home => 0,
            Page::Tools => 1,
            Page::Explore => 2,
            Page::Profile => 3,
        }
    }

    pub fn next(self) -> Option<Page> {
        Page::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Page> {
        self.index().checked_sub(1).map(|i| Page::ALL[i])
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Page::Home => "home",
            Page::Tools => "tools",
            Page::Explore => "explore",
            Page::Profile => "profile",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct PageNavigator {
    current: Page,
}

impl PageNavigator {
    pub fn new(start: Page) -> Self {
        Self { current: start }
    }

    pub fn current(&self) -> Page {
        self.current
    }

    /// Move to the next page; stays put on the last one
    pub fn advance(&mut self) -> bool {
        self.go(self.current.next())
    }

    /// Move to the previous page; stays put on the first one
    pub fn retreat(&mut self) -> bool {
        self.go(self.current.previous())
    }

    fn go(&mut self, target: Option<Page>) -> bool {
        match target {
            Some(page) => {
                info!(from = %self.current, to = %page, "Page changed");
                self.current = page;
                true
            }
            None => false,
        }
    }
}

/// Classifier defaults with the page swipe threshold
pub fn page_gesture_config() -> GestureConfig {
    GestureConfig {
        swipe_threshold: PAGE_SWIPE_THRESHOLD,
        ..GestureConfig::default()
    }
}

/// Recognizer for the main page container: swipe left shows the next
/// page, swipe right the previous one
pub fn page_recognizer(config: GestureConfig, navigator: Rc<RefCell<PageNavigator>>) -> GestureRecognizer {
    let forward = navigator.clone();
    let back = navigator;
    let handlers = GestureHandlers::new()
        .on_swipe_left(move || {
            forward.borrow_mut().advance();
        })
        .on_swipe_right(move || {
            back.borrow_mut().retreat();
        });
    GestureRecognizer::new(config, handlers)
}
