//! Swipeable list items
//!
//! The item follows the pointer horizontally, clamped to `max_swipe` either
//! way. Dragging past the threshold reveals the actions on that side:
//! delete behind a left swipe, favorite and share behind a right swipe.
//! Releasing past the threshold fires the side's action once, then the item
//! slides back to rest whatever happened.

use std::fmt;

use tracing::{debug, error};

use crate::input::{Callback, Phase, PointerSample, Session};

pub type ItemAction = Box<dyn FnMut() -> anyhow::Result<()>>;

/// Side whose actions are uncovered by the current drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealedSide {
    /// Item dragged left; delete is showing
    Left,
    /// Item dragged right; favorite and share are showing
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemActionKind {
    Delete,
    Favorite,
    Share,
}

#[derive(Debug, Clone)]
pub struct SwipeableConfig {
    /// Largest offset the item can be dragged to, either direction
    pub max_swipe: f64,
    /// Offset past which actions are revealed and fire on release
    pub threshold: f64,
    pub disabled: bool,
}

impl Default for SwipeableConfig {
    fn default() -> Self {
        Self {
            max_swipe: 120.0,
            threshold: 80.0,
            disabled: false,
        }
    }
}

/// Callbacks bound to one item, all optional
#[derive(Default)]
pub struct ItemActions {
    swipe_left: Option<Callback>,
    swipe_right: Option<Callback>,
    delete: Option<ItemAction>,
    favorite: Option<ItemAction>,
    share: Option<ItemAction>,
}

impl ItemActions {
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

    pub fn on_delete(mut self, f: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }

    pub fn on_favorite(mut self, f: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.favorite = Some(Box::new(f));
        self
    }

    pub fn on_share(mut self, f: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.share = Some(Box::new(f));
        self
    }

    /// Action fired by a release on `side`
    fn primary(&self, side: RevealedSide) -> Option<ItemActionKind> {
        match side {
            RevealedSide::Left => self.delete.is_some().then_some(ItemActionKind::Delete),
            RevealedSide::Right => {
                if self.favorite.is_some() {
                    Some(ItemActionKind::Favorite)
                } else if self.share.is_some() {
                    Some(ItemActionKind::Share)
                } else {
                    None
                }
            }
        }
    }

    /// Run a bound action. Failures are logged, never returned.
    fn run(&mut self, kind: ItemActionKind) -> bool {
        let action = match kind {
            ItemActionKind::Delete => &mut self.delete,
            ItemActionKind::Favorite => &mut self.favorite,
            ItemActionKind::Share => &mut self.share,
        };
        let Some(action) = action else {
            return false;
        };
        if let Err(e) = action() {
            error!("{:?} action failed: {:#}", kind, e);
        }
        true
    }
}

impl fmt::Debug for ItemActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemActions")
            .field("swipe_left", &self.swipe_left.is_some())
            .field("swipe_right", &self.swipe_right.is_some())
            .field("delete", &self.delete.is_some())
            .field("favorite", &self.favorite.is_some())
            .field("share", &self.share.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct SwipeableItem {
    pub config: SwipeableConfig,
    actions: ItemActions,
    session: Option<Session>,
    offset: f64,
}

impl SwipeableItem {
    pub fn new(config: SwipeableConfig, actions: ItemActions) -> Self {
        Self {
            config,
            actions,
            session: None,
            offset: 0.0,
        }
    }

    /// Horizontal offset to render the item at
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn revealed(&self) -> Option<RevealedSide> {
        if self.offset < -self.config.threshold {
            Some(RevealedSide::Left)
        } else if self.offset > self.config.threshold {
            Some(RevealedSide::Right)
        } else {
            None
        }
    }

    /// Feed one sample; returns the action fired on release, if any
    pub fn handle(&mut self, sample: PointerSample) -> Option<ItemActionKind> {
        if self.config.disabled {
            return None;
        }

        match sample.phase {
            Phase::Start => {
                self.session = Some(Session::new(&sample));
                self.offset = 0.0;
                None
            }
            Phase::Move => {
                let session = self.session.as_mut()?;
                session.update(&sample);
                // Not f64::clamp, which panics on a negative or NaN bound
                let max = self.config.max_swipe.abs();
                self.offset = session.delta().x.max(-max).min(max);
                None
            }
            Phase::End => {
                let session = self.session.take()?;
                self.offset = 0.0;
                self.release(session.delta().x)
            }
            Phase::Cancel => {
                self.session = None;
                self.offset = 0.0;
                None
            }
        }
    }

    fn release(&mut self, delta_x: f64) -> Option<ItemActionKind> {
        if delta_x.abs() <= self.config.threshold {
            return None;
        }

        let side = if delta_x < 0.0 {
            RevealedSide::Left
        } else {
            RevealedSide::Right
        };
        let notify = match side {
            RevealedSide::Left => &mut self.actions.swipe_left,
            RevealedSide::Right => &mut self.actions.swipe_right,
        };
        if let Some(notify) = notify {
            notify();
        }

        let kind = self.actions.primary(side)?;
        debug!(?kind, "Item swiped past threshold");
        self.actions.run(kind);
        Some(kind)
    }

    /// Tap on a revealed action button. Returns whether an action was bound.
    pub fn trigger(&mut self, kind: ItemActionKind) -> bool {
        if self.config.disabled {
            return false;
        }
        self.actions.run(kind)
    }
}
