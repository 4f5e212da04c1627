//! Change notifications broadcast to renderers and other listeners.

use crate::stroke::StrokeId;
use kurbo::Rect;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Viewport geometry notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    /// Zoom, scroll, paper size or pagination changed. Listeners redraw.
    Changed,
    /// A scroll ran into the top of the document.
    TopBoundaryReached,
}

/// Stroke set notifications for one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    StrokesAdded { ids: Vec<StrokeId>, dirty: Rect },
    StrokesRemoved { ids: Vec<StrokeId>, dirty: Rect },
    StrokesReplaced { ids: Vec<StrokeId>, dirty: Rect },
    PageInserted { page_number: usize, shifted: usize },
    /// An undo or redo was applied to the page.
    HistoryReplayed,
}

/// Fan-out registry of channel subscribers.
///
/// A subscriber whose receiver was dropped is removed on the next emit.
#[derive(Debug)]
pub struct EventBus<T: Clone> {
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send an event to every live listener.
    pub fn emit(&mut self, event: T) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
