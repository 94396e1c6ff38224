//! Fire-and-forget click reporting.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::click_event::ClickEvent;

/// Hands click events to the background worker without waiting.
///
/// When the queue is full the click is dropped; tracking never slows down
/// or fails a redirect.
#[derive(Clone)]
pub struct ClickTracker {
    tx: mpsc::Sender<ClickEvent>,
}

impl ClickTracker {
    pub fn new(tx: mpsc::Sender<ClickEvent>) -> Self {
        Self { tx }
    }

    pub fn track(&self, code: &str) {
        match self.tx.try_send(ClickEvent::new(code)) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                tracing::warn!(code = %event.code, "Click queue full, dropping click");
            }
            Err(TrySendError::Closed(event)) => {
                tracing::debug!(code = %event.code, "Click queue closed, dropping click");
            }
        }
    }

    /// Free slots left in the queue.
    pub fn available_capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
