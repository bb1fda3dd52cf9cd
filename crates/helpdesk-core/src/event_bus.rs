//! Queue of [`ClientEvent`]s from background tasks to the egui frame.
//!
//! `SessionChanged` and `TranscriptChanged` carry no payload; they only
//! tell the UI to re-read a store. While one is already queued a repeat
//! is dropped, so a burst of transcript writes costs one re-read.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use helpdesk_types::event::{ClientEvent, Notification};
use helpdesk_types::route::Route;

#[derive(Default)]
struct Queue {
    events: VecDeque<ClientEvent>,
    session_marked: bool,
    transcript_marked: bool,
}

impl Queue {
    /// Flag for a store-changed marker, or `None` for payload events.
    fn marker(&mut self, event: &ClientEvent) -> Option<&mut bool> {
        match event {
            ClientEvent::SessionChanged => Some(&mut self.session_marked),
            ClientEvent::TranscriptChanged => Some(&mut self.transcript_marked),
            _ => None,
        }
    }
}

/// Clone-cheap handle; clones share the queue.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Queue>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ClientEvent) {
        let mut queue = self.inner.borrow_mut();
        if let Some(marked) = queue.marker(&event) {
            if *marked {
                return;
            }
            *marked = true;
        }
        queue.events.push_back(event);
    }

    pub fn notify(&self, notification: Notification) {
        self.emit(ClientEvent::Notify(notification));
    }

    pub fn navigate(&self, route: Route) {
        self.emit(ClientEvent::Navigate(route));
    }

    /// Everything queued since the last frame, in emission order.
    pub fn drain(&self) -> Vec<ClientEvent> {
        let mut queue = self.inner.borrow_mut();
        queue.session_marked = false;
        queue.transcript_marked = false;
        queue.events.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().events.is_empty()
    }
}
