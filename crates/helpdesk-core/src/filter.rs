//! Ticket Filter Store.
//!
//! A single predicate value, replaced wholesale. There is no
//! patch operation: a key absent from the new value is gone.

use std::cell::RefCell;
use std::rc::Rc;

use helpdesk_types::filter::TicketFilter;

#[derive(Clone)]
pub struct FilterStore {
    inner: Rc<RefCell<TicketFilter>>,
}

impl FilterStore {
    /// Starts with open tickets only.
    pub fn new() -> Self {
        Self::with_initial(TicketFilter::open_only())
    }

    pub fn with_initial(filter: TicketFilter) -> Self {
        Self {
            inner: Rc::new(RefCell::new(filter)),
        }
    }

    pub fn get(&self) -> TicketFilter {
        self.inner.borrow().clone()
    }

    /// Replace the predicate. Returns whether it changed.
    pub fn replace(&self, filter: TicketFilter) -> bool {
        let mut current = self.inner.borrow_mut();
        if *current == filter {
            return false;
        }
        log::debug!("Ticket filter replaced: {:?}", filter);
        *current = filter;
        true
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}
