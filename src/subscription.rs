//! Scoped event subscriptions. The search form listens for document level
//! clicks only while it is active; the guard returned by [`Registry::subscribe`]
//! detaches the callback on drop, so releasing the listener on every exit
//! path (including teardown) is enforced by ownership rather than by
//! remembering to call a remove function.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub struct Registry<E> {
    listeners: Rc<RefCell<Listeners<E>>>,
}

struct Listeners<E> {
    next_id: u64,
    entries: Vec<(u64, Rc<RefCell<dyn FnMut(&E)>>)>,
}

impl<E> Registry<E> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Attach `callback` until the returned guard is dropped.
    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> Subscription<E> {
        let callback: Rc<RefCell<dyn FnMut(&E)>> = Rc::new(RefCell::new(callback));
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, callback));
        Subscription {
            listeners: Rc::downgrade(&self.listeners),
            id,
        }
    }

    /// Deliver `event` to every current subscriber.
    ///
    /// Delivery runs over a snapshot, so a callback may subscribe or drop a
    /// guard (even its own) while being called.
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<_> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            (callback.borrow_mut())(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().entries.is_empty()
    }
}

impl<E> Clone for Registry<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Detaches its callback from the registry when dropped. Dropping after the
/// registry itself is gone is fine.
pub struct Subscription<E> {
    listeners: Weak<RefCell<Listeners<E>>>,
    id: u64,
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}
