//! Deferred shaper.
//!
//! Wraps another shaper and withholds every result until the owner releases
//! it, so callers can observe messages while their shaping is still pending.

use super::{ShapeRequest, ShapeResolver, ShapeTicket, ShapedText, TextShaper};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Held = Rc<RefCell<VecDeque<(ShapeResolver, ShapedText)>>>;

/// Shaper whose tickets stay pending until released.
///
/// Clones share the same queue, so a test can hand one clone to the component
/// under test and keep another to release results.
#[derive(Debug, Clone)]
pub struct QueuedShaper<S> {
    inner: Rc<RefCell<S>>,
    held: Held,
}

impl<S: TextShaper> QueuedShaper<S> {
    /// Defer results produced by `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
            held: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Number of requests still pending.
    pub fn pending(&self) -> usize {
        self.held.borrow().len()
    }

    /// Resolve the oldest pending request. Returns false if none was pending.
    pub fn release_next(&self) -> bool {
        let next = self.held.borrow_mut().pop_front();
        match next {
            Some((resolver, shaped)) => {
                resolver.resolve(shaped);
                true
            }
            None => false,
        }
    }

    /// Resolve every pending request in order. Returns how many were released.
    pub fn release_all(&self) -> usize {
        let mut released = 0;
        while self.release_next() {
            released += 1;
        }
        released
    }

    /// Drop every pending request without resolving it.
    pub fn drop_all(&self) {
        self.held.borrow_mut().clear();
    }
}

impl<S: TextShaper> TextShaper for QueuedShaper<S> {
    fn shape(&mut self, request: ShapeRequest) -> ShapeTicket {
        let mut immediate = self.inner.borrow_mut().shape(request);
        let (resolver, ticket) = ShapeTicket::channel();
        match immediate.poll() {
            super::ShapePoll::Ready(shaped) => {
                self.held.borrow_mut().push_back((resolver, shaped));
                ticket
            }
            // The inner engine is itself asynchronous; hand its ticket through.
            _ => immediate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::{MonospaceShaper, ShapePoll, WrapPolicy};

    fn request(text: &str) -> ShapeRequest {
        ShapeRequest {
            text: text.to_string(),
            font: "mono".to_string(),
            font_size: 10.0,
            line_height: 10.0,
            max_width: 100.0,
            wrap: WrapPolicy::BreakWord,
        }
    }

    #[test]
    fn results_wait_for_release() {
        let mut shaper = QueuedShaper::new(MonospaceShaper::default());
        let mut first = shaper.shape(request("a"));
        let mut second = shaper.shape(request("bb"));

        assert_eq!(first.poll(), ShapePoll::Pending);
        assert_eq!(shaper.pending(), 2);

        assert!(shaper.release_next());
        assert!(matches!(first.poll(), ShapePoll::Ready(_)));
        assert_eq!(second.poll(), ShapePoll::Pending);

        assert_eq!(shaper.release_all(), 1);
        assert!(matches!(second.poll(), ShapePoll::Ready(_)));
    }

    #[test]
    fn dropped_requests_are_lost() {
        let mut shaper = QueuedShaper::new(MonospaceShaper::default());
        let mut ticket = shaper.shape(request("a"));

        shaper.drop_all();

        assert_eq!(ticket.poll(), ShapePoll::Lost);
    }

    #[test]
    fn clones_share_the_queue() {
        let shaper = QueuedShaper::new(MonospaceShaper::default());
        let mut handle = shaper.clone();
        let mut ticket = handle.shape(request("a"));

        shaper.release_all();

        assert!(matches!(ticket.poll(), ShapePoll::Ready(_)));
    }
}
