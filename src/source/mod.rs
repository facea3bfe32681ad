//! History sources.
//!
//! The conversation streams old messages from a paginated history API. A page
//! request returns a [`PageTicket`] immediately; the ticket resolves exactly
//! once with the page or an error. Two sources are provided:
//! - [`MemoryHistory`]: pages held in memory, resolved immediately
//! - [`FileHistory`]: a JSONL file, one page per line

use crate::model::{HistoryError, MessageRecord};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, TryRecvError};

pub mod file;
pub mod memory;

pub use file::FileHistory;
pub use memory::MemoryHistory;

/// One page of history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    /// Messages on this page, oldest first. May be empty.
    pub messages: Vec<MessageRecord>,
    /// Total number of pages the backend currently holds.
    pub total_length: u64,
}

/// Outcome of polling a [`PageTicket`].
#[derive(Debug, Clone, PartialEq)]
pub enum PagePoll {
    /// No response yet.
    Pending,
    /// The request completed.
    Ready(Result<HistoryPage, HistoryError>),
}

/// Producer side of a [`PageTicket`].
#[derive(Debug)]
pub struct PageResolver {
    tx: mpsc::Sender<Result<HistoryPage, HistoryError>>,
}

impl PageResolver {
    /// Deliver the response. Returns `false` if the ticket was dropped.
    pub fn resolve(self, result: Result<HistoryPage, HistoryError>) -> bool {
        self.tx.send(result).is_ok()
    }
}

/// Handle to one in-flight page request.
#[derive(Debug)]
pub struct PageTicket {
    id: u64,
    rx: Receiver<Result<HistoryPage, HistoryError>>,
    resolved: bool,
}

impl PageTicket {
    /// A ticket for page `id` and the resolver that completes it.
    pub fn channel(id: u64) -> (PageResolver, PageTicket) {
        let (tx, rx) = mpsc::channel();
        (
            PageResolver { tx },
            PageTicket {
                id,
                rx,
                resolved: false,
            },
        )
    }

    /// A ticket that is already resolved.
    pub fn ready(id: u64, result: Result<HistoryPage, HistoryError>) -> Self {
        let (resolver, ticket) = Self::channel(id);
        resolver.resolve(result);
        ticket
    }

    /// Page id this ticket was issued for.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Check for a response without blocking.
    ///
    /// A resolver dropped without answering resolves the ticket with
    /// [`HistoryError::Dropped`]. After resolving once, the ticket stays
    /// pending forever.
    pub fn poll(&mut self) -> PagePoll {
        if self.resolved {
            return PagePoll::Pending;
        }
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return PagePoll::Pending,
            Err(TryRecvError::Disconnected) => Err(HistoryError::Dropped { id: self.id }),
        };
        self.resolved = true;
        PagePoll::Ready(result)
    }
}

/// A paginated history backend.
pub trait HistoryApi {
    /// Request page `id`. Must not block on the response.
    fn request(&mut self, id: u64) -> PageTicket;
}

impl<H: HistoryApi + ?Sized> HistoryApi for Box<H> {
    fn request(&mut self, id: u64) -> PageTicket {
        (**self).request(id)
    }
}
