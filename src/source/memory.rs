//! In-memory history.

use super::{HistoryApi, HistoryPage, PageTicket};
use crate::model::MessageRecord;
use tracing::trace;

/// History held in memory, one `Vec` per page. Requests resolve immediately;
/// a page id past the end resolves to an empty page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryHistory {
    pages: Vec<Vec<MessageRecord>>,
}

impl MemoryHistory {
    /// History with the given pages.
    pub fn new(pages: Vec<Vec<MessageRecord>>) -> Self {
        Self { pages }
    }

    /// Append a page.
    pub fn push_page(&mut self, page: Vec<MessageRecord>) {
        self.pages.push(page);
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True if there are no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page `id`, or an empty page when out of range.
    pub fn page(&self, id: u64) -> HistoryPage {
        let messages = usize::try_from(id)
            .ok()
            .and_then(|i| self.pages.get(i))
            .cloned()
            .unwrap_or_default();
        HistoryPage {
            messages,
            total_length: self.pages.len() as u64,
        }
    }
}

impl HistoryApi for MemoryHistory {
    fn request(&mut self, id: u64) -> PageTicket {
        let page = self.page(id);
        trace!(id, messages = page.messages.len(), "Serving history page");
        PageTicket::ready(id, Ok(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageId, SenderType, Trust};
    use crate::source::PagePoll;
    use chrono::Utc;

    fn record(n: u64) -> MessageRecord {
        MessageRecord::new(
            MessageId::new(0, n),
            Utc::now(),
            SenderType::Input,
            format!("m{n}"),
            Trust::NONE,
        )
    }

    #[test]
    fn serves_pages_with_total_length() {
        let mut history = MemoryHistory::new(vec![vec![record(1)], vec![record(2), record(3)]]);

        let PagePoll::Ready(Ok(page)) = history.request(1).poll() else {
            panic!("memory history resolves immediately");
        };

        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.total_length, 2);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let history = MemoryHistory::new(vec![vec![record(1)]]);
        let page = history.page(5);
        assert!(page.messages.is_empty());
        assert_eq!(page.total_length, 1);
    }
}
