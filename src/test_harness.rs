//! Test harness for driving the transcript headlessly.
//!
//! Wraps a store, a layout calculator and a conversation with a manual clock
//! so tests can script state changes and ticks frame by frame.

use crate::model::{AppState, HistoryError, MessageId, MessageRecord, SenderType, Trust};
use crate::shaping::MonospaceShaper;
use crate::source::{HistoryApi, HistoryPage, MemoryHistory, PageResolver, PageTicket};
use crate::state::{keys, Patch, Store};
use crate::view_state::conversation::{Conversation, ConversationSettings};
use crate::view_state::layout::{LayoutCalculator, LayoutMetrics};
use chrono::{TimeZone, Utc};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Record with a fixed timestamp.
pub fn record(message: u64, sender: SenderType, text: &str) -> MessageRecord {
    MessageRecord::new(
        MessageId::new(0, message),
        Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0)
            .single()
            .unwrap_or_default()
            + chrono::Duration::seconds(message as i64),
        sender,
        text,
        Trust::NONE,
    )
}

/// `count` short input records numbered from `first`.
pub fn records(first: u64, count: u64) -> Vec<MessageRecord> {
    (first..first + count)
        .map(|n| record(n, SenderType::Input, &format!("m{n}")))
        .collect()
}

/// Layout inputs for a 120 x 100 viewport.
///
/// Content box is 100 x 80 with its lower-left at (-50, -40). Line height 10,
/// spacing 5, font size 10, so a short message is 10 tall and stacks every 15.
pub fn small_layout() -> Patch {
    Patch::new()
        .with(keys::VIEWPORT_WIDTH, 120.0f32)
        .with(keys::VIEWPORT_HEIGHT, 100.0f32)
        .with(keys::PADDING, 10.0f32)
        .with(keys::NUM_LINES, 8.0f32)
        .with(keys::NUM_LINES_SPACING, 0.5f32)
        .with(keys::MESSAGE_WIDTH_RATIO, 0.5f32)
        .with(keys::COUNTERPART_OFFSET_RATIO, 0.25f32)
        .with(keys::CURSOR_WIDTH_RATIO, 0.4f32)
        .with(keys::FONT_LINE_HEIGHT_RATIO, 1.0f32)
        .with(keys::APP_STATE, AppState::Loading)
}

/// History that counts requests and fails the first `failures` of them.
#[derive(Debug, Clone, Default)]
pub struct FlakyHistory {
    inner: MemoryHistory,
    failures: Rc<RefCell<usize>>,
    requests: Rc<RefCell<Vec<u64>>>,
}

impl FlakyHistory {
    /// Serve `pages`, failing the first `failures` requests.
    pub fn new(pages: Vec<Vec<MessageRecord>>, failures: usize) -> Self {
        Self {
            inner: MemoryHistory::new(pages),
            failures: Rc::new(RefCell::new(failures)),
            requests: Rc::default(),
        }
    }

    /// Shared log of requested page ids.
    pub fn requests(&self) -> Rc<RefCell<Vec<u64>>> {
        Rc::clone(&self.requests)
    }
}

impl HistoryApi for FlakyHistory {
    fn request(&mut self, id: u64) -> PageTicket {
        self.requests.borrow_mut().push(id);
        let mut failures = self.failures.borrow_mut();
        if *failures > 0 {
            *failures -= 1;
            return PageTicket::ready(id, Err(HistoryError::Unavailable("offline".into())));
        }
        self.inner.request(id)
    }
}

/// History whose responses are delivered by the test.
#[derive(Debug, Clone, Default)]
pub struct DeferredHistory {
    outstanding: Rc<RefCell<Vec<(u64, PageResolver)>>>,
}

impl DeferredHistory {
    /// Number of unanswered requests.
    pub fn outstanding(&self) -> usize {
        self.outstanding.borrow().len()
    }

    /// Answer the oldest request with `page`. Returns the page id answered.
    pub fn answer(&self, page: HistoryPage) -> Option<u64> {
        let mut outstanding = self.outstanding.borrow_mut();
        if outstanding.is_empty() {
            return None;
        }
        let (id, resolver) = outstanding.remove(0);
        resolver.resolve(Ok(page));
        Some(id)
    }
}

impl HistoryApi for DeferredHistory {
    fn request(&mut self, id: u64) -> PageTicket {
        let (resolver, ticket) = PageTicket::channel(id);
        self.outstanding.borrow_mut().push((id, resolver));
        ticket
    }
}

/// Store, layout and conversation on a manual clock.
pub struct ConversationHarness<H> {
    /// Shared store.
    pub store: Store,
    /// Keeps the layout outputs current.
    pub layout: LayoutCalculator,
    /// Component under test.
    pub conversation: Conversation<H>,
    /// Shaper used for every frame.
    pub shaper: MonospaceShaper,
    /// Current frame time.
    pub now: Instant,
}

impl<H: HistoryApi> ConversationHarness<H> {
    /// Harness over [`small_layout`].
    pub fn new(history: H, settings: ConversationSettings) -> Self {
        let store = Store::new(small_layout());
        let layout = LayoutCalculator::attach(&store);
        let conversation = Conversation::attach(&store, history, settings);
        Self {
            store,
            layout,
            conversation,
            shaper: MonospaceShaper::default(),
            now: Instant::now(),
        }
    }

    /// Published metrics.
    pub fn metrics(&self) -> LayoutMetrics {
        LayoutMetrics::ready_from_store(&self.store).unwrap_or_else(|| {
            panic!("layout not ready");
        })
    }

    /// Run one frame at the current time.
    pub fn frame(&mut self) {
        self.conversation.update(self.now, &mut self.shaper);
    }

    /// Advance the clock by `by` and run one frame.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        self.frame();
    }

    /// Write `appState` and run one frame.
    pub fn enter(&mut self, state: AppState) {
        self.store.set(keys::APP_STATE, state);
        self.frame();
    }

    /// Run one idle tick directly, bypassing the timer.
    pub fn tick(&mut self) {
        let metrics = self.metrics();
        self.conversation.idle_tick(&metrics, &mut self.shaper);
    }

    /// Publish live records through the store and run one frame.
    pub fn push_live(&mut self, records: &[MessageRecord]) {
        let items = records
            .iter()
            .map(|r| crate::state::StateValue::from_serialize(r))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|e| panic!("record serializes: {e}"));
        self.store.set(keys::CONVERSATION, items);
        self.frame();
    }

    /// Lower-left y of every visible message, newest first.
    pub fn ys(&self) -> Vec<f32> {
        self.conversation
            .visible()
            .iter()
            .map(|m| m.position().y)
            .collect()
    }

    /// Message number of every visible message, newest first.
    pub fn ids(&self) -> Vec<u64> {
        self.conversation
            .visible()
            .iter()
            .map(|m| m.id().message())
            .collect()
    }
}
