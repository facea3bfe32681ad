//! Virtualized, paginated conversation.
//!
//! The conversation keeps only the messages near the content box in memory.
//! Index 0 of the visible list is the newest message, drawn directly above the
//! input; higher indices stack upward toward older history.
//!
//! # Lifecycle
//!
//! The conversation reacts to `appState`:
//! - `interaction`: pagination stops and the screen is cleared so only the live
//!   exchange is shown.
//! - `idle`: a periodic timer scrolls old history past the screen. Each tick
//!   culls what has left the bottom, fetches the next page, admits shaped
//!   messages at the top, scrolls one line and wraps the page cursor when the
//!   history is exhausted.
//! - `error`: pagination stops, the screen stays as it is.
//! - `exit`: pagination stops and everything is released.
//!
//! Store callbacks only record events; [`Conversation::update`] applies them
//! before it looks at the timer, so a state change in one frame is always seen
//! before a tick that fell due in the same frame.

use crate::model::{AppState, MessageRecord};
use crate::shaping::TextShaper;
use crate::source::{HistoryApi, PagePoll, PageTicket};
use crate::state::{keys, Store, SubscriptionId};
use crate::view_state::input::DEFAULT_FONT;
use crate::view_state::layout::LayoutMetrics;
use crate::view_state::message::Message;
use crate::view_state::timer::PaginationTimer;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Pagination and placement policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    /// Maximum number of history messages waiting to enter the screen.
    pub buffer_cap: usize,
    /// Time between idle ticks.
    pub idle_interval: Duration,
    /// Pages skipped past the visible messages when idle starts.
    pub greeting_slots: u64,
    /// Clear the screen when the page cursor wraps around.
    pub clear_on_wrap: bool,
    /// Lowest page id the history serves; the cursor falls back to it when
    /// the idle start page lies past the end of history.
    pub first_page: u64,
    /// Shift responses left by their trust score.
    pub trust_weighted: bool,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            buffer_cap: 8,
            idle_interval: Duration::from_millis(2000),
            greeting_slots: 2,
            clear_on_wrap: false,
            first_page: 1,
            trust_weighted: false,
        }
    }
}

/// Something a store callback observed, applied on the next update.
#[derive(Debug, Clone, PartialEq)]
enum Event {
    State(AppState),
    Live(Vec<MessageRecord>),
}

type Inbox = Rc<RefCell<VecDeque<Event>>>;

/// Geometry of one placed message, for reports and renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedMessage {
    /// `convo:message` identity.
    pub id: String,
    /// `input` or `response`.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// Lower-left x.
    pub x: f32,
    /// Lower-left y.
    pub y: f32,
    /// Maximum line width.
    pub width: f32,
    /// Shaped height.
    pub height: f32,
    /// Inside the content box.
    pub visible: bool,
}

/// The virtualized transcript.
#[derive(Debug)]
pub struct Conversation<H> {
    store: Store,
    history: H,
    settings: ConversationSettings,
    inbox: Inbox,
    subscriptions: Vec<(&'static str, SubscriptionId)>,
    state: AppState,
    visible: Vec<Message>,
    live_pending: VecDeque<Message>,
    history_pending: VecDeque<Message>,
    history_cursor: u64,
    wrap_start: u64,
    history_total: Option<u64>,
    fetch: Option<PageTicket>,
    timer: PaginationTimer,
    scroll: f32,
}

impl<H: HistoryApi> Conversation<H> {
    /// Subscribe to `appState` and `conversation`.
    ///
    /// The current `appState` in the store is adopted without running its
    /// entry actions.
    pub fn attach(store: &Store, history: H, settings: ConversationSettings) -> Self {
        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));

        let sink = Rc::clone(&inbox);
        let state_id = store.subscribe(keys::APP_STATE, move |value| {
            match value.as_text().map(str::parse::<AppState>) {
                Some(Ok(state)) => sink.borrow_mut().push_back(Event::State(state)),
                Some(Err(e)) => warn!(error = %e, "Ignoring app state"),
                None => warn!(?value, "appState is not text"),
            }
        });

        let sink = Rc::clone(&inbox);
        let live_id = store.subscribe(keys::CONVERSATION, move |value| {
            let items = value.as_list().unwrap_or_default();
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                match item.deserialize_into::<MessageRecord>() {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(error = %e, "Dropping malformed live message"),
                }
            }
            if !records.is_empty() {
                sink.borrow_mut().push_back(Event::Live(records));
            }
        });

        let state = store
            .text(keys::APP_STATE)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self {
            store: store.clone(),
            history,
            settings,
            inbox,
            subscriptions: vec![(keys::APP_STATE, state_id), (keys::CONVERSATION, live_id)],
            state,
            visible: Vec::new(),
            live_pending: VecDeque::new(),
            history_pending: VecDeque::new(),
            history_cursor: 0,
            wrap_start: 0,
            history_total: None,
            fetch: None,
            timer: PaginationTimer::default(),
            scroll: 0.0,
        }
    }

    // === Accessors ===

    /// Current lifecycle state as last applied.
    pub fn state(&self) -> AppState {
        self.state
    }

    /// On-screen messages, newest first.
    pub fn visible(&self) -> &[Message] {
        &self.visible
    }

    /// Number of messages waiting for height or room.
    pub fn pending_len(&self) -> usize {
        self.live_pending.len() + self.history_pending.len()
    }

    /// Next history page to request.
    pub fn history_cursor(&self) -> u64 {
        self.history_cursor
    }

    /// Page the cursor returns to when history is exhausted.
    pub fn wrap_start(&self) -> u64 {
        self.wrap_start
    }

    /// Total pages reported by the last history response.
    pub fn history_total(&self) -> Option<u64> {
        self.history_total
    }

    /// True while a page request is outstanding.
    pub fn fetch_in_flight(&self) -> bool {
        self.fetch.is_some()
    }

    /// Scroll accumulator; negative values move content down.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// True while the pagination timer runs.
    pub fn is_paginating(&self) -> bool {
        self.timer.is_running()
    }

    /// Settings in effect.
    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    /// Geometry of every visible message whose height is known.
    pub fn placed(&self, metrics: &LayoutMetrics) -> Vec<PlacedMessage> {
        self.visible
            .iter()
            .filter_map(|m| {
                let rect = m.bounds(metrics)?;
                Some(PlacedMessage {
                    id: m.id().to_string(),
                    sender: m.sender().to_string(),
                    text: m.record().text.clone(),
                    x: rect.origin.x,
                    y: rect.origin.y,
                    width: rect.width,
                    height: rect.height,
                    visible: m.is_visible(),
                })
            })
            .collect()
    }

    // === Input ===

    /// Append live messages (chronological order) at the newest end.
    ///
    /// Empty messages are dropped. Messages enter the screen once shaped.
    pub fn push_records(&mut self, records: Vec<MessageRecord>) {
        for record in records {
            if record.is_empty() {
                debug!(id = %record.id(), "Dropping empty live message");
                continue;
            }
            self.live_pending.push_back(Message::new(record));
        }
    }

    /// Apply a lifecycle state directly, as if it had been written to the
    /// store.
    pub fn set_state(&mut self, state: AppState, now: Instant) {
        if state == self.state {
            return;
        }
        info!(from = %self.state, to = %state, "Conversation state change");
        self.state = state;
        match state {
            AppState::Interaction => {
                self.timer.cancel();
                self.clear();
                self.scroll = 0.0;
            }
            AppState::Idle => {
                self.history_cursor = self.visible.len() as u64 + self.settings.greeting_slots;
                self.wrap_start = self.history_cursor;
                self.timer.start(now, self.settings.idle_interval);
                debug!(cursor = self.history_cursor, "Idle pagination started");
            }
            AppState::Error => self.timer.cancel(),
            AppState::Exit => {
                self.timer.cancel();
                self.clear();
            }
            AppState::Loading => {}
        }
    }

    /// Release every message and forget the in-flight fetch.
    pub fn clear(&mut self) {
        trace!(
            visible = self.visible.len(),
            pending = self.pending_len(),
            "Clearing conversation"
        );
        self.visible.clear();
        self.live_pending.clear();
        self.history_pending.clear();
        self.fetch = None;
    }

    // === Frame ===

    /// Per-frame update.
    ///
    /// Applies queued store events, shapes and admits messages, runs the idle
    /// tick if one fell due by `now`, then positions every message. Skips the
    /// geometry work while the layout is not ready.
    pub fn update(&mut self, now: Instant, shaper: &mut dyn TextShaper) {
        let events: Vec<Event> = self.inbox.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                Event::State(state) => self.set_state(state, now),
                Event::Live(records) => self.push_records(records),
            }
        }

        let Some(metrics) = LayoutMetrics::ready_from_store(&self.store) else {
            return;
        };

        self.poll_fetch();
        self.shape_all(shaper, &metrics);
        self.position(&metrics);
        self.admit_live();
        self.admit_history(&metrics);

        if self.timer.poll(now) {
            self.idle_tick(&metrics, shaper);
        }

        self.position(&metrics);
    }

    /// One pagination step. Only runs while idle.
    pub fn idle_tick(&mut self, metrics: &LayoutMetrics, shaper: &mut dyn TextShaper) {
        if self.state != AppState::Idle {
            return;
        }
        trace!(
            cursor = self.history_cursor,
            scroll = self.scroll,
            "Idle tick"
        );

        self.position(metrics);
        self.cull(metrics);

        if self.history_pending.len() < self.settings.buffer_cap && self.fetch.is_none() {
            debug!(page = self.history_cursor, "Requesting history page");
            self.fetch = Some(self.history.request(self.history_cursor));
            self.poll_fetch();
            self.shape_all(shaper, metrics);
        }

        self.position(metrics);
        self.admit_history(metrics);

        self.scroll -= metrics.line_height;

        if let Some(total) = self.history_total {
            if self.history_cursor >= total {
                self.history_cursor = if self.wrap_start < total {
                    self.wrap_start
                } else {
                    self.settings.first_page
                };
                debug!(cursor = self.history_cursor, "History wrapped");
                if self.settings.clear_on_wrap {
                    self.visible.clear();
                    self.scroll = 0.0;
                }
            }
        }
    }

    fn poll_fetch(&mut self) {
        let Some(ticket) = self.fetch.as_mut() else {
            return;
        };
        let result = match ticket.poll() {
            PagePoll::Pending => return,
            PagePoll::Ready(result) => result,
        };
        self.fetch = None;
        match result {
            Ok(page) => {
                self.history_total = Some(page.total_length);
                self.history_cursor += 1;
                if page.messages.is_empty() {
                    debug!(cursor = self.history_cursor, "Empty history page");
                }
                // Newest of the page first so the oldest ends up on top.
                for record in page.messages.into_iter().rev() {
                    if record.is_empty() {
                        debug!(id = %record.id(), "Dropping empty history message");
                        continue;
                    }
                    self.history_pending.push_back(Message::new(record));
                }
            }
            Err(e) => warn!(
                error = %e,
                page = self.history_cursor,
                "History fetch failed, retrying next tick"
            ),
        }
    }

    fn shape_all(&mut self, shaper: &mut dyn TextShaper, metrics: &LayoutMetrics) {
        let font = self
            .store
            .text(keys::FONT)
            .unwrap_or_else(|| DEFAULT_FONT.to_string());
        let trust_weighted = self.trust_weighted();
        let messages = self
            .visible
            .iter_mut()
            .chain(self.live_pending.iter_mut())
            .chain(self.history_pending.iter_mut());
        for message in messages {
            if message.needs_shape(metrics) {
                message.request_shape(shaper, metrics, &font);
            }
            message.poll_shape(metrics.line_height);
            message.set_horizontal_position(metrics, trust_weighted);
        }
    }

    fn trust_weighted(&self) -> bool {
        self.store
            .flag(keys::TRUST_WEIGHTED)
            .unwrap_or(self.settings.trust_weighted)
    }

    /// Move shaped live messages to the newest end, in arrival order.
    fn admit_live(&mut self) {
        while self
            .live_pending
            .front()
            .is_some_and(|m| m.height().is_some())
        {
            if let Some(message) = self.live_pending.pop_front() {
                trace!(id = %message.id(), "Live message admitted");
                self.visible.insert(0, message);
            }
        }
    }

    /// Move shaped history to the oldest end while the top of the stack is
    /// inside the content box.
    fn admit_history(&mut self, metrics: &LayoutMetrics) {
        let content_top = metrics.left_bottom.y + metrics.content_height;
        while self
            .history_pending
            .front()
            .is_some_and(|m| m.height().is_some())
        {
            if self.stack_top(metrics) > content_top {
                break;
            }
            if let Some(message) = self.history_pending.pop_front() {
                trace!(id = %message.id(), "History message admitted");
                self.visible.push(message);
            }
        }
    }

    fn base_y(&self, metrics: &LayoutMetrics) -> f32 {
        let input_height = self.store.f32(keys::INPUT_HEIGHT).unwrap_or(0.0);
        metrics.left_bottom.y + input_height + self.scroll
    }

    /// Bottom edge of the next slot above the oldest visible message.
    fn stack_top(&self, metrics: &LayoutMetrics) -> f32 {
        self.base_y(metrics)
            + self
                .visible
                .iter()
                .map(|m| m.height().unwrap_or(0.0) + metrics.spacing)
                .sum::<f32>()
    }

    /// Stack visible messages upward from the input and refresh visibility.
    pub fn position(&mut self, metrics: &LayoutMetrics) {
        let mut y = self.base_y(metrics);
        for message in &mut self.visible {
            message.set_vertical_position(y);
            message.update_visibility(metrics);
            y += message.height().unwrap_or(0.0) + metrics.spacing;
        }
    }

    /// Drop messages that scrolled below the content box. Removing from the
    /// newest end shifts the scroll accumulator so the rest stay in place.
    fn cull(&mut self, metrics: &LayoutMetrics) {
        let bottom = metrics.left_bottom.y;
        while let Some(newest) = self.visible.first() {
            let Some(height) = newest.height() else {
                break;
            };
            if newest.position().y + height >= bottom {
                break;
            }
            trace!(id = %newest.id(), "Culling message");
            self.visible.remove(0);
            self.scroll += height + metrics.spacing;
        }
    }

    /// Stop listening to the store.
    pub fn detach(self) {
        for (key, id) in self.subscriptions {
            if let Err(e) = self.store.unsubscribe(key, id) {
                debug!(error = %e, "Conversation subscription already removed");
            }
        }
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
