//! Scene driver.
//!
//! Wires the store, layout calculator, input display and conversation into one
//! frame loop. Components share a small capability trait with no-op defaults,
//! so a component only implements the hooks it cares about.

use crate::config::ResolvedConfig;
use crate::model::{AppState, MessageRecord, Vec2};
use crate::shaping::TextShaper;
use crate::source::HistoryApi;
use crate::state::{keys, Patch, StateValue, Store};
use crate::view_state::conversation::{Conversation, PlacedMessage};
use crate::view_state::input::InputDisplay;
use crate::view_state::layout::{LayoutCalculator, LayoutMetrics};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Per-frame inputs handed to every component.
pub struct FrameContext<'a> {
    /// Frame time.
    pub now: Instant,
    /// Shaping engine for this frame.
    pub shaper: &'a mut dyn TextShaper,
}

/// A participant in the frame loop.
pub trait SceneComponent {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Called once per frame, in registration order.
    fn update(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Called after the viewport size changed and the layout was recomputed.
    fn on_resize(&mut self, _width: f32, _height: f32) {}
}

impl SceneComponent for LayoutCalculator {
    fn name(&self) -> &'static str {
        "layout"
    }
}

impl SceneComponent for InputDisplay {
    fn name(&self) -> &'static str {
        "input"
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        InputDisplay::update(self, ctx.shaper);
    }
}

impl<H: HistoryApi> SceneComponent for Conversation<H> {
    fn name(&self) -> &'static str {
        "conversation"
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        Conversation::update(self, ctx.now, ctx.shaper);
    }
}

/// Snapshot of the laid-out scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    /// Lifecycle state of the conversation.
    pub state: AppState,
    /// Published metrics, absent while the layout is degenerate.
    pub metrics: Option<LayoutMetrics>,
    /// Shaped input height.
    pub input_height: Option<f32>,
    /// Resolved caret point.
    pub caret: Option<Vec2>,
    /// Next history page.
    pub history_cursor: u64,
    /// Scroll accumulator.
    pub scroll: f32,
    /// Visible messages, newest first.
    pub messages: Vec<PlacedMessage>,
}

/// The whole transcript view over one store.
pub struct Scene {
    store: Store,
    layout: LayoutCalculator,
    input: InputDisplay,
    conversation: Conversation<Box<dyn HistoryApi>>,
    extra: Vec<Box<dyn SceneComponent>>,
    shaper: Box<dyn TextShaper>,
}

impl Scene {
    /// Build a scene for a `width` x `height` viewport.
    pub fn new(
        config: &ResolvedConfig,
        width: f32,
        height: f32,
        history: Box<dyn HistoryApi>,
        shaper: Box<dyn TextShaper>,
    ) -> Self {
        let store = Store::new(config.initial_state(width, height));
        let layout = LayoutCalculator::attach(&store);
        let input = InputDisplay::attach(&store);
        let conversation = Conversation::attach(&store, history, config.conversation.clone());
        info!(width, height, "Scene created");
        Self {
            store,
            layout,
            input,
            conversation,
            extra: Vec::new(),
            shaper,
        }
    }

    /// Shared store handle.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The transcript.
    pub fn conversation(&self) -> &Conversation<Box<dyn HistoryApi>> {
        &self.conversation
    }

    /// The input block.
    pub fn input(&self) -> &InputDisplay {
        &self.input
    }

    /// Register another component; it runs after the built-in ones.
    pub fn add_component(&mut self, component: Box<dyn SceneComponent>) {
        debug!(name = component.name(), "Component added");
        self.extra.push(component);
    }

    /// Run one frame at `now`.
    ///
    /// Input runs before the conversation so the transcript stacks above the
    /// input height published in the same frame.
    pub fn frame(&mut self, now: Instant) {
        let mut ctx = FrameContext {
            now,
            shaper: self.shaper.as_mut(),
        };
        let builtin: [&mut dyn SceneComponent; 3] =
            [&mut self.layout, &mut self.input, &mut self.conversation];
        for component in builtin {
            component.update(&mut ctx);
        }
        for component in &mut self.extra {
            component.update(&mut ctx);
        }
    }

    /// Change the viewport size. The layout is recomputed before any
    /// component's `on_resize` runs.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.layout.resize(width, height);
        let builtin: [&mut dyn SceneComponent; 3] =
            [&mut self.layout, &mut self.input, &mut self.conversation];
        for component in builtin {
            component.on_resize(width, height);
        }
        for component in &mut self.extra {
            component.on_resize(width, height);
        }
    }

    /// Write `appState`.
    pub fn set_state(&self, state: AppState) {
        self.store.set(keys::APP_STATE, state);
    }

    /// Publish live messages under `conversation`.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be converted to a store value.
    pub fn push_live(&self, records: &[MessageRecord]) -> Result<(), serde_json::Error> {
        let items = records
            .iter()
            .map(StateValue::from_serialize)
            .collect::<Result<Vec<_>, _>>()?;
        self.store.set(keys::CONVERSATION, items);
        Ok(())
    }

    /// Replace the input text and caret index in one mutation.
    pub fn set_input(&self, text: &str, cursor: usize) {
        self.store.mutate(
            Patch::new()
                .with(keys::INPUT, text)
                .with(keys::CURSOR_POS, cursor),
        );
    }

    /// Publish a special key press (`ArrowUp`, `ArrowDown`, ...).
    pub fn press_key(&self, key: &str) {
        self.store.set(keys::SPECIAL_KEY_PRESSED, key);
    }

    /// Current layout of the scene.
    pub fn report(&self) -> LayoutReport {
        let metrics = LayoutMetrics::ready_from_store(&self.store);
        LayoutReport {
            state: self.conversation.state(),
            metrics,
            input_height: self.input.height(),
            caret: self.input.caret(),
            history_cursor: self.conversation.history_cursor(),
            scroll: self.conversation.scroll(),
            messages: metrics
                .map(|m| self.conversation.placed(&m))
                .unwrap_or_default(),
        }
    }

    /// Run one frame at `start`, then one per idle interval for `ticks`
    /// intervals, and report.
    pub fn run_headless(&mut self, start: Instant, ticks: u32) -> LayoutReport {
        let interval = self.conversation.settings().idle_interval;
        self.frame(start);
        for tick in 1..=ticks {
            self.frame(start + interval * tick);
        }
        debug!(ticks, "Headless run complete");
        self.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::MonospaceShaper;
    use crate::source::MemoryHistory;
    use crate::test_harness::records;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl SceneComponent for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn update(&mut self, _ctx: &mut FrameContext<'_>) {
            self.log.borrow_mut().push("update".into());
        }

        fn on_resize(&mut self, width: f32, height: f32) {
            self.log.borrow_mut().push(format!("resize {width}x{height}"));
        }
    }

    struct Silent;

    impl SceneComponent for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }
    }

    fn scene(history: MemoryHistory) -> Scene {
        Scene::new(
            &ResolvedConfig::default(),
            800.0,
            600.0,
            Box::new(history),
            Box::new(MonospaceShaper::default()),
        )
    }

    #[test]
    fn default_hooks_do_nothing() {
        let mut scene = scene(MemoryHistory::default());
        scene.add_component(Box::new(Silent));

        scene.frame(Instant::now());
        scene.resize(400.0, 300.0);

        assert_eq!(scene.report().state, AppState::Loading);
    }

    #[test]
    fn extra_components_see_frames_and_resizes() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = scene(MemoryHistory::default());
        scene.add_component(Box::new(Recorder { log: Rc::clone(&log) }));

        scene.frame(Instant::now());
        scene.resize(400.0, 300.0);

        assert_eq!(*log.borrow(), vec!["update", "resize 400x300"]);
    }

    #[test]
    fn resize_recomputes_before_hooks() {
        let mut scene = scene(MemoryHistory::default());

        scene.resize(400.0, 300.0);

        let metrics = scene.report().metrics.expect("layout ready");
        assert!((metrics.content_height - 299.8).abs() < 1e-3);
    }

    #[test]
    fn transcript_stacks_above_input_in_same_frame() {
        let mut scene = scene(MemoryHistory::default());
        scene.push_live(&records(1, 1)).expect("records serialize");

        scene.frame(Instant::now());

        let report = scene.report();
        let metrics = report.metrics.expect("layout ready");
        let input_height = report.input_height.expect("input shaped");
        assert_eq!(input_height, metrics.line_height);
        assert_eq!(report.messages.len(), 1);
        assert!((report.messages[0].y - (metrics.left_bottom.y + input_height)).abs() < 1e-3);
    }

    #[test]
    fn caret_is_published_after_first_frame() {
        let mut scene = scene(MemoryHistory::default());
        scene.set_input("hello", 5);

        scene.frame(Instant::now());

        assert!(scene.report().caret.is_some());
        assert!(scene.store().vec2(keys::CARET_POSITION).is_some());
    }

    #[test]
    fn headless_run_paginates_history() {
        let history = MemoryHistory::new(vec![records(10, 1), records(20, 1), records(30, 1)]);
        let mut scene = scene(history);
        scene.set_state(AppState::Idle);

        let report = scene.run_headless(Instant::now(), 1);

        assert_eq!(report.state, AppState::Idle);
        // Greeting slots start the cursor at page 2, the last one, so it wraps.
        assert_eq!(report.messages.len(), 1);
        assert_eq!(report.messages[0].text, "m30");
        assert_eq!(report.history_cursor, 2);
    }
}
