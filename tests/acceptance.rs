//! Acceptance tests through the public API.
//!
//! Each test follows one behavior a host application relies on, from the
//! store up to the placed geometry.

use std::cell::RefCell;
use std::env;
use std::fs;
use std::rc::Rc;
use std::time::{Duration, Instant};
use transcript_layout::config::ResolvedConfig;
use transcript_layout::integration::Scene;
use transcript_layout::model::{AppState, MessageRecord, StoreError};
use transcript_layout::shaping::MonospaceShaper;
use transcript_layout::source::{FileHistory, HistoryApi, MemoryHistory};
use transcript_layout::state::{keys, Patch, Store};
use transcript_layout::view_state::conversation::ConversationSettings;

const FIVE_PAGES: &str = r#"[{"convoId":1,"messageId":1,"timestamp":"2023-08-01T00:00:00Z","type":"input","text":"What is this place?","trust":0.0}]
[{"convoId":1,"messageId":2,"timestamp":"2023-08-01T00:00:01Z","type":"response","text":"A room full of conversations.","trust":0.33}]
[{"convoId":2,"messageId":3,"timestamp":"2023-08-01T00:01:00Z","type":"input","text":"Do you remember me?"}]
[{"convoId":2,"messageId":4,"timestamp":"2023-08-01T00:01:01Z","type":"response","text":"","trust":0.5}]
[{"convoId":3,"messageId":5,"timestamp":"2023-08-01T00:02:00Z","type":"input","text":"Goodbye."}]
"#;

fn config(greeting_slots: u64) -> ResolvedConfig {
    ResolvedConfig {
        conversation: ConversationSettings {
            greeting_slots,
            idle_interval: Duration::from_millis(50),
            ..ConversationSettings::default()
        },
        ..ResolvedConfig::default()
    }
}

fn scene(config: &ResolvedConfig, history: Box<dyn HistoryApi>) -> Scene {
    Scene::new(
        config,
        800.0,
        600.0,
        history,
        Box::new(MonospaceShaper::default()),
    )
}

fn file_history(name: &str) -> FileHistory {
    let path = env::temp_dir().join(name);
    fs::write(&path, FIVE_PAGES).expect("write fixture");
    let history = FileHistory::open(&path).expect("fixture is valid");
    fs::remove_file(&path).ok();
    history
}

#[test]
fn idle_scene_scrolls_file_history_into_view() {
    // GIVEN: A five page history file and an idle scene starting at page 0
    let history = file_history("transcript_layout_acceptance_scroll.jsonl");
    let mut scene = scene(&config(0), Box::new(history));
    scene.set_state(AppState::Idle);

    // WHEN: Four idle intervals pass
    let report = scene.run_headless(Instant::now(), 4);

    // THEN: The empty response is skipped, the first page has scrolled off
    // the bottom and later pages stack above earlier ones
    let texts: Vec<&str> = report.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["A room full of conversations.", "Do you remember me?"]
    );
    assert_eq!(report.history_cursor, 4);
    assert!(report.scroll < 0.0);
}

#[test]
fn cursor_wraps_when_history_runs_out() {
    // GIVEN: Cursor at page 4 of 5
    let history = file_history("transcript_layout_acceptance_wrap.jsonl");
    let mut scene = scene(&config(4), Box::new(history));
    scene.set_state(AppState::Idle);

    // WHEN: One tick fetches the last page
    let report = scene.run_headless(Instant::now(), 1);

    // THEN: The cursor returns to where idle pagination started
    assert_eq!(report.history_cursor, 4);
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].text, "Goodbye.");
}

#[test]
fn interaction_shows_only_the_live_exchange() {
    let history = file_history("transcript_layout_acceptance_interaction.jsonl");
    let mut scene = scene(&config(0), Box::new(history));
    scene.set_state(AppState::Idle);
    let start = Instant::now();
    scene.run_headless(start, 2);

    scene.set_state(AppState::Interaction);
    scene.frame(start + Duration::from_secs(1));
    assert!(scene.report().messages.is_empty());

    let live: Vec<MessageRecord> = serde_json::from_str(
        r#"[{"convoId":9,"messageId":1,"timestamp":"2023-08-02T00:00:00Z","type":"input","text":"Hello again"}]"#,
    )
    .expect("valid records");
    scene.push_live(&live).expect("records serialize");
    scene.frame(start + Duration::from_secs(2));

    let report = scene.report();
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].text, "Hello again");
    assert_eq!(report.state, AppState::Interaction);
}

#[test]
fn store_notifies_any_mutation_before_keys_in_patch_order() {
    let store = Store::new(Patch::new());
    let log = Rc::new(RefCell::new(Vec::new()));

    for key in ["b", "a"] {
        let log = Rc::clone(&log);
        store.subscribe(key, move |_| log.borrow_mut().push(key.to_string()));
    }
    let any_log = Rc::clone(&log);
    store.subscribe_any("watcher", move || any_log.borrow_mut().push("any".into()));

    store.mutate(Patch::new().with("a", 1.0).with("b", 2.0));

    assert_eq!(*log.borrow(), vec!["any", "a", "b"]);
}

#[test]
fn one_shot_fires_once_and_cannot_be_removed_after() {
    let store = Store::new(Patch::new());
    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    let id = store.subscribe_once(keys::APP_STATE, move |_| *counter.borrow_mut() += 1);

    store.set(keys::APP_STATE, AppState::Idle);
    store.set(keys::APP_STATE, AppState::Interaction);

    assert_eq!(*count.borrow(), 1);
    assert!(matches!(
        store.unsubscribe(keys::APP_STATE, id),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn degenerate_viewport_skips_layout_until_resized() {
    let mut scene = Scene::new(
        &ResolvedConfig::default(),
        0.0,
        0.0,
        Box::new(MemoryHistory::default()),
        Box::new(MonospaceShaper::default()),
    );
    scene.frame(Instant::now());
    assert!(scene.report().metrics.is_none());
    assert_eq!(scene.report().input_height, None);

    scene.resize(800.0, 600.0);
    scene.frame(Instant::now());

    assert!(scene.report().metrics.is_some());
    assert!(scene.report().input_height.is_some());
}
