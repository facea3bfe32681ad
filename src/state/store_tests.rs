//! Tests for the reactive store.
//!
//! Ordering tests record every callback into a shared log and compare the
//! whole sequence.

use super::*;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn record_key(store: &Store, key: &str, tag: &str, log: &Log) -> SubscriptionId {
    let sink = Rc::clone(log);
    let tag = tag.to_string();
    store.subscribe(key, move |v| {
        sink.borrow_mut()
            .push(format!("{tag}={}", v.as_number().unwrap_or(f64::NAN)));
    })
}

#[test]
fn new_store_exposes_initial_values_without_notifying() {
    let store = Store::new(Patch::new().with("a", 1.0).with("b", "text"));

    assert_eq!(store.number("a"), Some(1.0));
    assert_eq!(store.text("b").as_deref(), Some("text"));
    assert_eq!(store.get("missing"), None);
}

#[test]
fn per_key_subscriber_receives_new_value() {
    let store = Store::new(Patch::new());
    let seen = log();
    record_key(&store, "x", "x", &seen);

    store.mutate(Patch::new().with("x", 3.0));

    assert_eq!(*seen.borrow(), vec!["x=3"]);
}

#[test]
fn unrelated_key_does_not_notify() {
    let store = Store::new(Patch::new());
    let seen = log();
    record_key(&store, "x", "x", &seen);

    store.mutate(Patch::new().with("y", 3.0));

    assert!(seen.borrow().is_empty());
    assert_eq!(store.number("y"), Some(3.0));
}

#[test]
fn any_mutation_subscribers_run_before_per_key_subscribers() {
    // GIVEN: a per-key subscriber registered before an any-mutation one
    let store = Store::new(Patch::new());
    let seen = log();
    record_key(&store, "x", "key", &seen);
    let sink = Rc::clone(&seen);
    store.subscribe_any("watch", move || sink.borrow_mut().push("any".to_string()));

    // WHEN: a batch touches the key
    store.mutate(Patch::new().with("x", 1.0));

    // THEN: the any-mutation callback still runs first
    assert_eq!(*seen.borrow(), vec!["any", "key=1"]);
}

#[test]
fn per_key_notifications_follow_patch_order_then_registration_order() {
    let store = Store::new(Patch::new());
    let seen = log();
    record_key(&store, "b", "b1", &seen);
    record_key(&store, "a", "a1", &seen);
    record_key(&store, "b", "b2", &seen);

    store.mutate(Patch::new().with("a", 1.0).with("b", 2.0));

    assert_eq!(*seen.borrow(), vec!["a1=1", "b1=2", "b2=2"]);
}

#[test]
fn subscribers_observe_whole_batch_merged() {
    let store = Store::new(Patch::new());
    let observed = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&observed);
    let reader = store.clone();
    store.subscribe("a", move |_| {
        *sink.borrow_mut() = reader.number("b");
    });

    store.mutate(Patch::new().with("a", 1.0).with("b", 2.0));

    assert_eq!(*observed.borrow(), Some(2.0));
}

#[test]
fn duplicate_keys_notify_per_entry_and_last_value_wins() {
    let store = Store::new(Patch::new());
    let seen = log();
    record_key(&store, "x", "x", &seen);

    store.mutate(Patch::new().with("x", 1.0).with("x", 2.0));

    assert_eq!(*seen.borrow(), vec!["x=1", "x=2"]);
    assert_eq!(store.number("x"), Some(2.0));
}

#[test]
fn one_shot_fires_exactly_once_across_mutations() {
    let store = Store::new(Patch::new());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    store.subscribe_once("x", move |_| *sink.borrow_mut() += 1);

    store.mutate(Patch::new().with("x", 1.0));
    store.mutate(Patch::new().with("x", 2.0));

    assert_eq!(*count.borrow(), 1);
    assert_eq!(store.subscriber_count("x"), 0);
}

#[test]
fn one_shot_fires_once_even_when_key_repeats_in_one_batch() {
    let store = Store::new(Patch::new());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    store.subscribe_once("x", move |_| *sink.borrow_mut() += 1);

    store.mutate(Patch::new().with("x", 1.0).with("x", 2.0));

    assert_eq!(*count.borrow(), 1);
}

#[test]
fn one_shot_any_subscriber_fires_once() {
    let store = Store::new(Patch::new());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    store.subscribe_any_once("watch", move || *sink.borrow_mut() += 1);

    store.set("a", 1.0);
    store.set("b", 2.0);

    assert_eq!(*count.borrow(), 1);
}

#[test]
fn unsubscribe_stops_notifications() {
    let store = Store::new(Patch::new());
    let seen = log();
    let id = record_key(&store, "x", "x", &seen);

    store.unsubscribe("x", id).expect("registered");
    store.set("x", 1.0);

    assert!(seen.borrow().is_empty());
}

#[test]
fn unsubscribe_unknown_subscription_is_not_found() {
    let store = Store::new(Patch::new());
    let seen = log();
    let id = record_key(&store, "x", "x", &seen);

    let wrong_key = store.unsubscribe("y", id);
    assert_eq!(
        wrong_key,
        Err(StoreError::NotFound {
            key: "y".to_string(),
            id: id.get(),
        })
    );

    store.unsubscribe("x", id).expect("first removal succeeds");
    assert!(matches!(
        store.unsubscribe("x", id),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn subscriber_removed_mid_batch_is_skipped() {
    // GIVEN: the first subscriber unsubscribes the second
    let store = Store::new(Patch::new());
    let seen = log();
    let victim: Rc<RefCell<Option<SubscriptionId>>> = Rc::new(RefCell::new(None));

    let handle = store.clone();
    let target = Rc::clone(&victim);
    let sink = Rc::clone(&seen);
    store.subscribe("x", move |_| {
        sink.borrow_mut().push("first".to_string());
        if let Some(id) = target.borrow_mut().take() {
            let _ = handle.unsubscribe("x", id);
        }
    });
    let second = record_key(&store, "x", "second", &seen);
    *victim.borrow_mut() = Some(second);

    // WHEN
    store.set("x", 1.0);

    // THEN: the removed subscriber never runs
    assert_eq!(*seen.borrow(), vec!["first"]);
}

#[test]
fn nested_mutation_is_dispatched_after_current_batch() {
    // GIVEN: a subscriber on "a" that writes "b", and two subscribers on "a"
    let store = Store::new(Patch::new());
    let seen = log();

    let handle = store.clone();
    let sink = Rc::clone(&seen);
    store.subscribe("a", move |_| {
        sink.borrow_mut().push("a1".to_string());
        handle.set("b", 5.0);
        // The nested write is visible immediately.
        sink.borrow_mut()
            .push(format!("b-now={}", handle.number("b").unwrap_or(f64::NAN)));
    });
    record_key(&store, "a", "a2", &seen);
    record_key(&store, "b", "b", &seen);

    // WHEN
    store.set("a", 1.0);

    // THEN: "a2" sees the outer batch before "b" sees the nested one
    assert_eq!(*seen.borrow(), vec!["a1", "b-now=5", "a2=1", "b=5"]);
}

#[test]
fn nested_batches_run_in_fifo_order() {
    let store = Store::new(Patch::new());
    let seen = log();

    let handle = store.clone();
    store.subscribe("start", move |_| {
        handle.set("first", 1.0);
        handle.set("second", 2.0);
    });
    record_key(&store, "second", "second", &seen);
    record_key(&store, "first", "first", &seen);

    store.set("start", 0.0);

    assert_eq!(*seen.borrow(), vec!["first=1", "second=2"]);
}

#[test]
fn empty_patch_notifies_nobody() {
    let store = Store::new(Patch::new());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    store.subscribe_any("watch", move || *sink.borrow_mut() += 1);

    store.mutate(Patch::new());

    assert_eq!(*count.borrow(), 0);
}

#[test]
fn typed_readers_treat_mismatched_variant_as_absent() {
    let store = Store::new(
        Patch::new()
            .with("n", 2.5)
            .with("flag", true)
            .with("point", Vec2::new(1.0, 2.0)),
    );

    assert_eq!(store.f32("n"), Some(2.5));
    assert_eq!(store.flag("flag"), Some(true));
    assert_eq!(store.vec2("point"), Some(Vec2::new(1.0, 2.0)));
    assert_eq!(store.text("n"), None);
    assert_eq!(store.number("flag"), None);
}

#[test]
fn snapshot_is_sorted_by_key() {
    let store = Store::new(Patch::new().with("b", 1.0).with("a", 2.0));

    let keys: Vec<String> = store.snapshot().into_keys().collect();

    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn patch_get_returns_last_write() {
    let patch: Patch = vec![("k", 1.0), ("k", 2.0)].into_iter().collect();

    assert_eq!(patch.len(), 2);
    assert_eq!(patch.get("k"), Some(&StateValue::Number(2.0)));
}

#[test]
fn weak_handle_does_not_keep_store_alive() {
    let store = Store::new(Patch::new().with("a", 1.0));
    let weak = store.downgrade();

    assert_eq!(weak.upgrade().and_then(|s| s.number("a")), Some(1.0));
    drop(store);
    assert!(weak.upgrade().is_none());
}
