use std::time::Instant;

use potluck::backend::InMemoryBackend;
use potluck::entry::Draft;
use potluck::entry::OrderScope;
use potluck::id::ListId;
use potluck::sync::SyncCoordinator;
use potluck::sync::SyncError;

fn show(who: &str, sync: &SyncCoordinator<InMemoryBackend>) {
    let rows: Vec<String> = sync
        .entries()
        .iter()
        .filter(|e| !e.text.is_empty())
        .map(|e| format!("{} @{}", e.text, e.list_order))
        .collect();
    println!("{who}: {rows:?}");
}

/// Two clients editing one grocery list over a shared in-memory store.
fn main() -> Result<(), SyncError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let store = InMemoryBackend::new();
    let groceries = ListId::from_raw("groceries");

    let mut alice = SyncCoordinator::new(store.clone());
    let mut bob = SyncCoordinator::new(store);
    alice.attach(groceries.clone())?;
    bob.attach(groceries)?;

    let debounce = alice.config().debounce;
    let grace = alice.config().grace;
    let mut now = Instant::now();

    // Alice stocks the list; bread squeezes in between milk and eggs.
    let milk = alice.append(Draft::item("milk"), &OrderScope::List, now);
    alice.append(Draft::item("eggs"), &OrderScope::List, now);
    alice
        .insert_after(&milk, Draft::item("bread"), &OrderScope::List, now)
        .expect("milk was just appended");
    show("alice", &alice);

    // The whole burst goes out as one push.
    now += debounce;
    alice.tick(now);

    // The store echoes the push back to alice; her dirty window swallows
    // it. Bob is clean and adopts the snapshot immediately.
    alice.pump(now)?;
    bob.pump(now)?;
    show("bob  ", &bob);

    // Bob reorders by drag, which re-keys the whole list.
    let mut reversed: Vec<_> = bob.entries().iter().map(|e| e.id.clone()).collect();
    reversed.reverse();
    bob.apply_drag(&reversed, &OrderScope::List, now);
    show("bob  ", &bob);

    now += debounce;
    bob.tick(now);

    // By now alice's window has closed, so she adopts bob's order; bob's
    // own echo is recognized as unchanged and skipped.
    now += grace;
    alice.pump(now)?;
    bob.pump(now)?;
    show("alice", &alice);
    show("bob  ", &bob);

    return Ok(());
}
