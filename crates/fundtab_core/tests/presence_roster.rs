//! Presence protocol behavior across execution contexts sharing one bus.

use fundtab_core::{Bus, Identity, PresenceConfig, PresenceMessage, PresenceService};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn fast_config() -> PresenceConfig {
    PresenceConfig::with_heartbeat(Duration::from_millis(40))
}

fn names(roster: &[Identity]) -> Vec<&str> {
    roster.iter().map(|identity| identity.name.as_str()).collect()
}

#[test]
fn join_is_visible_to_running_peers_immediately() {
    let bus = Bus::new("fund_presence");
    let service_a = PresenceService::new(bus.clone(), fast_config());
    let service_b = PresenceService::new(bus.clone(), fast_config());

    let rosters_b = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&rosters_b);
    let _bob = service_b.join(Identity::new("Bob"), move |roster| {
        sink.lock().unwrap().push(roster);
    });

    let alice = service_a.join(Identity::new("Alice"), |_| {});

    let snapshots = rosters_b.lock().unwrap();
    let latest = snapshots.last().unwrap();
    assert_eq!(names(latest), vec!["Alice", "Bob"]);
    drop(snapshots);

    // The join reply-heartbeat means Alice learns about Bob without waiting
    // for Bob's next tick.
    assert_eq!(names(&alice.roster()), vec!["Alice", "Bob"]);
}

#[test]
fn leave_removes_the_peer_from_running_rosters() {
    let bus = Bus::new("fund_presence");
    let service_a = PresenceService::new(bus.clone(), fast_config());
    let service_b = PresenceService::new(bus.clone(), fast_config());

    let bob = service_b.join(Identity::new("Bob"), |_| {});
    let mut alice = service_a.join(Identity::new("Alice"), |_| {});
    assert_eq!(names(&bob.roster()), vec!["Alice", "Bob"]);

    alice.leave();
    assert_eq!(names(&bob.roster()), vec!["Bob"]);
}

#[test]
fn leave_is_idempotent() {
    let bus = Bus::new("fund_presence");
    let service = PresenceService::new(bus, fast_config());

    let mut handle = service.join(Identity::new("Alice"), |_| {});
    handle.leave();
    handle.leave();
}

#[test]
fn heartbeat_upsert_is_last_write_wins_per_name() {
    let bus = Bus::new("fund_presence");
    // Slow heartbeat so no periodic tick can interleave with the two
    // explicit announcements under test.
    let slow = PresenceConfig::with_heartbeat(Duration::from_secs(5));
    let service_a = PresenceService::new(bus.clone(), slow);
    let service_b = PresenceService::new(bus.clone(), slow);

    let bob = service_b.join(Identity::new("Bob"), |_| {});
    let alice = service_a.join(
        Identity::new("Alice").with_role("treasurer").with_avatar("a1"),
        |_| {},
    );

    // Second announcement carries a different role and no avatar; peers
    // must show exactly the second attribute set, with nothing merged in.
    alice.update_identity(Identity::new("Alice").with_role("auditor"));

    let roster = bob.roster();
    let seen = roster
        .iter()
        .find(|identity| identity.name == "Alice")
        .unwrap();
    assert_eq!(seen.role.as_deref(), Some("auditor"));
    assert_eq!(seen.avatar, None);
}

#[test]
fn silent_peer_is_evicted_after_timeout() {
    let bus = Bus::new("fund_presence");
    let service = PresenceService::new(bus.clone(), fast_config());

    let bob = service.join(Identity::new("Bob"), |_| {});

    // A context that died without LEAVE: announce once, then go silent.
    let ghost = bus.endpoint();
    ghost.publish(PresenceMessage::Join(Identity::new("Ghost")));
    assert_eq!(names(&bob.roster()), vec!["Bob", "Ghost"]);

    std::thread::sleep(fast_config().eviction_timeout + Duration::from_millis(60));
    assert_eq!(names(&bob.roster()), vec!["Bob"]);
}

#[test]
fn heartbeats_keep_a_peer_alive_past_the_timeout_window() {
    let bus = Bus::new("fund_presence");
    let service_a = PresenceService::new(bus.clone(), fast_config());
    let service_b = PresenceService::new(bus.clone(), fast_config());

    let bob = service_b.join(Identity::new("Bob"), |_| {});
    let _alice = service_a.join(Identity::new("Alice"), |_| {});

    std::thread::sleep(fast_config().eviction_timeout * 2);
    assert_eq!(names(&bob.roster()), vec!["Alice", "Bob"]);
}

#[test]
fn self_appears_in_roster_before_any_bus_traffic() {
    let bus = Bus::new("fund_presence");
    let service = PresenceService::new(bus, fast_config());

    let first_snapshot = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&first_snapshot);
    let _handle = service.join(Identity::new("Solo"), move |roster| {
        sink.lock().unwrap().get_or_insert(roster);
    });

    let snapshot = first_snapshot.lock().unwrap();
    assert_eq!(names(snapshot.as_ref().unwrap()), vec!["Solo"]);
}

#[test]
fn messages_with_empty_names_are_ignored() {
    let bus = Bus::new("fund_presence");
    let service = PresenceService::new(bus.clone(), fast_config());

    let bob = service.join(Identity::new("Bob"), |_| {});
    bus.endpoint()
        .publish(PresenceMessage::Heartbeat(Identity::new("")));

    assert_eq!(names(&bob.roster()), vec!["Bob"]);
}
