//! End-to-end tests for the engine surface: rooms, rolls, draws,
//! lifecycle operations, and the poll/refresh loop, all on a manual
//! clock so nothing sleeps.

use std::collections::BTreeSet;
use std::sync::Arc;

use felt::prelude::*;

struct Table {
    engine: Engine,
    clock: Arc<ManualClock>,
    room: RoomKey,
}

async fn table() -> Table {
    felt::init_tracing();
    let clock = Arc::new(ManualClock::new(1_000));
    let engine = Engine::new(EngineConfig::default()).with_clock(clock.clone());
    let (room, created) = engine.ensure_room("AmberKeenKestrel").await;
    assert!(created);
    Table {
        engine,
        clock,
        room,
    }
}

fn fp(s: &str) -> Fingerprint {
    Fingerprint::new(s)
}

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_ensure_room_self_heals_and_then_sticks() {
    let t = table().await;
    let (again, created) = t.engine.ensure_room("AmberKeenKestrel").await;
    assert!(!created);
    assert_eq!(again, t.room);
}

#[tokio::test]
async fn test_new_room_generates_a_usable_slug() {
    let t = table().await;
    let (key, slug) = t.engine.new_room().await;
    assert_ne!(key, t.room);
    assert!(!slug.contains(' '));
    let (resolved, created) = t.engine.ensure_room(&slug).await;
    assert!(!created);
    assert_eq!(resolved, key);
}

#[tokio::test]
async fn test_fresh_room_snapshot_is_empty_with_full_deck() {
    let t = table().await;
    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.slug, "AmberKeenKestrel");
    assert!(view.dice.is_empty());
    assert_eq!(view.cards_left, 52);
    assert_eq!(view.roll_total, 0);
}

// =========================================================================
// Rolling
// =========================================================================

#[tokio::test]
async fn test_roll_three_d6_creates_three_dice_and_sums_them() {
    let t = table().await;
    let alice = fp("alice");

    let total = t
        .engine
        .roll(t.room, RollRequest::default().with_numeric(6, 3), &alice)
        .await
        .unwrap();
    assert!((3..=18).contains(&total));

    let view = t.engine.snapshot(t.room, &alice).await.unwrap();
    assert_eq!(view.dice.len(), 3);
    let mut sum = 0;
    for die in &view.dice {
        assert_eq!(die.kind, DieKind::Numeric { sides: 6 });
        assert!((1..=6).contains(&die.result));
        sum += die.result;
    }
    assert_eq!(sum, total);
    assert_eq!(view.roll_total, total);
}

#[tokio::test]
async fn test_roll_total_groups_by_most_recent_roll() {
    let t = table().await;
    let alice = fp("alice");

    let first = t
        .engine
        .roll(t.room, RollRequest::default().with_numeric(6, 2), &alice)
        .await
        .unwrap();
    t.clock.advance(1);
    let second = t
        .engine
        .roll(t.room, RollRequest::default().with_numeric(8, 2), &alice)
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &alice).await.unwrap();
    assert_eq!(view.roll_total, second, "only the newest roll");
    assert_eq!(view.room_total, first + second, "the whole table");
}

#[tokio::test]
async fn test_roll_modifier_is_sticky_and_applied() {
    let t = table().await;
    let alice = fp("alice");

    t.engine
        .roll(
            t.room,
            RollRequest::default().with_numeric(6, 1).with_modifier(5),
            &alice,
        )
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &alice).await.unwrap();
    assert_eq!(view.modifier, 5);
    assert_eq!(view.modified_roll_total, view.roll_total + 5);
}

#[tokio::test]
async fn test_roll_offbeat_size_displays_as_text() {
    let t = table().await;
    let alice = fp("alice");
    t.engine
        .roll(t.room, RollRequest::default().with_numeric(13, 1), &alice)
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &alice).await.unwrap();
    let die = &view.dice[0];
    assert_eq!(die.display, format!("{} (d13)", die.result));
    assert_eq!(die.image, None, "no artwork for offbeat sizes");
}

#[tokio::test]
async fn test_roll_fate_dice_do_not_count_toward_total() {
    let t = table().await;
    let total = t
        .engine
        .roll(t.room, RollRequest::default().with_fate(4), &fp("a"))
        .await
        .unwrap();
    assert_eq!(total, 0);

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.dice.len(), 4);
    for die in &view.dice {
        assert!(["-", " ", "+"].contains(&die.display.as_str()));
    }
}

#[tokio::test]
async fn test_roll_coins_start_face_down_and_count_as_tokens() {
    let t = table().await;
    t.engine
        .roll(t.room, RollRequest::default().with_coins(2), &fp("a"))
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.token_count, 2);
    for die in &view.dice {
        assert_eq!(die.result, 0);
    }
}

#[tokio::test]
async fn test_roll_clear_color_becomes_lightblue() {
    let t = table().await;
    t.engine
        .roll(
            t.room,
            RollRequest::default().with_numeric(6, 1).with_color("clear"),
            &fp("a"),
        )
        .await
        .unwrap();
    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.dice[0].color, "lightblue");
}

#[tokio::test]
async fn test_roll_with_label_places_a_label() {
    let t = table().await;
    t.engine
        .roll(
            t.room,
            RollRequest::default().with_label("  Initiative  "),
            &fp("a"),
        )
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.dice.len(), 1);
    assert_eq!(view.dice[0].kind, DieKind::Label);
    assert_eq!(view.dice[0].display, "Initiative");
}

#[tokio::test]
async fn test_roll_over_the_cap_skips_the_oversized_group() {
    let t = table().await;
    t.engine
        .roll(
            t.room,
            RollRequest::default().with_numeric(6, 501).with_numeric(4, 2),
            &fp("a"),
        )
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert!(
        view.dice.len() < 10,
        "the 501-die group must be skipped, got {}",
        view.dice.len()
    );
}

// =========================================================================
// Cards
// =========================================================================

#[tokio::test]
async fn test_draw_five_cards_leaves_47() {
    let t = table().await;
    let drawn = t
        .engine
        .draw_cards(t.room, 5, None, false, &fp("a"))
        .await
        .unwrap();
    assert_eq!(drawn.len(), 5);

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.cards_left, 47);

    let distinct: BTreeSet<&str> = drawn.iter().map(|d| d.display.as_str()).collect();
    assert_eq!(distinct.len(), 5, "no duplicate deals");
}

#[tokio::test]
async fn test_deck_short_deals_when_nearly_empty() {
    let t = table().await;
    t.engine
        .draw_cards(t.room, 50, None, false, &fp("a"))
        .await
        .unwrap();
    let last = t
        .engine
        .draw_cards(t.room, 10, None, false, &fp("a"))
        .await
        .unwrap();
    assert_eq!(last.len(), 2, "short deal hands over what remains");

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.cards_left, 0);
}

#[tokio::test]
async fn test_shuffle_discards_keeps_table_cards_out() {
    let t = table().await;
    let out = t
        .engine
        .draw_cards(t.room, 5, None, false, &fp("a"))
        .await
        .unwrap();
    let out_names: BTreeSet<String> = out.iter().map(|d| d.display.clone()).collect();

    // Delete nothing, shuffle: the 5 on the table stay out.
    t.engine
        .shuffle_discards(t.room, None, &fp("a"))
        .await
        .unwrap();
    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.cards_left, 47);

    // Drawing the whole rebuilt deck never reproduces a table card.
    let rest = t
        .engine
        .draw_cards(t.room, 47, None, false, &fp("a"))
        .await
        .unwrap();
    let mut all: BTreeSet<String> = rest.iter().map(|d| d.display.clone()).collect();
    assert_eq!(all.len(), 47);
    assert!(all.is_disjoint(&out_names));
    all.extend(out_names);
    assert_eq!(all.len(), 52, "table plus rebuilt deck is the full domain");
}

#[tokio::test]
async fn test_card_reroll_is_delete_and_redraw() {
    let t = table().await;
    let drawn = t
        .engine
        .draw_cards(t.room, 1, None, false, &fp("a"))
        .await
        .unwrap();
    let old = drawn[0].clone();
    t.engine
        .move_die(old.key, 30.0, 40.0, &fp("a"))
        .await
        .unwrap();

    t.engine
        .reroll_die(old.key, &fp("a"), RerollOptions::default())
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.dice.len(), 1, "old card replaced, not duplicated");
    let new = &view.dice[0];
    assert_ne!(new.key, old.key, "a fresh entity, not a mutation");
    assert_ne!(new.display, old.display, "the old card stays out of the deck");
    assert_eq!((new.x, new.y), (30.0, 40.0), "replacement takes the old spot");
    assert_eq!(view.cards_left, 50, "one dealt, one redrawn, old one out");
}

// =========================================================================
// Custom sets
// =========================================================================

async fn npc_table() -> Table {
    let t = table().await;
    t.engine
        .add_custom_set(t.room, "npcs", "Brash Guard\nQuiet Scribe\nOld Miller", "140", "100")
        .await
        .unwrap();
    t
}

#[tokio::test]
async fn test_custom_set_draw_and_remaining() {
    let t = npc_table().await;
    let drawn = t
        .engine
        .draw_cards(t.room, 2, Some("npcs"), false, &fp("a"))
        .await
        .unwrap();
    assert_eq!(drawn.len(), 2);

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.custom_sets[0].remaining, 1);
    for die in &view.dice {
        assert!(matches!(&die.kind, DieKind::CustomItem { set, .. } if set == "npcs"));
    }
}

#[tokio::test]
async fn test_custom_set_draw_from_empty_pool_fails() {
    let t = npc_table().await;
    t.engine
        .draw_cards(t.room, 3, Some("npcs"), false, &fp("a"))
        .await
        .unwrap();
    let result = t
        .engine
        .draw_cards(t.room, 1, Some("npcs"), false, &fp("a"))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Deck(DeckError::EmptyPool))
    ));
}

#[tokio::test]
async fn test_custom_set_unknown_name_fails() {
    let t = npc_table().await;
    let result = t
        .engine
        .draw_cards(t.room, 1, Some("loot"), false, &fp("a"))
        .await;
    assert!(matches!(result, Err(EngineError::UnknownSet(name)) if name == "loot"));
}

#[tokio::test]
async fn test_custom_item_reroll_draws_replacement_from_pool() {
    let t = npc_table().await;
    let drawn = t
        .engine
        .draw_cards(t.room, 2, Some("npcs"), false, &fp("a"))
        .await
        .unwrap();
    let old = drawn[0].clone();

    t.engine
        .reroll_die(old.key, &fp("a"), RerollOptions::default())
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(view.dice.len(), 2);
    assert!(view.dice.iter().all(|d| d.key != old.key));
    assert_eq!(view.custom_sets[0].remaining, 0, "replacement came from the pool");
}

#[tokio::test]
async fn test_custom_shuffle_discards_restores_off_table_items() {
    let t = npc_table().await;
    let drawn = t
        .engine
        .draw_cards(t.room, 3, Some("npcs"), false, &fp("a"))
        .await
        .unwrap();
    // Put one back by deleting its die; two stay on the table.
    t.engine.delete_die(drawn[0].key).await.unwrap();

    t.engine
        .shuffle_discards(t.room, Some("npcs"), &fp("a"))
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(
        view.custom_sets[0].remaining, 1,
        "only the deleted item returns to the pool"
    );
}

#[tokio::test]
async fn test_remove_custom_set() {
    let t = npc_table().await;
    t.engine.remove_custom_set(t.room, "npcs").await.unwrap();
    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert!(view.custom_sets.is_empty());
    // Removing again is quietly fine.
    t.engine.remove_custom_set(t.room, "npcs").await.unwrap();
}

// =========================================================================
// Hide / reveal / ownership
// =========================================================================

#[tokio::test]
async fn test_hidden_draw_masks_for_strangers() {
    let t = table().await;
    let alice = fp("alice");
    let bob = fp("bob");

    let drawn = t
        .engine
        .draw_cards(t.room, 1, None, true, &alice)
        .await
        .unwrap();
    assert!(drawn[0].hidden());

    let alice_view = t.engine.snapshot(t.room, &alice).await.unwrap();
    assert!(alice_view.dice[0].hidden, "owner sees it as hidden");
    assert!(!alice_view.dice[0].display.is_empty());

    let bob_view = t.engine.snapshot(t.room, &bob).await.unwrap();
    assert_eq!(bob_view.dice.len(), 1, "masked, not omitted");
    assert!(!bob_view.dice[0].hidden);
    assert!(bob_view.dice[0].display.is_empty());
    assert!(
        bob_view.dice[0]
            .image
            .as_deref()
            .unwrap_or_default()
            .ends_with("back.png")
    );
}

#[tokio::test]
async fn test_reveal_requires_ownership() {
    let t = table().await;
    let alice = fp("alice");
    let bob = fp("bob");

    let drawn = t
        .engine
        .draw_cards(t.room, 1, None, true, &alice)
        .await
        .unwrap();
    let key = drawn[0].key;

    let result = t.engine.reveal_die(key, &bob).await;
    assert!(matches!(
        result,
        Err(EngineError::Token(TokenError::NotOwner { .. }))
    ));

    t.engine.reveal_die(key, &alice).await.unwrap();
    let bob_view = t.engine.snapshot(t.room, &bob).await.unwrap();
    assert!(!bob_view.dice[0].display.is_empty(), "revealed to everyone");

    // Revealing an already-visible die stays a no-op.
    t.engine.reveal_die(key, &alice).await.unwrap();
}

#[tokio::test]
async fn test_hidden_die_reroll_locked_to_owner() {
    let t = table().await;
    let alice = fp("alice");
    let bob = fp("bob");

    let drawn = t
        .engine
        .draw_cards(t.room, 1, None, true, &alice)
        .await
        .unwrap();
    let key = drawn[0].key;

    let result = t
        .engine
        .reroll_die(key, &bob, RerollOptions::default())
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Token(TokenError::NotOwner { .. }))
    ));

    // The owner may reroll; the replacement stays hidden for them.
    t.engine
        .reroll_die(key, &alice, RerollOptions::default())
        .await
        .unwrap();
    let view = t.engine.snapshot(t.room, &alice).await.unwrap();
    assert_eq!(view.dice.len(), 1);
    assert!(view.dice[0].hidden);
}

#[tokio::test]
async fn test_rejected_reveal_still_nudges_pollers() {
    let t = table().await;
    let alice = fp("alice");
    let bob = fp("bob");

    let drawn = t
        .engine
        .draw_cards(t.room, 1, None, true, &alice)
        .await
        .unwrap();
    // Let the draw's own updates age out of the window first.
    t.clock.advance(10);
    assert_eq!(t.engine.refresh(t.room, &alice).await.unwrap(), None);

    let _ = t.engine.reveal_die(drawn[0].key, &bob).await;

    // The rejection changed nothing, but every poller still hears a
    // knock, the preserved workaround for flaky refresh loops.
    assert!(t.engine.refresh(t.room, &alice).await.unwrap().is_some());
}

// =========================================================================
// Clocks, labels, images
// =========================================================================

#[tokio::test]
async fn test_clock_lifecycle_advances_and_decrements() {
    let t = table().await;
    t.engine
        .roll(
            t.room,
            RollRequest::default().with_clock(ClockFace::C4),
            &fp("a"),
        )
        .await
        .unwrap();
    let key = t.engine.snapshot(t.room, &fp("a")).await.unwrap().dice[0].key;

    // Advance around the full cycle: 1,2,3,4,0.
    let mut seen = Vec::new();
    for _ in 0..5 {
        t.engine
            .reroll_die(key, &fp("a"), RerollOptions::default())
            .await
            .unwrap();
        seen.push(t.engine.store().die(key).await.unwrap().result);
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 0]);

    // Decrement at 0 stays at 0.
    t.engine.decrement_clock(key).await.unwrap();
    assert_eq!(t.engine.store().die(key).await.unwrap().result, 0);

    t.engine
        .reroll_die(key, &fp("a"), RerollOptions::default())
        .await
        .unwrap();
    t.engine.decrement_clock(key).await.unwrap();
    assert_eq!(t.engine.store().die(key).await.unwrap().result, 0);
}

#[tokio::test]
async fn test_label_cannot_be_rerolled() {
    let t = table().await;
    t.engine
        .roll(t.room, RollRequest::default().with_label("notes"), &fp("a"))
        .await
        .unwrap();
    let key = t.engine.snapshot(t.room, &fp("a")).await.unwrap().dice[0].key;

    let result = t
        .engine
        .reroll_die(key, &fp("a"), RerollOptions::default())
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Token(TokenError::NotRerollable(_)))
    ));
}

#[tokio::test]
async fn test_image_token_lifecycle() {
    let t = table().await;
    let key = t
        .engine
        .add_image(t.room, "https://maps.example/cave.png", "300", "200", &fp("a"))
        .await
        .unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(
        view.dice[0].image.as_deref(),
        Some("https://maps.example/cave.png")
    );

    let result = t
        .engine
        .reroll_die(key, &fp("a"), RerollOptions::default())
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Token(TokenError::NotRerollable(_)))
    ));

    // Images can hide though (maps the table shouldn't see yet).
    t.engine.hide_die(key, &fp("a")).await.unwrap();
    let stranger = t.engine.snapshot(t.room, &fp("b")).await.unwrap();
    assert!(stranger.dice.is_empty(), "hidden images are omitted");
}

#[tokio::test]
async fn test_coin_white_flip_through_the_engine() {
    let t = table().await;
    t.engine
        .roll(
            t.room,
            RollRequest::default().with_coins(1).with_color("red"),
            &fp("a"),
        )
        .await
        .unwrap();
    let key = t.engine.snapshot(t.room, &fp("a")).await.unwrap().dice[0].key;

    t.engine
        .reroll_die(key, &fp("a"), RerollOptions { white_flip: true })
        .await
        .unwrap();
    let die = t.engine.store().die(key).await.unwrap();
    assert_eq!(die.color, "white");

    t.engine
        .reroll_die(key, &fp("a"), RerollOptions { white_flip: true })
        .await
        .unwrap();
    let die = t.engine.store().die(key).await.unwrap();
    assert_eq!(die.color, "red");
}

// =========================================================================
// Move / delete / clear
// =========================================================================

#[tokio::test]
async fn test_move_updates_position_and_settles() {
    let t = table().await;
    t.engine
        .roll(t.room, RollRequest::default().with_numeric(6, 1), &fp("a"))
        .await
        .unwrap();
    let key = t.engine.snapshot(t.room, &fp("a")).await.unwrap().dice[0].key;

    t.engine.move_die(key, 120.0, 45.5, &fp("a")).await.unwrap();

    let die = t.engine.store().die(key).await.unwrap();
    assert_eq!((die.x, die.y), (120.0, 45.5));
    assert!(!die.fresh);
}

#[tokio::test]
async fn test_delete_die_removes_it_and_later_deletes_fail() {
    let t = table().await;
    t.engine
        .roll(t.room, RollRequest::default().with_numeric(6, 1), &fp("a"))
        .await
        .unwrap();
    let key = t.engine.snapshot(t.room, &fp("a")).await.unwrap().dice[0].key;

    t.engine.delete_die(key).await.unwrap();
    assert!(t
        .engine
        .snapshot(t.room, &fp("a"))
        .await
        .unwrap()
        .dice
        .is_empty());

    let result = t.engine.delete_die(key).await;
    assert!(matches!(
        result,
        Err(EngineError::Store(StoreError::DieNotFound(_)))
    ));
}

#[tokio::test]
async fn test_clear_room_empties_the_table_but_keeps_the_deck() {
    let t = table().await;
    t.engine
        .roll(
            t.room,
            RollRequest::default().with_numeric(6, 3).with_cards(2),
            &fp("a"),
        )
        .await
        .unwrap();

    t.engine.clear_room(t.room, &fp("a")).await.unwrap();

    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert!(view.dice.is_empty());
    assert_eq!(view.cards_left, 50, "clearing the table is not a reshuffle");
}

// =========================================================================
// Polling
// =========================================================================

#[tokio::test]
async fn test_refresh_skips_own_roll_but_tells_everyone_else() {
    let t = table().await;
    let alice = fp("alice");
    let bob = fp("bob");

    t.engine
        .roll(t.room, RollRequest::default().with_numeric(6, 1), &alice)
        .await
        .unwrap();

    assert_eq!(t.engine.refresh(t.room, &alice).await.unwrap(), None);
    let token = t.engine.refresh(t.room, &bob).await.unwrap();
    assert!(token.is_some());

    // Idempotent until something changes or the window lapses.
    assert_eq!(t.engine.refresh(t.room, &bob).await.unwrap(), token);
}

#[tokio::test]
async fn test_refresh_goes_quiet_after_the_window() {
    let t = table().await;
    t.engine
        .roll(t.room, RollRequest::default().with_numeric(6, 1), &fp("alice"))
        .await
        .unwrap();

    t.clock.advance(3); // past the 2-unit window
    assert_eq!(t.engine.refresh(t.room, &fp("bob")).await.unwrap(), None);
}

#[tokio::test]
async fn test_alert_reaches_pollers_with_its_message() {
    let t = table().await;
    t.engine.alert(t.room, "dinner time").await.unwrap();

    let token = t
        .engine
        .refresh(t.room, &fp("bob"))
        .await
        .unwrap()
        .expect("alert must nudge");
    assert!(token.ends_with("||dinner time"));
}

#[tokio::test]
async fn test_background_change_nudges_everyone() {
    let t = table().await;
    t.engine
        .set_background(t.room, "https://maps.example/tavern.png")
        .await
        .unwrap();

    assert!(t.engine.refresh(t.room, &fp("a")).await.unwrap().is_some());
    let view = t.engine.snapshot(t.room, &fp("a")).await.unwrap();
    assert_eq!(
        view.background_url.as_deref(),
        Some("https://maps.example/tavern.png")
    );
}
