use std::collections::BTreeMap;

use crate::domain::dealing::{
    after_round_draw_up, build_answer_deck, build_prompt_order, deal_initial_hands, draw_one,
};
use crate::domain::rng::DetRng;
use crate::domain::test_state_helpers::*;

#[test]
fn answer_deck_uses_whole_catalog_copies() {
    let answers = [5, 6, 7, 8, 9];
    let deck = build_answer_deck(&answers, 12, &mut DetRng::from_hex("0x1234"));
    assert_eq!(deck.len(), 15);

    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for card in &deck {
        *counts.entry(*card).or_default() += 1;
    }
    assert!(counts.values().all(|&c| c == 3));

    assert!(build_answer_deck(&[], 12, &mut DetRng::from_hex("0x1")).is_empty());
    assert_eq!(build_answer_deck(&answers, 0, &mut DetRng::from_hex("0x1")).len(), 5);
}

#[test]
fn prompt_and_deck_share_one_stream() {
    let prompts: Vec<u64> = (1..=20).collect();
    let answers: Vec<u64> = (100..140).collect();

    let mut rng = DetRng::from_hex("0xabcdef");
    let order = build_prompt_order(&prompts, &mut rng);
    let deck = build_answer_deck(&answers, 30, &mut rng);

    let mut fresh = DetRng::from_hex("0xabcdef");
    let _ = build_prompt_order(&prompts, &mut fresh);
    assert_eq!(build_answer_deck(&answers, 30, &mut fresh), deck);

    // Skipping the prompt shuffle yields a different deck.
    let unshared = build_answer_deck(&answers, 30, &mut DetRng::from_hex("0xabcdef"));
    assert_ne!(unshared, deck);
    assert_eq!(order.len(), 20);
}

#[test]
fn draw_skips_cards_already_seen() {
    let rm = machine();
    let p = player(1);
    let mut m = rm.shell("0x01".into(), vec![p.clone()], T0);
    m.answers_deck = vec![1, 2, 3];
    m.seen_answers.insert(p.clone(), vec![1, 2]);

    assert_eq!(draw_one(&mut m, &p), Some(3));
    assert_eq!(m.draw_ptr, 3);
}

#[test]
fn exhausted_pool_falls_back_to_repeats() {
    let rm = machine();
    let p = player(1);
    let mut m = rm.shell("0x01".into(), vec![p.clone()], T0);
    m.answers_deck = vec![1, 2, 3];
    m.seen_answers.insert(p.clone(), vec![1, 2, 3]);

    assert_eq!(draw_one(&mut m, &p), Some(1));
    assert_eq!(m.draw_ptr, 4);
    assert_eq!(draw_one(&mut m, &p), Some(2));
}

#[test]
fn empty_deck_draws_nothing() {
    let rm = machine();
    let p = player(1);
    let mut m = rm.shell("0x01".into(), vec![p.clone()], T0);
    assert_eq!(draw_one(&mut m, &p), None);
    assert_eq!(m.draw_ptr, 0);

    deal_initial_hands(&mut m);
    assert!(m.hand(&p).is_empty());
}

#[test]
fn draw_up_touches_only_submitters() {
    let rm = machine();
    let mut m = rm.new_match(setup_for(2, 3, 10, 100), T0).unwrap();
    let p2 = player(2);
    let played = m.hand(&p2)[3];
    m.submissions.insert(p2.clone(), played);
    let p3_hand = m.hand(&player(3)).to_vec();
    let ptr = m.draw_ptr;

    after_round_draw_up(&mut m);

    assert!(!m.hand(&p2).contains(&played));
    assert_eq!(m.hand(&p2).len(), 7);
    assert_eq!(m.hand(&player(3)), p3_hand.as_slice());
    assert_eq!(m.draw_ptr, ptr + 1);
}

#[test]
fn draw_up_follows_roster_order_and_skips_departed_players() {
    let rm = machine();
    let (p1, p2, p3, gone) = (player(1), player(2), player(3), player(4));
    let mut m = rm.shell("0x01".into(), vec![p3.clone(), p2.clone(), p1.clone()], T0);
    m.judge = Some(p1.clone());
    m.answers_deck = vec![10, 11, 12, 13];
    m.hands.insert(p3.clone(), vec![3]);
    m.hands.insert(p2.clone(), vec![2]);
    m.hands.insert(gone.clone(), vec![4]);
    m.submissions.insert(p2.clone(), 2);
    m.submissions.insert(p3.clone(), 3);
    m.submissions.insert(gone.clone(), 4);

    after_round_draw_up(&mut m);

    assert_eq!(m.hand(&p3), &[10]);
    assert_eq!(m.hand(&p2), &[11]);
    assert_eq!(m.hand(&gone), &[4]);
    assert_eq!(m.draw_ptr, 2);
}
