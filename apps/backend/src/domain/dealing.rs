//! Deterministic deck construction and drawing.
//!
//! Prompt order and the answers deck are built once at match creation from the
//! match seed. Draws walk `answers_deck` with `draw_ptr`, skipping cards the
//! player has already seen while any unseen card remains.

use crate::domain::rng::{shuffle, DetRng};
use crate::domain::rules::HAND_SIZE;
use crate::domain::state::{CardId, Match, PlayerId};

/// Shuffled copy of the active prompt ids.
pub fn build_prompt_order(prompt_ids: &[CardId], rng: &mut DetRng) -> Vec<CardId> {
    let mut order = prompt_ids.to_vec();
    shuffle(&mut order, rng);
    order
}

/// Whole copies of `answer_ids` until at least `needed` cards exist, then shuffled.
///
/// Must be called with the same generator that just built the prompt order so
/// every process derives the same deck.
pub fn build_answer_deck(answer_ids: &[CardId], needed: usize, rng: &mut DetRng) -> Vec<CardId> {
    if answer_ids.is_empty() {
        return Vec::new();
    }
    let copies = needed.div_ceil(answer_ids.len()).max(1);
    let mut deck = Vec::with_capacity(copies * answer_ids.len());
    for _ in 0..copies {
        deck.extend_from_slice(answer_ids);
    }
    shuffle(&mut deck, rng);
    deck
}

/// Next card for `player`, preferring cards they have never held.
///
/// Advances `draw_ptr` once per card considered. After a full lap without an
/// unseen card the next card is returned regardless of repeats. `None` only
/// when the deck is empty.
pub fn draw_one(m: &mut Match, player: &PlayerId) -> Option<CardId> {
    let len = m.answers_deck.len() as u64;
    if len == 0 {
        return None;
    }

    let seen = m.seen_answers.get(player);
    for _ in 0..len {
        let card = m.answers_deck[(m.draw_ptr % len) as usize];
        m.draw_ptr += 1;
        if !seen.is_some_and(|s| s.contains(&card)) {
            return Some(card);
        }
    }

    let card = m.answers_deck[(m.draw_ptr % len) as usize];
    m.draw_ptr += 1;
    Some(card)
}

/// Draw one card into `player`'s hand and seen list.
fn draw_into_hand(m: &mut Match, player: &PlayerId) -> Option<CardId> {
    let card = draw_one(m, player)?;
    m.hands.entry(player.clone()).or_default().push(card);
    m.seen_answers.entry(player.clone()).or_default().push(card);
    Some(card)
}

/// Deal `HAND_SIZE` cards to every player, in roster order.
pub fn deal_initial_hands(m: &mut Match) {
    let players = m.players.clone();
    for player in &players {
        m.hands.insert(player.clone(), Vec::with_capacity(HAND_SIZE));
        m.seen_answers.insert(player.clone(), Vec::new());
        for _ in 0..HAND_SIZE {
            if draw_into_hand(m, player).is_none() {
                break;
            }
        }
    }
}

/// Replace every submitted card with exactly one fresh draw.
///
/// Draws go in roster order. Submissions from players no longer on the roster
/// are ignored; the judge never submits.
pub fn after_round_draw_up(m: &mut Match) {
    let submitted: Vec<(PlayerId, CardId)> = m
        .players
        .iter()
        .filter(|player| !m.is_judge(player))
        .filter_map(|player| m.submissions.get(player).map(|card| (player.clone(), *card)))
        .collect();

    for (player, card) in submitted {
        if let Some(hand) = m.hands.get_mut(&player) {
            if let Some(pos) = hand.iter().position(|c| *c == card) {
                hand.remove(pos);
            }
        }
        draw_into_hand(m, &player);
    }
}
