use std::collections::BTreeSet;

use crate::domain::round_machine::PlayerAction;
use crate::domain::rules::HAND_SIZE;
use crate::domain::state::{Phase, PlayerId};
use crate::domain::test_state_helpers::*;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, ValidationKind};

fn kind_of(err: DomainError) -> ValidationKind {
    match err {
        DomainError::Validation(kind, _) => kind,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn new_match_starts_in_prestart_with_dealt_hands() {
    let rm = machine();
    let m = rm.new_match(setup_for(1, 4, 50, 400), T0).unwrap();

    assert_eq!(m.round, 1);
    assert_eq!(m.rounds_total, 10);
    assert_eq!(m.phase, Phase::Prestart { prestart_until: T0 + 10_000 });
    assert_eq!(m.judge, Some(player(1)));
    assert_eq!(m.prompt_id, Some(m.prompt_order[0]));
    assert_eq!(m.prompt_order.len(), 50);
    assert!(m.answers_deck.len() >= 4 * HAND_SIZE + 10 * 3);
    assert_eq!(m.started_at, T0);

    for p in &m.players {
        let hand = m.hand(p);
        assert_eq!(hand.len(), HAND_SIZE);
        let unique: BTreeSet<_> = hand.iter().collect();
        assert_eq!(unique.len(), HAND_SIZE, "duplicate in {p}'s hand");
        assert_eq!(m.seen_answers[p], hand.to_vec());
        assert_eq!(m.scores[p], 0);
    }
}

#[test]
fn new_match_is_deterministic_for_a_seed() {
    let rm = machine();
    let a = rm.new_match(setup_for(7, 5, 30, 120), T0).unwrap();
    let b = rm.new_match(setup_for(7, 5, 30, 120), T0).unwrap();
    assert_eq!(a, b);

    let c = rm.new_match(setup_for(8, 5, 30, 120), T0).unwrap();
    assert_ne!(a.prompt_order, c.prompt_order);
}

#[test]
fn new_match_refuses_empty_catalogs() {
    let rm = machine();
    let err = rm.new_match(setup_for(1, 3, 0, 100), T0).unwrap_err();
    assert!(matches!(err, DomainError::Infra(InfraErrorKind::EmptyCatalog, _)));

    let err = rm.new_match(setup_for(1, 3, 10, 0), T0).unwrap_err();
    assert!(matches!(err, DomainError::Infra(InfraErrorKind::EmptyCatalog, _)));
}

#[test]
fn prestart_waits_for_its_deadline() {
    let rm = machine();
    let mut m = rm.new_match(setup_for(1, 3, 50, 400), T0).unwrap();

    assert!(!rm.tick(&mut m, T0 + 9_999));
    assert!(matches!(m.phase, Phase::Prestart { .. }));

    assert!(rm.tick(&mut m, T0 + 10_000));
    assert_eq!(
        m.phase,
        Phase::Submit {
            submit_deadline: T0 + 10_000 + 45_000
        }
    );
    assert!(m.submissions.is_empty());
}

#[test]
fn last_submission_moves_straight_to_judge() {
    let rm = machine();
    let (mut m, now) = match_in_submit(&rm, 3);

    let p2 = player(2);
    let card = m.hand(&p2)[0];
    rm.submit(&mut m, &p2, card, now).unwrap();
    assert!(matches!(m.phase, Phase::Submit { .. }));

    let p3 = player(3);
    let card = m.hand(&p3)[2];
    rm.submit(&mut m, &p3, card, now + 5).unwrap();
    assert_eq!(
        m.phase,
        Phase::Judge {
            judge_deadline: now + 5 + 30_000
        }
    );
}

#[test]
fn straggler_is_auto_submitted_from_own_hand_after_deadline() {
    let rm = machine();
    let (mut m, now) = match_in_submit(&rm, 4);
    let absent = player(4);
    submit_all_except(&rm, &mut m, std::slice::from_ref(&absent), now);

    let deadline = m.phase.deadline().unwrap();
    assert!(!rm.tick(&mut m, deadline - 1));
    assert!(!m.submissions.contains_key(&absent));

    let before = m.clone();
    assert!(rm.tick(&mut m, deadline));
    assert!(matches!(m.phase, Phase::Judge { .. }));
    let picked = m.submissions[&absent];
    assert!(before.hand(&absent).contains(&picked));
    assert_eq!(m.submissions.len(), 3);

    // Another request racing from the same stale read reaches the same record.
    let mut racer = before.clone();
    assert!(rm.tick(&mut racer, deadline));
    assert_eq!(racer, m);
}

#[test]
fn submit_rejections_leave_record_untouched() {
    let rm = machine();
    let (mut m, now) = match_in_submit(&rm, 3);
    let p2 = player(2);
    let first = m.hand(&p2)[0];
    let second = m.hand(&p2)[1];
    rm.submit(&mut m, &p2, first, now).unwrap();
    let snapshot = m.clone();

    let err = rm.submit(&mut m, &p2, second, now).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Conflict(ConflictKind::AlreadySubmitted, _)
    ));
    assert_eq!(m.submissions[&p2], first);

    let judge = player(1);
    let judge_card = m.hand(&judge)[0];
    let err = rm.submit(&mut m, &judge, judge_card, now).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::JudgeCannotSubmit);

    let p3 = player(3);
    let err = rm.submit(&mut m, &p3, 999_999, now).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::CardNotInHand);

    let outsider = player(77);
    let err = rm.submit(&mut m, &outsider, first, now).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::NotAMember);

    assert_eq!(m, snapshot);
}

#[test]
fn wrong_phase_reports_current_phase() {
    let rm = machine();
    let mut m = rm.new_match(setup_for(1, 3, 50, 400), T0).unwrap();
    let p2 = player(2);
    let card = m.hand(&p2)[0];

    match rm.submit(&mut m, &p2, card, T0).unwrap_err() {
        DomainError::Validation(ValidationKind::PhaseMismatch, msg) => {
            assert_eq!(msg, "phase=prestart")
        }
        other => panic!("unexpected {other:?}"),
    }

    let err = rm.judge_pick(&mut m, &player(1), &p2, T0).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::PhaseMismatch);
}

#[test]
fn judge_pick_validates_actor_and_winner() {
    let rm = machine();
    let (mut m, now) = match_in_submit(&rm, 4);
    submit_all_except(&rm, &mut m, &[player(4)], now);
    let deadline = m.phase.deadline().unwrap();
    // p4 is auto-submitted, so hand-craft a missing entry for the no-submission case.
    rm.tick(&mut m, deadline);
    m.submissions.remove(&player(4));
    let snapshot = m.clone();

    let err = rm.judge_pick(&mut m, &player(2), &player(3), now).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::NotJudge);

    let err = rm.judge_pick(&mut m, &player(1), &player(50), now).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::UnknownPlayer);

    let err = rm.judge_pick(&mut m, &player(1), &player(4), now).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::NoSubmission);

    let err = rm.judge_pick(&mut m, &player(1), &player(1), now).unwrap_err();
    assert_eq!(kind_of(err), ValidationKind::NoSubmission);

    assert_eq!(m, snapshot);
}

#[test]
fn judge_pick_scores_and_draws_up() {
    let rm = machine();
    let (mut m, now) = match_in_judge(&rm, 4);
    let winner = player(3);
    let played = m.submissions[&winner];
    let seen_before = m.seen_answers[&winner].clone();
    let judge_hand = m.hand(&player(1)).to_vec();

    rm.apply(
        &mut m,
        &player(1),
        &PlayerAction::JudgePick {
            winner: winner.clone(),
        },
        now + 100,
    )
    .unwrap();

    assert_eq!(m.scores[&winner], 1);
    assert_eq!(m.scores.values().sum::<u32>(), 1);
    assert_eq!(
        m.phase,
        Phase::Summary {
            summary_until: now + 100 + 6_000
        }
    );
    let last = m.last.clone().unwrap();
    assert_eq!(last.round, 1);
    assert_eq!(last.winner, Some(winner.clone()));
    assert_eq!(last.winning_answer_id, Some(played));
    assert_eq!(last.completed_at, now + 100);

    let hand = m.hand(&winner);
    assert_eq!(hand.len(), HAND_SIZE);
    assert!(!hand.contains(&played));
    let fresh = *hand.last().unwrap();
    assert!(!seen_before.contains(&fresh));
    assert_eq!(m.seen_answers[&winner].len(), seen_before.len() + 1);

    // Every submitter draws, the judge does not.
    for p in [player(2), player(4)] {
        assert_eq!(m.hand(&p).len(), HAND_SIZE);
        assert_eq!(m.seen_answers[&p].len(), HAND_SIZE + 1);
    }
    assert_eq!(m.hand(&player(1)), judge_hand.as_slice());
}

#[test]
fn judge_timeout_auto_picks_a_submitter() {
    let rm = machine();
    let (mut m, _) = match_in_judge(&rm, 5);
    let deadline = m.phase.deadline().unwrap();
    let before = m.clone();

    assert!(!rm.tick(&mut m, deadline - 1));
    assert!(rm.tick(&mut m, deadline));

    let winner = m.last.as_ref().and_then(|l| l.winner.clone()).unwrap();
    assert!(before.submissions.contains_key(&winner));
    assert_eq!(m.scores[&winner], 1);

    let mut again = before.clone();
    rm.tick(&mut again, deadline);
    assert_eq!(again, m);
}

#[test]
fn round_without_submissions_has_no_winner() {
    let rm = machine();
    // A lone player is always the judge, so nobody can submit.
    let mut m = rm.new_match(setup_for(3, 1, 10, 20), T0).unwrap();
    let mut now = m.phase.deadline().unwrap();
    assert!(rm.tick(&mut m, now));
    assert!(rm.tick(&mut m, now));
    assert!(matches!(m.phase, Phase::Judge { .. }));
    assert!(m.submissions.is_empty());

    now = m.phase.deadline().unwrap();
    assert!(rm.tick(&mut m, now));
    assert!(matches!(m.phase, Phase::Summary { .. }));
    let last = m.last.clone().unwrap();
    assert_eq!(last.winner, None);
    assert_eq!(last.winning_answer_id, None);
    assert_eq!(m.scores[&player(1)], 0);
}

#[test]
fn summary_rotates_into_next_round() {
    let rm = machine();
    let (mut m, now) = match_in_judge(&rm, 3);
    rm.judge_pick(&mut m, &player(1), &player(2), now).unwrap();
    let until = m.phase.deadline().unwrap();

    assert!(!rm.tick(&mut m, until - 1));
    assert!(rm.tick(&mut m, until));

    assert_eq!(m.round, 2);
    assert_eq!(m.judge, Some(player(2)));
    assert_eq!(m.prompt_id, Some(m.prompt_order[1]));
    assert!(m.submissions.is_empty());
    assert_eq!(
        m.phase,
        Phase::Submit {
            submit_deadline: until + 45_000
        }
    );
}

#[test]
fn final_summary_ends_the_match() {
    let rm = machine();
    let (mut m, now) = match_in_judge(&rm, 3);
    m.round = m.rounds_total;
    m.judge = Some(player(1));
    rm.judge_pick(&mut m, &player(1), &player(3), now).unwrap();
    let until = m.phase.deadline().unwrap();

    assert!(rm.tick(&mut m, until));
    assert_eq!(m.phase, Phase::Ended);
    assert_eq!(m.phase.deadline(), None);
    assert_eq!(m.round, m.rounds_total);

    let ended = m.clone();
    assert!(!rm.tick(&mut m, until + 86_400_000));
    assert_eq!(m, ended);
}

#[test]
fn repeated_tick_without_time_passing_is_a_noop() {
    let rm = machine();
    let (mut m, now) = match_in_submit(&rm, 4);
    submit_all_except(&rm, &mut m, &[], now);
    let settled = m.clone();

    assert!(!rm.tick(&mut m, now));
    assert!(!rm.tick(&mut m, now));
    assert_eq!(m, settled);
}

#[test]
fn full_match_with_only_timeouts_reaches_ended() {
    let rm = machine();
    let mut m = rm.new_match(setup_for(11, 4, 12, 60), T0).unwrap();
    let mut now = T0;
    let mut guard = 0;
    while !m.phase.is_ended() {
        now = m.phase.deadline().unwrap_or(now);
        rm.tick(&mut m, now);
        guard += 1;
        assert!(guard < 100, "match did not end");
    }

    assert_eq!(m.round, 10);
    assert_eq!(m.scores.values().sum::<u32>(), 10);
    let players: Vec<PlayerId> = m.players.clone();
    for p in &players {
        assert_eq!(m.hand(p).len(), HAND_SIZE);
    }
}
