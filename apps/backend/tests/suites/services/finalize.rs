use std::collections::BTreeMap;

use cah_backend::chain::{Delegation, GameStatus};
use cah_backend::domain::seed_derivation::score_push_request_id;
use cah_backend::domain::{Phase, PlayerId};
use cah_backend::services::finalize::{FinalizeInput, ScoresInput};
use cah_backend::{ErrorCode, GameId};

use crate::support::fake_chain::{FakeChain, CHAIN_ID};
use crate::support::{TestWorld, CONTRACT};

fn list_input(game_id: u64, players: &[PlayerId], scores: &[u32]) -> FinalizeInput {
    FinalizeInput {
        game_id: GameId(game_id),
        players: Some(players.to_vec()),
        scores: Some(ScoresInput::List(scores.to_vec())),
        round_count: None,
    }
}

#[tokio::test]
async fn finalizes_and_pushes_scores() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(3);
    world.chain.delegate_all(game_id, &players);

    let outcome = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[3, 5, 2]), world.clock.as_ref())
        .await
        .unwrap();

    assert!(outcome.ok && outcome.finalized && outcome.pushed);
    assert_eq!(outcome.winners, vec![players[1].clone()]);
    assert_eq!(outcome.scores, vec![3, 5, 2]);
    assert_eq!(outcome.tx_hashes.len(), 2);
    assert!(outcome.warning.is_none());
    assert_eq!(
        outcome.request_id,
        score_push_request_id(CHAIN_ID, CONTRACT, game_id, &players, &[3, 5, 2])
    );

    let finalized = world.chain.finalized();
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0].round_count, 10);
    assert_eq!(finalized[0].nonce, 0);
    assert_eq!(finalized[0].deadline, 0);
    assert_eq!(world.chain.pushed()[0].request_id, outcome.request_id);
}

#[tokio::test]
async fn ledger_roster_order_wins_over_submitted_order() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(3);
    world.chain.delegate_all(game_id, &players);

    // submitted out of order, one player missing entirely
    let by_player: BTreeMap<PlayerId, u32> =
        [(players[2].clone(), 4), (players[0].clone(), 4)].into_iter().collect();
    let input = FinalizeInput {
        game_id: GameId(game_id),
        players: None,
        scores: Some(ScoresInput::ByPlayer(by_player)),
        round_count: Some(7),
    };

    let outcome = world
        .orchestrator()
        .finalize(input, world.clock.as_ref())
        .await
        .unwrap();

    assert_eq!(outcome.players, players);
    assert_eq!(outcome.scores, vec![4, 0, 4]);
    assert_eq!(outcome.winners, vec![players[0].clone(), players[2].clone()]);
    assert_eq!(world.chain.finalized()[0].round_count, 7);
}

#[tokio::test]
async fn empty_ledger_roster_is_refused() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(2);
    world.chain.delegate_all(game_id, &players);
    world.chain.set_players(game_id, &[]);

    let err = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[1, 0]), world.clock.as_ref())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::BadPayload);
    assert_eq!(err.status().as_u16(), 400);
    assert!(err.detail().contains("no players on-chain"));
    assert!(world.chain.finalized().is_empty());
    assert!(world.chain.pushed().is_empty());
}

#[tokio::test]
async fn missing_delegations_are_listed() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(3);
    world.chain.delegate_all(game_id, &players[..1]);
    // expired long ago
    world.chain.set_delegation(
        game_id,
        &players[1],
        Delegation {
            delegate: Some(FakeChain::relayer()),
            expiry: 1,
        },
    );

    let err = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[1, 1, 1]), world.clock.as_ref())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::MissingDelegates);
    assert_eq!(err.status().as_u16(), 400);
    let detail = err.detail();
    assert!(detail.contains(players[1].as_str()));
    assert!(detail.contains(players[2].as_str()));
    assert!(!detail.contains(players[0].as_str()));
    assert!(detail.contains(FakeChain::relayer().as_str()));
    assert!(world.chain.finalized().is_empty());
}

#[tokio::test]
async fn failed_finalize_continues_only_if_already_finished() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(2);
    world.chain.delegate_all(game_id, &players);
    world.chain.set_finalize_fails(true);

    let err = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[1, 0]), world.clock.as_ref())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LedgerFailure);
    assert!(world.chain.pushed().is_empty());

    world.chain.set_status(game_id, GameStatus::Finished);
    let outcome = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[1, 0]), world.clock.as_ref())
        .await
        .unwrap();
    assert!(!outcome.finalized);
    assert!(outcome.pushed);
    assert_eq!(outcome.tx_hashes.len(), 1);
}

#[tokio::test]
async fn push_failure_is_a_soft_success() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(2);
    world.chain.delegate_all(game_id, &players);
    world.chain.set_push_fails(true);

    let outcome = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[0, 2]), world.clock.as_ref())
        .await
        .unwrap();

    assert!(outcome.ok);
    assert!(outcome.finalized);
    assert!(!outcome.pushed);
    assert!(outcome.warning.unwrap().contains("score push failed"));
}

#[tokio::test]
async fn relayer_without_submitter_role_is_refused() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(2);
    world.chain.delegate_all(game_id, &players);
    world.chain.set_submitter_role(Some(false));

    let err = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[0, 2]), world.clock.as_ref())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LedgerFailure);
    assert!(world.chain.pushed().is_empty());

    // contracts without a role check are fine
    world.chain.set_submitter_role(None);
    let outcome = world
        .orchestrator()
        .finalize(list_input(game_id, &players, &[0, 2]), world.clock.as_ref())
        .await
        .unwrap();
    assert!(outcome.pushed);
}

#[tokio::test]
async fn scores_default_to_the_stored_ended_match() {
    let world = TestWorld::new().await;
    let (game_id, players) = world.started_game(3);
    world.chain.delegate_all(game_id, &players);
    let input = || FinalizeInput {
        game_id: GameId(game_id),
        players: None,
        scores: None,
        round_count: None,
    };

    let err = world
        .orchestrator()
        .finalize(input(), world.clock.as_ref())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MatchNotFound);

    world
        .coordinator()
        .observe(game_id, None, world.clock.as_ref())
        .await
        .unwrap();
    let err = world
        .orchestrator()
        .finalize(input(), world.clock.as_ref())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MatchNotEnded);
    assert_eq!(err.status().as_u16(), 409);

    let mut m = world.stored(game_id).await.unwrap();
    m.phase = Phase::Ended;
    m.scores.insert(players[1].clone(), 6);
    m.scores.insert(players[2].clone(), 4);
    world.put(game_id, &m).await;

    let outcome = world
        .orchestrator()
        .finalize(input(), world.clock.as_ref())
        .await
        .unwrap();
    assert_eq!(outcome.scores, vec![0, 6, 4]);
    assert_eq!(outcome.winners, vec![players[1].clone()]);
    assert_eq!(world.chain.finalized()[0].round_count, m.rounds_total);
}
