mod support;

use platform_racer::domain::tuning::world::{GOAL_POSITION, SPAWN_POINT};
use platform_racer::domain::{MovementState, RoundState, Vec2, ViewId};
use platform_racer::interface_adapters::bus::{decode_model_event, decode_snapshot, encode_snapshot};
use platform_racer::use_cases::{ModelEvent, PlayerMove, Replica, ViewEvent};
use std::time::Duration;
use support::Session;

fn join(id: &str) -> ViewEvent {
    ViewEvent::ViewJoin {
        view_id: ViewId::from(id),
    }
}

fn goal(id: &str) -> ViewEvent {
    ViewEvent::GoalReached {
        player_id: ViewId::from(id),
    }
}

fn move_to(id: &str, x: f32, y: f32) -> ViewEvent {
    ViewEvent::PlayerMoved(PlayerMove {
        player_id: ViewId::from(id),
        position: Vec2::new(x, y),
        velocity: Vec2::new(0.0, -300.0),
        movement_state: MovementState::Jumping,
        facing_left: false,
    })
}

#[test]
fn when_first_player_reaches_goal_then_round_ends_and_resets_for_everyone() {
    let mut session = Session::new(5, 3);
    session.at(0).send(join("A")).send(join("B"));
    session.at(300).send(move_to("A", GOAL_POSITION.x, GOAL_POSITION.y));
    session.at(1000).send(goal("A"));
    session.at(1100).send(goal("B"));

    let model = session.replicas[0].model();
    assert_eq!(
        model.round(),
        &RoundState::Over {
            winner_id: ViewId::from("A")
        }
    );
    assert_eq!(model.player(&ViewId::from("A")).map(|p| p.score), Some(1));
    assert_eq!(model.player(&ViewId::from("B")).map(|p| p.score), Some(0));

    let game_over: Vec<_> = session
        .drain(0)
        .into_iter()
        .filter(|e| matches!(e, ModelEvent::GameOver { .. }))
        .collect();
    assert_eq!(
        game_over,
        vec![ModelEvent::GameOver {
            winner_id: ViewId::from("A"),
            winner_number: 1,
        }]
    );

    // The reset fires 1500 ms after the winning stamp, on the next stamp past it.
    session.at(2499).heartbeat();
    assert!(session.replicas[0].model().round().is_over());
    session.at(2500).heartbeat();

    let model = session.replicas[0].model();
    assert_eq!(model.round(), &RoundState::Playing);
    assert!(model.players().values().all(|p| p.position == SPAWN_POINT));
    assert_eq!(model.player(&ViewId::from("A")).map(|p| p.score), Some(1));
    assert!(
        session
            .drain(0)
            .iter()
            .any(|e| matches!(e, ModelEvent::GameReset { .. }))
    );
    session.assert_converged();
}

#[test]
fn when_players_leave_and_join_then_numbers_are_not_reused() {
    let mut session = Session::new(5, 2);
    session.at(0).send(join("A")).send(join("B"));
    session.at(40).send(ViewEvent::ViewExit {
        view_id: ViewId::from("A"),
    });
    session.at(80).send(join("C"));

    let model = session.replicas[1].model();
    let numbers: Vec<_> = model
        .players_by_number()
        .iter()
        .map(|p| (p.id.to_string(), p.player_number))
        .collect();
    assert_eq!(numbers, vec![("B".to_string(), 2), ("C".to_string(), 3)]);
    session.assert_converged();
}

#[test]
fn when_payload_cannot_be_decoded_then_every_replica_skips_it_alike() {
    let mut session = Session::new(9, 3);
    session.at(0).send(join("A"));
    session
        .at(120)
        .send_raw(r#"{"type":"warp-drive","data":{}}"#)
        .send_raw("{{{");
    session.at(180).send(goal("A"));

    for replica in &session.replicas {
        assert_eq!(replica.last_seq(), 4);
        assert_eq!(replica.now(), 180);
    }
    assert!(session.replicas[2].model().round().is_over());
    session.assert_converged();
}

#[test]
fn when_late_joiner_restores_a_shipped_snapshot_then_it_converges() {
    let mut session = Session::new(13, 2);
    session.at(0).send(join("A")).send(join("B"));
    session.at(700).send(goal("B"));

    let shipped = encode_snapshot(&session.replicas[0].snapshot()).expect("encode");
    let late = Replica::from_snapshot(decode_snapshot(&shipped).expect("decode"));
    session.replicas.push(late);

    // Pending reset and platform ticks carry over in the snapshot.
    session.at(2300).heartbeat();
    session.at(2400).send(join("C"));

    session.assert_converged();
    let model = session.replicas[2].model();
    assert_eq!(model.round(), &RoundState::Playing);
    assert_eq!(model.players().len(), 3);
}

#[test]
fn when_platforms_tick_then_every_replica_moves_them_identically() {
    let mut session = Session::new(21, 3);
    for step in 1..=40 {
        session.at(step * 37).heartbeat();
    }

    let platforms = session.replicas[0].model().moving_platforms();
    assert_eq!(platforms.len(), 2);
    assert!(platforms.iter().all(|p| p.within_bounds()));
    session.assert_converged();
}

#[tokio::test]
async fn when_session_host_runs_then_all_peers_join_and_replicas_agree() {
    support::init_tracing();
    let settings = support::quick_settings(3, Duration::from_millis(400));

    let report = platform_racer::run(settings).await.expect("session runs");

    assert_eq!(report.peers.len(), 3);
    assert!(report.consistent);
    assert!(report.event_log.lines > 0);
    let last = report.event_log.last.as_deref().expect("observed events logged");
    assert!(decode_model_event(last).is_ok());
    for peer in &report.peers {
        assert!(peer.frames > 0);
        assert!(!peer.exited);
        let model = &peer.snapshot.model;
        assert_eq!(model.players().len(), 3);
        let me = model.player(&peer.view_id).expect("own player replicated");
        assert!(me.username.is_some());
        assert!(me.character_variant.is_some_and(|v| (1..=5).contains(&v)));
    }
}
