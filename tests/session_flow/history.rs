use crate::session_harness::Harness;
use riddlechat::session::{PersistPolicy, RoomId, SessionState};
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn unfinished_games_are_not_saved_by_default() {
    let harness = Harness::start().await;
    harness.reply(11, "开始", "欢迎").await;

    harness.controller.open_room(RoomId(11));
    harness.controller.start_game(RoomId(11)).await.unwrap();

    assert!(harness.controller.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn every_turn_policy_lets_a_game_resume_after_restart() {
    let harness = Harness::start_with(|config| {
        config.session.persist_policy = PersistPolicy::EveryTurn;
    })
    .await;
    harness.reply(11, "开始", "欢迎").await;
    harness.reply(11, "是水吗？", "答对了").await;

    let room = RoomId(11);
    harness.controller.open_room(room);
    harness.controller.start_game(room).await.unwrap();

    let restarted = harness.restart().await;
    assert_eq!(
        restarted.resume_room(room).await.unwrap(),
        Some(SessionState::Active)
    );
    restarted.submit_turn(room, "是水吗？").await.unwrap();

    let sequences: Vec<u64> = restarted
        .messages(room)
        .unwrap()
        .iter()
        .map(|m| m.sequence)
        .collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
    assert_eq!(restarted.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn oldest_games_are_evicted_past_the_limit() {
    let harness = Harness::start_with(|config| config.store.max_sessions = 2).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("游戏已结束"))
        .mount(&harness.server)
        .await;

    for id in [1, 2, 3] {
        harness.controller.open_room(RoomId(id));
        harness.controller.start_game(RoomId(id)).await.unwrap();
    }

    let ids: Vec<RoomId> = harness
        .controller
        .history()
        .await
        .unwrap()
        .iter()
        .map(|summary| summary.id)
        .collect();
    assert_eq!(ids, vec![RoomId(3), RoomId(2)]);
    assert!(
        harness
            .controller
            .store()
            .load_session(RoomId(1))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn clearing_history_empties_the_index() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("游戏已结束"))
        .mount(&harness.server)
        .await;

    harness.controller.open_room(RoomId(1));
    harness.controller.start_game(RoomId(1)).await.unwrap();
    assert_eq!(harness.controller.history().await.unwrap().len(), 1);

    harness.controller.store().clear().await.unwrap();
    assert!(harness.restart().await.history().await.unwrap().is_empty());
}
