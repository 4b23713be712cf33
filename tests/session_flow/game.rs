use crate::session_harness::Harness;
use riddlechat::TurnOutcome;
use riddlechat::session::{MessageRole, RoomId, SessionState};

#[tokio::test]
async fn full_game_is_saved_and_survives_restart() {
    let harness = Harness::start().await;
    harness
        .reply(123_456, "开始", "欢迎！第一题：什么东西越洗越脏？")
        .await;
    harness.reply(123_456, "是水吗？", "答对了！").await;
    harness
        .reply(123_456, "结束", "本轮得分 1 分。游戏已结束")
        .await;

    let controller = &harness.controller;
    let room = RoomId(123_456);
    assert_eq!(controller.open_room(room), SessionState::NotStarted);

    let outcome = controller.start_game(room).await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Replied {
            reply: "欢迎！第一题：什么东西越洗越脏？".into(),
            ended: false,
        }
    );
    assert_eq!(controller.state(room), Some(SessionState::Active));

    controller.submit_turn(room, "是水吗？").await.unwrap();
    let outcome = controller.end_game(room).await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Replied { ended: true, .. }));
    assert_eq!(controller.state(room), Some(SessionState::Ended));

    let messages = controller.messages(room).unwrap();
    let sequences: Vec<u64> = messages.iter().map(|m| m.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
    let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Ai,
            MessageRole::User,
            MessageRole::Ai,
            MessageRole::User,
            MessageRole::Ai,
        ]
    );

    let restarted = harness.restart().await;
    let index = restarted.history().await.unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].id, room);
    assert!(index[0].title.starts_with("对话 "));

    let saved = restarted.store().load_session(room).await.unwrap().unwrap();
    assert_eq!(saved.state, SessionState::Ended);
    assert_eq!(saved.messages, messages);

    assert_eq!(
        restarted.resume_room(room).await.unwrap(),
        Some(SessionState::Ended)
    );
}

#[tokio::test]
async fn rooms_do_not_see_each_other() {
    let harness = Harness::start().await;
    harness.reply(1, "开始", "room one").await;
    harness.reply(2, "开始", "room two").await;

    let controller = &harness.controller;
    controller.open_room(RoomId(1));
    controller.open_room(RoomId(2));

    let (one, two) = tokio::join!(
        controller.start_game(RoomId(1)),
        controller.start_game(RoomId(2))
    );
    assert!(matches!(one.unwrap(), TurnOutcome::Replied { ref reply, .. } if reply == "room one"));
    assert!(matches!(two.unwrap(), TurnOutcome::Replied { ref reply, .. } if reply == "room two"));

    assert_eq!(controller.messages(RoomId(1)).unwrap()[1].content, "room one");
    assert_eq!(controller.messages(RoomId(2)).unwrap()[1].content, "room two");
}

#[tokio::test]
async fn remote_room_list_comes_from_the_service() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"roomId": 5, "chatMessage": []}, {"id": 9, "name": "speed round"}]"#,
        ))
        .expect(1)
        .mount(&harness.server)
        .await;

    let rooms = harness.controller.remote_rooms().await.unwrap();
    let mut ids: Vec<u64> = rooms.iter().map(|room| room.id.0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![5, 9]);
}
