use crate::session_harness::Harness;
use riddlechat::TurnOutcome;
use riddlechat::session::{MessageRole, RoomId, SessionState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const FAILURE: &str = "抱歉，发送消息失败，请重试";

#[tokio::test]
async fn server_errors_are_retried_until_the_host_answers() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/7/chat"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&harness.server)
        .await;
    harness.reply(7, "开始", "欢迎").await;

    let room = RoomId(7);
    harness.controller.open_room(room);
    let outcome = harness.controller.start_game(room).await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Replied { ref reply, .. } if reply == "欢迎"));
    assert_eq!(harness.controller.messages(room).unwrap().len(), 2);
}

#[tokio::test]
async fn client_errors_fail_after_a_single_attempt() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/7/chat"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&harness.server)
        .await;

    let room = RoomId(7);
    harness.controller.open_room(room);
    let outcome = harness.controller.start_game(room).await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
}

#[tokio::test]
async fn exhausted_retries_leave_a_failure_message() {
    let harness = Harness::start_with(|config| config.retry.max_attempts = 4).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&harness.server)
        .await;

    let room = RoomId(7);
    harness.controller.open_room(room);
    let outcome = harness.controller.start_game(room).await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));

    let messages = harness.controller.messages(room).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "开始");
    assert_eq!(messages[1].role, MessageRole::Ai);
    assert_eq!(messages[1].content, FAILURE);
    // A failed opening turn does not start the game.
    assert_eq!(harness.controller.state(room), Some(SessionState::NotStarted));
}

#[tokio::test]
async fn unreachable_service_is_reported_as_failure() {
    let harness = Harness::start_with(|config| {
        config.transport.base_url = "http://127.0.0.1:9".into();
        config.retry.max_attempts = 2;
    })
    .await;

    let room = RoomId(3);
    harness.controller.open_room(room);
    let outcome = harness.controller.start_game(room).await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
    assert!(!harness.controller.is_in_flight(room));
}
