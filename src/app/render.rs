use crate::session::{Message, MessageRole, RoomId, RoomSummary, SessionState};
use crate::ui::style as ui;
use chrono::Local;

pub fn render_banner(room_id: RoomId, state: SessionState) -> String {
    format!(
        "{} {}  {}",
        ui::header("◆ 房间"),
        ui::value(room_id),
        ui::dim(format!("[{state}]"))
    )
}

pub fn render_message(message: &Message) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let speaker = match message.role {
        MessageRole::User => ui::user("你"),
        MessageRole::Ai => ui::host("主持人"),
    };
    format!("{} {speaker}: {}", ui::dim(time), message.content)
}

pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per room, most recent first as given.
pub fn render_summaries(summaries: &[RoomSummary], empty: &str) -> String {
    if summaries.is_empty() {
        return ui::dim(empty);
    }
    summaries
        .iter()
        .map(|summary| {
            format!(
                "  {:>7}  {}  {}",
                ui::value(summary.id),
                summary.title,
                ui::dim(
                    summary
                        .timestamp
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                )
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_help() -> String {
    [
        ui::header("Commands"),
        format!("  {}    ask the host to start the game", ui::value("/start")),
        format!("  {}      ask the host to end the game", ui::value("/end")),
        format!("  {}  list saved conversations", ui::value("/history")),
        format!("  {}     leave the room", ui::value("/quit")),
        ui::dim("  Anything else is sent to the host as your turn."),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(role: MessageRole, content: &str) -> Message {
        Message {
            role,
            content: content.into(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            sequence: 1,
        }
    }

    #[test]
    fn messages_name_the_speaker() {
        let user = render_message(&message(MessageRole::User, "开始"));
        assert!(user.contains('你'));
        assert!(user.contains("开始"));

        let host = render_message(&message(MessageRole::Ai, "第一题"));
        assert!(host.contains("主持人"));
        assert!(host.contains("第一题"));
    }

    #[test]
    fn transcript_keeps_message_order() {
        let transcript = render_transcript(&[
            message(MessageRole::User, "first"),
            message(MessageRole::Ai, "second"),
        ]);
        let first = transcript.find("first").unwrap();
        let second = transcript.find("second").unwrap();
        assert!(first < second);
        assert_eq!(transcript.lines().count(), 2);
    }

    #[test]
    fn empty_summary_list_shows_placeholder() {
        assert!(render_summaries(&[], "nothing saved").contains("nothing saved"));
    }

    #[test]
    fn summaries_render_one_line_each() {
        let summaries = vec![
            RoomSummary {
                id: RoomId(7),
                title: "对话 10:00:00".into(),
                timestamp: Utc::now(),
            },
            RoomSummary {
                id: RoomId(8),
                title: "对话 09:00:00".into(),
                timestamp: Utc::now(),
            },
        ];
        let rendered = render_summaries(&summaries, "none");
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.contains("对话 10:00:00"));
    }

    #[test]
    fn banner_shows_room_and_state() {
        let banner = render_banner(RoomId(4242), SessionState::NotStarted);
        assert!(banner.contains("4242"));
        assert!(banner.contains("not_started"));
    }
}
