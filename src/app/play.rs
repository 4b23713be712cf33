use super::render::{render_banner, render_help, render_message, render_summaries};
use crate::error::SessionError;
use crate::session::{RoomId, SessionController, SessionState, TurnOutcome};
use crate::ui::style as ui;
use anyhow::{Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line typed at the room prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Start,
    End,
    History,
    Help,
    Quit,
    Say(String),
    Unknown(String),
    Empty,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Say(line.to_string());
    };
    match command.to_ascii_lowercase().as_str() {
        "start" => Input::Start,
        "end" => Input::End,
        "history" => Input::History,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    }
}

/// Which room to enter.
#[derive(Debug, Clone, Copy)]
pub enum RoomChoice {
    Random,
    Join(RoomId),
    Resume(RoomId),
}

async fn enter_room(controller: &SessionController, choice: RoomChoice) -> Result<RoomId> {
    match choice {
        RoomChoice::Random => Ok(controller.start_room()),
        RoomChoice::Join(room_id) => {
            controller.open_room(room_id);
            Ok(room_id)
        }
        RoomChoice::Resume(room_id) => match controller.resume_room(room_id).await? {
            Some(_) => Ok(room_id),
            None => bail!("room {room_id} is not in local history"),
        },
    }
}

/// Prints messages that arrived since the last call.
struct Printer {
    room_id: RoomId,
    shown: usize,
}

impl Printer {
    fn flush(&mut self, controller: &SessionController) {
        let messages = controller.messages(self.room_id).unwrap_or_default();
        for message in messages.iter().skip(self.shown) {
            println!("{}", render_message(message));
        }
        self.shown = messages.len();
    }
}

fn report_session_error(err: &SessionError) {
    let hint = match err {
        SessionError::InvalidTransition {
            from: SessionState::NotStarted,
            ..
        } => "Start the game first with /start.",
        SessionError::InvalidTransition {
            from: SessionState::Ended,
            ..
        } => "This game is over.",
        SessionError::InvalidTransition {
            from: SessionState::Active,
            to: SessionState::Active,
        } => "The game has already started.",
        SessionError::TurnInProgress(_) => "Wait for the host to answer.",
        _ => "",
    };
    println!("{} {}", ui::warn(err), ui::dim(hint));
}

/// Interactive loop for one room. Returns when the game ends, the player
/// quits, or stdin closes.
pub async fn run(controller: &SessionController, choice: RoomChoice) -> Result<()> {
    let room_id = enter_room(controller, choice).await?;
    let state = controller.state(room_id).unwrap_or(SessionState::NotStarted);

    println!();
    println!("{}", render_banner(room_id, state));
    println!("{}", ui::dim("Type /start to begin, /help for commands."));
    println!();

    let mut printer = Printer { room_id, shown: 0 };
    printer.flush(controller);

    if state == SessionState::Ended {
        println!("{}", ui::dim("This game is already over."));
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let turn = match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => {
                println!("{}", render_help());
                continue;
            }
            Input::Unknown(command) => {
                println!("{}", ui::warn(format!("Unknown command {command}, try /help")));
                continue;
            }
            Input::History => {
                match controller.history().await {
                    Ok(summaries) => {
                        println!("{}", render_summaries(&summaries, "No saved conversations."));
                    }
                    Err(err) => println!("{}", ui::warn(format!("History unavailable: {err}"))),
                }
                continue;
            }
            Input::Start => controller.start_game(room_id).await,
            Input::End => controller.end_game(room_id).await,
            Input::Say(text) => controller.submit_turn(room_id, &text).await,
        };

        match turn {
            Ok(outcome) => {
                printer.flush(controller);
                match outcome {
                    TurnOutcome::Replied { ended: true, .. } => {
                        println!();
                        println!("{}", ui::header("Game over. The conversation was saved."));
                        break;
                    }
                    TurnOutcome::Failed { error } => {
                        tracing::debug!(room_id = %room_id, "turn failed: {error}");
                    }
                    TurnOutcome::Replied { .. } | TurnOutcome::Discarded => {}
                }
            }
            Err(err) => report_session_error(&err),
        }
    }

    controller.abandon_room(room_id);
    Ok(())
}
