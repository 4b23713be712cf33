use super::play::{self, RoomChoice};
use super::render::{render_banner, render_summaries, render_transcript};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::RiddleError;
use crate::persistence::SqliteKv;
use crate::session::{RoomId, SessionController, SessionStore};
use crate::transport::{HttpTransport, ReliableTransport};
use crate::ui::style as ui;
use anyhow::{Result, bail};
use std::sync::Arc;

/// Wire the HTTP transport, retry layer and SQLite-backed history into a
/// controller.
pub async fn build_controller(config: &Config) -> Result<SessionController, RiddleError> {
    let backend = SqliteKv::open(&config.history_db_path()).await?;
    let store = SessionStore::new(Arc::new(backend)).with_max_sessions(config.store.max_sessions);

    let http = HttpTransport::new(
        &config.transport.base_url,
        config.request_timeout(),
        config.connect_timeout(),
    )?;
    let transport = ReliableTransport::new(Box::new(http), config.retry_policy());

    tracing::debug!(
        base_url = %config.transport.base_url,
        store = store.backend_name(),
        policy = %config.session.persist_policy,
        "controller ready"
    );

    Ok(SessionController::new(
        Arc::new(transport),
        Arc::new(store),
        config.controller_config(),
    ))
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let controller = build_controller(&config).await?;

    match cli.command {
        Commands::Play { room, resume } => {
            let choice = match (room, resume) {
                (Some(id), true) => RoomChoice::Resume(RoomId(id)),
                (Some(id), false) => RoomChoice::Join(RoomId(id)),
                (None, _) => RoomChoice::Random,
            };
            play::run(&controller, choice).await
        }

        Commands::History { clear: true, .. } => {
            controller.store().clear().await?;
            println!("{}", ui::dim("Local history cleared."));
            Ok(())
        }

        Commands::History {
            show: Some(id), ..
        } => {
            let Some(snapshot) = controller.store().load_session(RoomId(id)).await? else {
                bail!("room {id} is not in local history");
            };
            println!("{}", render_banner(snapshot.id, snapshot.state));
            println!("{}", render_transcript(&snapshot.messages));
            Ok(())
        }

        Commands::History { .. } => {
            let summaries = controller.history().await?;
            println!("{}", ui::header("Saved conversations"));
            println!("{}", render_summaries(&summaries, "  No saved conversations."));
            Ok(())
        }

        Commands::Rooms => {
            let rooms = controller.remote_rooms().await?;
            println!("{}", ui::header("Rooms on the server"));
            println!("{}", render_summaries(&rooms, "  The server has no rooms."));
            Ok(())
        }
    }
}
