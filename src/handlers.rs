//! Command handlers
//!
//! Each handler turns one command into exactly one [`Reply`]. Errors are
//! caught here and rendered as user-facing text; nothing propagates further.

use crate::commands::Command;
use crate::messages;
use crate::state::{AppState, BotError, SelectionOutcome};
use crate::transport::Transport;
use crate::types::ChatUser;
use chrono::NaiveDate;
use std::sync::Arc;

/// Who sent a command, where, and on which calendar day
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub chat_id: i64,
    pub sender: Option<ChatUser>,
    pub today: NaiveDate,
}

impl CommandContext {
    pub fn chat_key(&self) -> String {
        self.chat_id.to_string()
    }

    fn added_by(&self) -> String {
        self.sender
            .as_ref()
            .map(ChatUser::label)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// What to send back to the chat
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// Teaser first, verdict after a pause
    Announcement { teaser: String, verdict: String },
}

/// Handle a parsed command and produce the reply
pub async fn handle_command(
    command: Command,
    ctx: &CommandContext,
    state: &Arc<AppState>,
    transport: &dyn Transport,
) -> Reply {
    match command {
        Command::Start | Command::Help => Reply::Text(messages::HELP_TEXT.to_string()),
        Command::Clown => handle_clown(ctx, state).await,
        Command::ClownStats => handle_clownstats(ctx, state).await,
        Command::AddMember {
            handle,
            display_name,
        } => handle_add_member(ctx, state, handle, display_name).await,
        Command::RemoveMember { handle } => handle_remove_member(ctx, state, handle).await,
        Command::ListMembers => handle_list_members(ctx, state).await,
        Command::InitMembers => handle_init_members(ctx, state, transport).await,
    }
}

async fn handle_clown(ctx: &CommandContext, state: &Arc<AppState>) -> Reply {
    match state.select(&ctx.chat_key(), ctx.today).await {
        Ok(SelectionOutcome::Selected(selection)) => Reply::Announcement {
            teaser: selection.phrase,
            verdict: messages::verdict(&selection.winner),
        },
        Ok(SelectionOutcome::AlreadyResolved { standings }) => {
            Reply::Text(messages::today_standings(&standings))
        }
        Err(BotError::NoMembers(_)) => Reply::Text(messages::NO_MEMBERS_GUIDANCE.to_string()),
        Err(e) => {
            tracing::error!(chat_id = ctx.chat_id, "Error in /clown: {}", e);
            Reply::Text(messages::GENERIC_ERROR.to_string())
        }
    }
}

async fn handle_clownstats(ctx: &CommandContext, state: &Arc<AppState>) -> Reply {
    let standings = state.standings(&ctx.chat_key(), None).await;
    Reply::Text(messages::full_standings(&standings))
}

async fn handle_add_member(
    ctx: &CommandContext,
    state: &Arc<AppState>,
    handle: String,
    display_name: Option<String>,
) -> Reply {
    let result = state
        .add_member(
            &ctx.chat_key(),
            &handle,
            display_name,
            &ctx.added_by(),
            ctx.today,
        )
        .await;

    match result {
        Ok(member) => Reply::Text(messages::member_added(&member)),
        Err(BotError::DuplicateMember(handle)) => Reply::Text(messages::member_exists(&handle)),
        Err(BotError::InvalidHandle(_)) => Reply::Text(messages::invalid_handle()),
        Err(e) => {
            tracing::error!(chat_id = ctx.chat_id, "Error in /addmember: {}", e);
            Reply::Text(messages::GENERIC_ERROR.to_string())
        }
    }
}

async fn handle_remove_member(
    ctx: &CommandContext,
    state: &Arc<AppState>,
    handle: String,
) -> Reply {
    match state.remove_member(&ctx.chat_key(), &handle).await {
        Ok(_) => Reply::Text(messages::member_removed(&crate::state::normalize_handle(
            &handle,
        ))),
        Err(BotError::NotFound(handle)) => Reply::Text(messages::member_not_found(&handle)),
        Err(e) => {
            tracing::error!(chat_id = ctx.chat_id, "Error in /removemember: {}", e);
            Reply::Text(messages::GENERIC_ERROR.to_string())
        }
    }
}

async fn handle_list_members(ctx: &CommandContext, state: &Arc<AppState>) -> Reply {
    let listing = state.list_members(&ctx.chat_key()).await;
    Reply::Text(messages::roster(&listing))
}

async fn handle_init_members(
    ctx: &CommandContext,
    state: &Arc<AppState>,
    transport: &dyn Transport,
) -> Reply {
    let admins = match transport.get_chat_administrators(ctx.chat_id).await {
        Ok(admins) => admins,
        Err(e) => {
            tracing::warn!(
                chat_id = ctx.chat_id,
                transport = transport.name(),
                "Failed to get chat administrators: {}",
                e
            );
            return Reply::Text(messages::ADMIN_LIST_UNAVAILABLE.to_string());
        }
    };

    match state
        .import_admins(&ctx.chat_key(), &admins, ctx.today)
        .await
    {
        Ok(added) => Reply::Text(messages::admins_imported(added)),
        Err(e) => {
            tracing::error!(chat_id = ctx.chat_id, "Error in /initmembers: {}", e);
            Reply::Text(messages::GENERIC_ERROR.to_string())
        }
    }
}
