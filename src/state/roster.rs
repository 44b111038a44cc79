use super::{AppState, BotError, BotResult};
use crate::store::Document;
use crate::types::*;
use chrono::NaiveDate;

/// Roster of a chat together with how many entries are eligible for selection
#[derive(Debug, Clone, PartialEq)]
pub struct RosterListing {
    pub members: Vec<Member>,
    pub active: usize,
}

/// Trim whitespace and a single leading `@`
pub fn normalize_handle(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
}

impl AppState {
    /// Append a member to a chat's roster
    pub async fn add_member(
        &self,
        chat: &str,
        handle: &str,
        display_name: Option<String>,
        added_by: &str,
        today: NaiveDate,
    ) -> BotResult<Member> {
        let handle = normalize_handle(handle);
        if handle.is_empty() {
            return Err(BotError::InvalidHandle(handle));
        }

        let mut rosters = self.rosters.write().await;
        let duplicate = rosters
            .get(chat)
            .is_some_and(|roster| roster.iter().any(|m| m.active && m.has_handle(&handle)));
        if duplicate {
            return Err(BotError::DuplicateMember(handle));
        }

        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| handle.clone());

        let member = Member {
            id: None,
            handle: Some(handle),
            display_name,
            active: true,
            added_by: added_by.to_string(),
            added_on: today,
        };

        let mut next = rosters.clone();
        next.entry(chat.to_string())
            .or_default()
            .push(member.clone());
        self.commit(Document::Rosters, &mut *rosters, next).await?;

        tracing::info!(chat_id = chat, handle = ?member.handle, added_by, "Member added");
        Ok(member)
    }

    /// Drop every entry with the given handle. Returns how many were removed.
    pub async fn remove_member(&self, chat: &str, handle: &str) -> BotResult<usize> {
        let handle = normalize_handle(handle);

        let mut rosters = self.rosters.write().await;
        let before = rosters.get(chat).map(Vec::len).unwrap_or(0);

        let mut next = rosters.clone();
        if let Some(roster) = next.get_mut(chat) {
            roster.retain(|m| !m.has_handle(&handle));
        }
        let after = next.get(chat).map(Vec::len).unwrap_or(0);

        let removed = before - after;
        if removed == 0 {
            return Err(BotError::NotFound(handle));
        }

        self.commit(Document::Rosters, &mut *rosters, next).await?;

        tracing::info!(chat_id = chat, handle = %handle, removed, "Member removed");
        Ok(removed)
    }

    /// Full roster of a chat, in insertion order
    pub async fn list_members(&self, chat: &str) -> RosterListing {
        let members = self
            .rosters
            .read()
            .await
            .get(chat)
            .cloned()
            .unwrap_or_default();
        let active = members.iter().filter(|m| m.active).count();

        RosterListing { members, active }
    }

    /// Members eligible for selection
    pub async fn active_members(&self, chat: &str) -> Vec<Member> {
        self.rosters
            .read()
            .await
            .get(chat)
            .map(|roster| roster.iter().filter(|m| m.active).cloned().collect())
            .unwrap_or_default()
    }

    /// Add chat administrators that are not bots and not yet on the roster.
    /// Returns how many members were added.
    pub async fn import_admins(
        &self,
        chat: &str,
        admins: &[ChatUser],
        today: NaiveDate,
    ) -> BotResult<usize> {
        let mut rosters = self.rosters.write().await;
        let mut next = rosters.clone();
        let roster = next.entry(chat.to_string()).or_default();

        let mut added = 0;
        for admin in admins.iter().filter(|a| !a.is_bot) {
            let Some(handle) = admin.username.as_deref().filter(|h| !h.is_empty()) else {
                continue;
            };
            if roster.iter().any(|m| m.has_handle(handle)) {
                continue;
            }

            roster.push(Member {
                id: Some(admin.id),
                handle: Some(handle.to_string()),
                display_name: admin.first_name.clone(),
                active: true,
                added_by: SYSTEM_ADDED_BY.to_string(),
                added_on: today,
            });
            added += 1;
        }

        if added > 0 {
            self.commit(Document::Rosters, &mut *rosters, next).await?;
        }

        tracing::info!(chat_id = chat, added, "Imported chat administrators");
        Ok(added)
    }
}
