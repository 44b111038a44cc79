use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// String form of the platform's numeric chat id
pub type ChatKey = String;
/// Tally key of a member (numeric id, or a key synthesized from the handle)
pub type MemberKey = String;

/// Chat -> `YYYY-MM-DD` of the last successful selection
pub type DailyMarkers = HashMap<ChatKey, String>;
/// Chat -> ordered roster
pub type Rosters = HashMap<ChatKey, Vec<Member>>;
/// Chat -> tally table in insertion order
pub type Tallies = HashMap<ChatKey, TallyTable>;
pub type TallyTable = IndexMap<MemberKey, TallyEntry>;

/// Value stored in `Member::added_by` for members imported from the admin list
pub const SYSTEM_ADDED_BY: &str = "system";

/// Cap applied to the standings replayed by a repeated `/clown`
pub const TODAY_STANDINGS_LIMIT: usize = 10;

/// A roster entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "username", default)]
    pub handle: Option<String>,
    #[serde(rename = "first_name")]
    pub display_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub added_by: String,
    pub added_on: NaiveDate,
}

fn default_active() -> bool {
    true
}

impl Member {
    /// Tally key: numeric id when known, otherwise derived from the handle.
    /// Members with neither fall back to their display name.
    pub fn tally_key(&self) -> MemberKey {
        match (&self.id, self.handle_key()) {
            (Some(id), _) => id.to_string(),
            (None, Some(key)) => key,
            _ => format!("name:{}", self.display_name),
        }
    }

    /// Key the member is tallied under when no id is known
    pub fn handle_key(&self) -> Option<MemberKey> {
        self.handle
            .as_deref()
            .filter(|handle| !handle.is_empty())
            .map(|handle| format!("username:{}", handle))
    }

    pub fn has_handle(&self, handle: &str) -> bool {
        self.handle.as_deref() == Some(handle)
    }

    /// `@handle` if the member has one, the display name otherwise
    pub fn mention(&self) -> String {
        match self.handle.as_deref() {
            Some(handle) if !handle.is_empty() => format!("@{}", handle),
            _ => self.display_name.clone(),
        }
    }
}

/// Per-member win counter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallyEntry {
    pub name: String,
    #[serde(rename = "username", default)]
    pub handle: String,
    pub count: u32,
}

impl TallyEntry {
    pub fn for_member(member: &Member) -> Self {
        Self {
            name: member.display_name.clone(),
            handle: member.handle.clone().unwrap_or_default(),
            count: 0,
        }
    }

    /// `@handle` if known, the name otherwise
    pub fn mention(&self) -> String {
        if self.handle.is_empty() {
            self.name.clone()
        } else {
            format!("@{}", self.handle)
        }
    }
}

/// A platform user as reported by the transport (message sender or chat admin)
#[derive(Debug, Clone, PartialEq)]
pub struct ChatUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

impl ChatUser {
    /// Label recorded as `added_by` when this user edits the roster
    pub fn label(&self) -> String {
        match self.username.as_deref() {
            Some(username) if !username.is_empty() => format!("@{}", username),
            _ => self.first_name.clone(),
        }
    }
}

/// Whether today's clown has already been chosen in a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    UnresolvedToday,
    ResolvedToday,
}

/// Marker format used in the daily-marker document
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
