mod roster;
mod selection;
mod standings;

pub use roster::{normalize_handle, RosterListing};
pub use selection::{Selection, SelectionOutcome, CELEBRATION_PHRASES};
pub use standings::rank;

use crate::store::{Document, Store, StoreError, StoreResult};
use crate::types::*;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

pub type BotResult<T> = Result<T, BotError>;

/// Errors surfaced by roster and selection operations
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("No active members in chat {0}")]
    NoMembers(ChatKey),

    #[error("Member @{0} is already on the roster")]
    DuplicateMember(String),

    #[error("Member @{0} is not on the roster")]
    NotFound(String),

    #[error("Invalid handle: {0:?}")]
    InvalidHandle(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared application state: in-memory mirrors of the three documents
/// plus the store they are persisted to.
#[derive(Clone)]
pub struct AppState {
    store: Store,
    pub daily_markers: Arc<RwLock<DailyMarkers>>,
    pub rosters: Arc<RwLock<Rosters>>,
    pub tallies: Arc<RwLock<Tallies>>,
    /// Held by the dispatcher so only one command mutates state at a time
    command_gate: Arc<Mutex<()>>,
}

impl AppState {
    /// Create state with empty mirrors, without touching disk
    pub fn new(store: Store) -> Self {
        Self {
            store,
            daily_markers: Arc::new(RwLock::new(DailyMarkers::new())),
            rosters: Arc::new(RwLock::new(Rosters::new())),
            tallies: Arc::new(RwLock::new(Tallies::new())),
            command_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Load all three documents from the store
    pub async fn open(store: Store) -> StoreResult<Self> {
        let daily_markers: DailyMarkers = store.load(Document::DailyMarkers).await?;
        let rosters: Rosters = store.load(Document::Rosters).await?;
        let tallies: Tallies = store.load(Document::Tallies).await?;

        tracing::info!(
            data_dir = %store.data_dir().display(),
            chats_with_roster = rosters.len(),
            chats_with_tally = tallies.len(),
            "State loaded"
        );

        Ok(Self {
            store,
            daily_markers: Arc::new(RwLock::new(daily_markers)),
            rosters: Arc::new(RwLock::new(rosters)),
            tallies: Arc::new(RwLock::new(tallies)),
            command_gate: Arc::new(Mutex::new(())),
        })
    }

    /// Write every document back to disk (shutdown path)
    pub async fn flush(&self) -> StoreResult<()> {
        let markers = self.daily_markers.read().await;
        let rosters = self.rosters.read().await;
        let tallies = self.tallies.read().await;

        self.store.save(Document::DailyMarkers, &*markers).await?;
        self.store.save(Document::Rosters, &*rosters).await?;
        self.store.save(Document::Tallies, &*tallies).await?;
        Ok(())
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Wait for exclusive access to command handling
    pub async fn lock_commands(&self) -> MutexGuard<'_, ()> {
        self.command_gate.lock().await
    }

    /// Persist `next` and, only once it is on disk, make it the live mirror
    async fn commit<T: Serialize>(
        &self,
        document: Document,
        live: &mut T,
        next: T,
    ) -> StoreResult<()> {
        self.store.save(document, &next).await?;
        *live = next;
        Ok(())
    }
}
