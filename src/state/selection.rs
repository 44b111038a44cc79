use super::{AppState, BotError, BotResult};
use crate::store::Document;
use crate::types::*;
use chrono::NaiveDate;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Teasers sent before the winner is revealed
pub const CELEBRATION_PHRASES: &[&str] = &[
    "Сейчас узнаем, кто скрывает слёзы позора за клоунским гримом - это... 🤡",
    "Кто же сегодня развлечёт народ своей жалкой жизнью? 🎪",
    "А кто тут больше всего любит жонглировать и вертеть жопой? 🤹‍",
    "Клоун дня и так всем известен... 👀",
    "Внимание! Сейчас узнаем, кто клоун! 👀",
    "А кто это забыл свой красный нос? 🔴",
    "Рекомендую носить красный нос постоянно, он замаскирует твой позор! 🔴",
    "Поздравляю с титулом 'Клоун дня'! Скидка 10% на все шутки про тебя! 🎪",
    "🔮 Магический шар говорит: 'Тот, кто сегодня проснётся клоуном...' Опа, это же...",
    "Да разве ж это соревнования? Ты с перевесом в 100% забираешь этот титул сегодня. 🥇",
    "Объявляю! Тот, чья жизнь и так комедия... 🤡",
    "Получай пирог в лицо! 🥧",
    "🎯 Сейчас определим сегоднюшнюю мишень для насмешек. Не забудь надеть свой парик!",
    "Кто жонглирует оправданиями лучше всех? 🤹‍",
    "Да ты не просто клоун, ты эталон! Заносим в учебники! 📚",
    "🍀 Не везёт в любви? Зато повезло стать клоуном дня!",
    "Секундочку, проверяю базу данных клоунов... 🗄️",
];

/// A fresh winner for today
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub winner: Member,
    /// Winner's tally after this selection
    pub count: u32,
    pub phrase: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Selected(Selection),
    /// Today's clown was already chosen; nothing changed
    AlreadyResolved { standings: Vec<TallyEntry> },
}

fn pick_winner<'a, R: Rng + ?Sized>(active: &'a [Member], rng: &mut R) -> Option<&'a Member> {
    active.choose(rng)
}

/// Move the entry stored under `from` to `to`, keeping its position.
/// Wins recorded before a member's id was known stay with that member.
fn adopt_entry(table: &mut TallyTable, from: &str, to: &str) {
    if !table.contains_key(from) {
        return;
    }
    *table = std::mem::take(table)
        .into_iter()
        .map(|(key, entry)| {
            if key == from {
                (to.to_string(), entry)
            } else {
                (key, entry)
            }
        })
        .collect();
    tracing::info!(from, to, "Tally entry re-keyed to member id");
}

fn pick_phrase<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CELEBRATION_PHRASES
        .choose(rng)
        .copied()
        .unwrap_or("🤡")
}

impl AppState {
    /// Whether a clown has been selected in this chat on `today`
    pub async fn day_state(&self, chat: &str, today: NaiveDate) -> DayState {
        let markers = self.daily_markers.read().await;
        if markers.get(chat).map(String::as_str) == Some(date_key(today).as_str()) {
            DayState::ResolvedToday
        } else {
            DayState::UnresolvedToday
        }
    }

    /// Select today's clown, or replay the standings if that already happened.
    ///
    /// The tally is written before the daily marker. If the process dies
    /// between the two writes the tally keeps the increment while the chat
    /// stays unresolved, so a retry may select a second winner that day.
    pub async fn select(&self, chat: &str, today: NaiveDate) -> BotResult<SelectionOutcome> {
        let today_key = date_key(today);

        // Held for the whole selection so the day state cannot change underneath
        let mut markers = self.daily_markers.write().await;
        if markers.get(chat) == Some(&today_key) {
            tracing::debug!(chat_id = chat, "Clown already selected today");
            return Ok(SelectionOutcome::AlreadyResolved {
                standings: self.standings(chat, Some(TODAY_STANDINGS_LIMIT)).await,
            });
        }

        let active = self.active_members(chat).await;
        let (winner, phrase) = {
            let mut rng = rand::rng();
            let winner = pick_winner(&active, &mut rng)
                .cloned()
                .ok_or_else(|| BotError::NoMembers(chat.to_string()))?;
            (winner, pick_phrase(&mut rng).to_string())
        };

        let count = {
            let mut tallies = self.tallies.write().await;
            let mut next = tallies.clone();
            let table = next.entry(chat.to_string()).or_default();
            let key = winner.tally_key();
            if winner.id.is_some() && !table.contains_key(&key) {
                if let Some(handle_key) = winner.handle_key() {
                    adopt_entry(table, &handle_key, &key);
                }
            }
            let entry = table
                .entry(key)
                .or_insert_with(|| TallyEntry::for_member(&winner));
            entry.count += 1;
            let count = entry.count;

            self.commit(Document::Tallies, &mut *tallies, next).await?;
            count
        };

        let mut next_markers = markers.clone();
        next_markers.insert(chat.to_string(), today_key);
        self.commit(Document::DailyMarkers, &mut *markers, next_markers)
            .await?;

        tracing::info!(
            chat_id = chat,
            winner = %winner.mention(),
            count,
            "Clown of the day selected"
        );

        Ok(SelectionOutcome::Selected(Selection {
            winner,
            count,
            phrase,
        }))
    }
}
