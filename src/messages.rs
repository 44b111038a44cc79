//! User-facing texts

use crate::state::RosterListing;
use crate::types::{Member, TallyEntry};

pub const HELP_TEXT: &str = "🤖 Бот для определения клоуна дня!

Доступные команды:
/clown - Определить клоуна дня (раз в сутки)
/clownstats - Показать полную статистику
/addmember <username> [имя] - Добавить участника
/removemember <username> - Удалить участника
/listmembers - Показать список участников
/initmembers - Добавить администраторов чата в список";

pub const NO_MEMBERS_GUIDANCE: &str = "Список участников пуст! 😢
Добавьте участников командой /addmember <username> [имя]
или импортируйте администраторов чата командой /initmembers";

pub const GENERIC_ERROR: &str = "Произошла ошибка! Попробуйте позже.";

pub const ADMIN_LIST_UNAVAILABLE: &str = "Не удалось получить список администраторов чата! 😢
Сделайте бота администратором чата и повторите /initmembers";

pub const EMPTY_STATS: &str = "Статистика пока пуста! Используйте /clown";
pub const EMPTY_STATS_TODAY: &str = "Статистика пока пуста!";

pub fn usage(usage: &str) -> String {
    format!("Использование: {}", usage)
}

/// Second message of an announcement
pub fn verdict(winner: &Member) -> String {
    format!("Клоун дня: {} ({})", winner.display_name, winner.mention())
}

fn standings_lines(standings: &[TallyEntry]) -> String {
    standings
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. {} ({}) - {} раз(а)\n",
                i + 1,
                entry.name,
                entry.mention(),
                entry.count
            )
        })
        .collect()
}

/// Reply to a repeated `/clown` on the same day
pub fn today_standings(standings: &[TallyEntry]) -> String {
    if standings.is_empty() {
        return EMPTY_STATS_TODAY.to_string();
    }
    format!(
        "📊 Сегодняшний клоун уже выбран!\n\nСтатистика за все время:\n{}",
        standings_lines(standings)
    )
}

/// Reply to `/clownstats`
pub fn full_standings(standings: &[TallyEntry]) -> String {
    if standings.is_empty() {
        return EMPTY_STATS.to_string();
    }
    format!(
        "🏆 Полная статистика клоунов:\n\n{}",
        standings_lines(standings)
    )
}

/// Reply to `/listmembers`
pub fn roster(listing: &RosterListing) -> String {
    if listing.members.is_empty() {
        return NO_MEMBERS_GUIDANCE.to_string();
    }

    let mut text = format!(
        "👥 Участники ({} активных из {}):\n\n",
        listing.active,
        listing.members.len()
    );
    for (i, member) in listing.members.iter().enumerate() {
        let marker = if member.active { "✅" } else { "❌" };
        text.push_str(&format!(
            "{}. {} {} ({}) - добавил(а) {}\n",
            i + 1,
            marker,
            member.display_name,
            member.mention(),
            member.added_by
        ));
    }
    text
}

pub fn member_added(member: &Member) -> String {
    format!(
        "✅ {} ({}) добавлен(а) в список участников",
        member.display_name,
        member.mention()
    )
}

pub fn member_exists(handle: &str) -> String {
    format!("@{} уже есть в списке участников", handle)
}

pub fn member_removed(handle: &str) -> String {
    format!("🗑 @{} удалён(а) из списка участников", handle)
}

pub fn member_not_found(handle: &str) -> String {
    format!("@{} не найден(а) в списке участников", handle)
}

pub fn invalid_handle() -> String {
    usage(crate::commands::ADD_MEMBER_USAGE)
}

pub fn admins_imported(added: usize) -> String {
    if added == 0 {
        "Новых участников не найдено: все администраторы уже в списке".to_string()
    } else {
        format!("✅ Добавлено участников: {}", added)
    }
}
