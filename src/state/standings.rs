use super::AppState;
use crate::types::*;

/// Order a tally table by count, highest first. Equal counts keep the
/// table's insertion order.
pub fn rank(table: &TallyTable, limit: Option<usize>) -> Vec<TallyEntry> {
    let mut entries: Vec<TallyEntry> = table.values().cloned().collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));

    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

impl AppState {
    /// Ranked tally of a chat, optionally capped
    pub async fn standings(&self, chat: &str, limit: Option<usize>) -> Vec<TallyEntry> {
        self.tallies
            .read()
            .await
            .get(chat)
            .map(|table| rank(table, limit))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn entry(name: &str, count: u32) -> TallyEntry {
        TallyEntry {
            name: name.to_string(),
            handle: name.to_lowercase(),
            count,
        }
    }

    fn table(entries: &[(&str, u32)]) -> TallyTable {
        entries
            .iter()
            .map(|(name, count)| (name.to_string(), entry(name, *count)))
            .collect()
    }

    #[test]
    fn test_rank_sorts_descending() {
        let ranked = rank(&table(&[("A", 1), ("B", 5), ("C", 3)]), None);
        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        let ranked = rank(&table(&[("Z", 2), ("A", 2), ("M", 4), ("B", 2)]), None);
        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["M", "Z", "A", "B"]);
    }

    #[test]
    fn test_rank_limit() {
        let entries: Vec<(String, u32)> = (0..15).map(|i| (format!("P{}", i), i)).collect();
        let refs: Vec<(&str, u32)> = entries.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        let t = table(&refs);

        assert_eq!(rank(&t, Some(TODAY_STANDINGS_LIMIT)).len(), 10);
        assert_eq!(rank(&t, Some(TODAY_STANDINGS_LIMIT))[0].name, "P14");
        assert_eq!(rank(&t, None).len(), 15);
    }

    #[tokio::test]
    async fn test_standings_for_unknown_chat_is_empty() {
        let state = AppState::new(Store::new("unused"));
        assert!(state.standings("nope", None).await.is_empty());
    }
}
