use serde::Serialize;
use toolshare_types::{Actor, ToolRecord, ToolStatus};

/// Everything the presentation layer renders from.
///
/// The facade owns one of these and swaps in a fresh tool list after every
/// relist; callers only ever see snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub account: Option<Actor>,
    pub tools: Vec<ToolRecord>,
    pub refreshing: bool,
}

impl AppState {
    pub fn stats(&self) -> ToolStats {
        ToolStats::from_tools(&self.tools)
    }
}

/// Case-insensitive substring match on name or description.
pub fn filter_tools<'a>(tools: &'a [ToolRecord], term: &str) -> Vec<&'a ToolRecord> {
    let needle = term.trim().to_lowercase();
    tools
        .iter()
        .filter(|t| {
            needle.is_empty()
                || t.name.to_lowercase().contains(&needle)
                || t.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Tool counts per lending status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ToolStats {
    pub total: usize,
    pub available: usize,
    pub borrowed: usize,
    pub pending: usize,
}

impl ToolStats {
    pub fn from_tools(tools: &[ToolRecord]) -> Self {
        tools.iter().fold(
            Self {
                total: tools.len(),
                ..Self::default()
            },
            |mut stats, tool| {
                match tool.status {
                    ToolStatus::Available => stats.available += 1,
                    ToolStatus::Borrowed => stats.borrowed += 1,
                    ToolStatus::Pending => stats.pending += 1,
                }
                stats
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolshare_types::ToolId;

    fn tool(id: &str, name: &str, description: &str, status: ToolStatus) -> ToolRecord {
        ToolRecord {
            id: ToolId::new(id).unwrap(),
            name: name.into(),
            description: description.into(),
            owner: "0xAAA".into(),
            status,
            encrypted_data: String::new(),
            timestamp: 0,
        }
    }

    fn sample() -> Vec<ToolRecord> {
        vec![
            tool("1", "Cordless Drill", "18V with two batteries", ToolStatus::Available),
            tool("2", "Ladder", "Aluminium, 3m", ToolStatus::Borrowed),
            tool("3", "Pressure washer", "needs a drill-free mount", ToolStatus::Pending),
        ]
    }

    #[test]
    fn search_matches_name_or_description_ignoring_case() {
        let tools = sample();
        let hits: Vec<&str> = filter_tools(&tools, "DRILL").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(hits, vec!["1", "3"]);
        assert_eq!(filter_tools(&tools, "3m").len(), 1);
        assert!(filter_tools(&tools, "chainsaw").is_empty());
    }

    #[test]
    fn blank_search_returns_everything() {
        let tools = sample();
        assert_eq!(filter_tools(&tools, "").len(), 3);
        assert_eq!(filter_tools(&tools, "  ").len(), 3);
    }

    #[test]
    fn stats_count_each_status() {
        let state = AppState {
            tools: sample(),
            ..AppState::default()
        };
        assert_eq!(
            state.stats(),
            ToolStats {
                total: 3,
                available: 1,
                borrowed: 1,
                pending: 1,
            }
        );
        assert_eq!(ToolStats::from_tools(&[]), ToolStats::default());
    }
}
