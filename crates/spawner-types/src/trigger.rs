use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyword alternation that fires a routing rule
///
/// Written in skill files as `backend|api|server`; stored as the explicit
/// keyword list so matching stays auditable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerPattern {
    keywords: Vec<String>,
}

impl TriggerPattern {
    /// Parse a raw trigger string. Both `|` and `,` separate alternatives.
    pub fn parse(raw: &str) -> Self {
        Self::from_keywords(raw.split(['|', ',']))
    }

    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for keyword in keywords {
            let cleaned = clean_keyword(keyword.as_ref());
            if !cleaned.is_empty() && !out.contains(&cleaned) {
                out.push(cleaned);
            }
        }
        Self { keywords: out }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl fmt::Display for TriggerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keywords.join("|"))
    }
}

fn clean_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .trim_matches(|c| c == '`' || c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pipe_alternation() {
        let trigger = TriggerPattern::parse("backend|API| server |database");
        assert_eq!(trigger.keywords(), ["backend", "api", "server", "database"]);
        assert_eq!(trigger.to_string(), "backend|api|server|database");
    }

    #[test]
    fn test_parse_strips_code_marks_and_duplicates() {
        let trigger = TriggerPattern::parse("`ui`, component | UI ||");
        assert_eq!(trigger.keywords(), ["ui", "component"]);
    }

    #[test]
    fn test_empty_trigger() {
        assert!(TriggerPattern::parse(" | , ").is_empty());
        assert!(TriggerPattern::default().is_empty());
    }
}
