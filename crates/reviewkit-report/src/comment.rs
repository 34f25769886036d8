use serde::{Deserialize, Serialize};

/// How strongly a review comment should be weighed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    #[default]
    Suggestion,
    Question,
    Praise,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Warning => "🟡",
            Severity::Suggestion => "💡",
            Severity::Question => "❓",
            Severity::Praise => "✅",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Suggestion => write!(f, "suggestion"),
            Severity::Question => write!(f, "question"),
            Severity::Praise => write!(f, "praise"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "suggestion" => Ok(Severity::Suggestion),
            "question" => Ok(Severity::Question),
            "praise" => Ok(Severity::Praise),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Render a review comment anchored at `file_path[:line]`.
///
/// Unknown severities render as suggestions; a line of 0 is treated as absent.
pub fn format_review_comment(
    file_path: &str,
    line: Option<u32>,
    comment: &str,
    severity: &str,
) -> String {
    let severity: Severity = severity.parse().unwrap_or_default();
    let location = match line.filter(|n| *n > 0) {
        Some(n) => format!("{}:{}", file_path, n),
        None => file_path.to_string(),
    };
    format!("{} **{}**\n{}\n", severity.icon(), location, comment)
}
