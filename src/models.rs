use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `null` decodes as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A string list that may arrive as an array, `null`, or a JSON-encoded
/// string; anything unreadable becomes empty.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(list
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) if !text.is_empty() => Some(text),
            _ => None,
        })
        .collect())
}

/// Envelope every upstream trending endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stars: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub forks: u64,
    #[serde(default)]
    pub watchers: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub primary_language: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub tech_stack: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WeekRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ReportMetadata {
    #[serde(default)]
    pub report_title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub week_range: Option<WeekRange>,
    #[serde(default)]
    pub total_repositories: Option<u64>,
    #[serde(default)]
    pub generation_date: Option<String>,
    #[serde(default)]
    pub next_update: Option<String>,
}

/// A full trending report: metadata plus the ranked repository list.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Report {
    #[serde(default)]
    pub metadata: ReportMetadata,
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub week_start: Option<String>,
    #[serde(default)]
    pub report_title: Option<String>,
    #[serde(default)]
    pub generation_date: Option<String>,
    #[serde(default)]
    pub total_repositories: Option<u64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub week: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_weeks: Option<u64>,
    pub total_days: Option<u64>,
    pub total_unique_projects: Option<u64>,
    pub total_unique_technologies: Option<u64>,
    pub total_unique_languages: Option<u64>,
    #[serde(default)]
    pub top_topics: Value,
    #[serde(default)]
    pub weekly_projects: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_languages: Vec<NamedCount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech_stack_trends: Vec<NamedCount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_counts: Vec<ProjectCount>,
    #[serde(default)]
    pub precise_rankings: Value,
}

/// One bar of a language or technology chart.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct NamedCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
}

/// How many weekly reports a project appeared in.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default)]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProgressState {
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: CrawlStatus,
    #[serde(default)]
    pub current_step: Option<String>,
}

/// Body of the crawl trigger response.
#[derive(Debug, Deserialize, Default)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDeleteReport {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A toast-style message for the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Summarises a batch delete: all deleted, some failed, or none deleted.
    pub fn for_batch(report: &BatchDeleteReport) -> Self {
        let (level, message) = if report.failed == 0 {
            (
                NoticeLevel::Success,
                format!("Deleted {} record(s)", report.succeeded),
            )
        } else if report.succeeded == 0 {
            (
                NoticeLevel::Error,
                format!("Could not delete any of the {} record(s)", report.requested),
            )
        } else {
            (
                NoticeLevel::Warning,
                format!(
                    "Deleted {} record(s), {} failed",
                    report.succeeded, report.failed
                ),
            )
        };
        Self { level, message }
    }
}

/// Batch delete response: the tally plus the notice to show for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDeleteOutcome {
    #[serde(flatten)]
    pub report: BatchDeleteReport,
    pub notice: Notice,
}

impl From<BatchDeleteReport> for BatchDeleteOutcome {
    fn from(report: BatchDeleteReport) -> Self {
        Self {
            notice: Notice::for_batch(&report),
            report,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CrawlProgress {
    pub active: bool,
    pub percent: u8,
    pub message: String,
}
