use crate::models::{
    HistoryEntry, NamedCount, ProjectCount, Report, ReportMetadata, Repository, Statistics,
};
use crate::trend::{RankedRepository, Trend, TrendStatus};
use serde::Serialize;

pub const NO_DESCRIPTION: &str = "No description";
pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_LAST_SEEN: &str = "Unknown";
const FALLBACK_LANGUAGE_COLOR: &str = "#6e6e6e";
const LANGUAGE_CHART_LIMIT: usize = 8;
const TECHNOLOGY_CHART_LIMIT: usize = 10;
const PROJECT_CHART_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrendBadge {
    pub label: &'static str,
    pub tone: &'static str,
    pub icon: &'static str,
}

pub fn trend_badge(trend: &Trend) -> TrendBadge {
    match trend {
        Trend::New => TrendBadge {
            label: "New",
            tone: "success",
            icon: "star",
        },
        Trend::Known { status, .. } => match status {
            TrendStatus::Rising => TrendBadge {
                label: "Rising",
                tone: "success",
                icon: "arrow-up",
            },
            TrendStatus::Falling => TrendBadge {
                label: "Falling",
                tone: "danger",
                icon: "arrow-down",
            },
            TrendStatus::Stable => TrendBadge {
                label: "Stable",
                tone: "secondary",
                icon: "minus",
            },
        },
    }
}

pub fn language_color(language: &str) -> &'static str {
    match language {
        "JavaScript" => "#f1e05a",
        "TypeScript" => "#2b7489",
        "Python" => "#3572A5",
        "Java" => "#b07219",
        "C++" => "#f34b7d",
        "C#" => "#178600",
        "PHP" => "#4F5D95",
        "Go" => "#00ADD8",
        "Rust" => "#dea584",
        "Swift" => "#ffac45",
        "Kotlin" => "#F18E33",
        "Ruby" => "#701516",
        "Shell" => "#89e051",
        "HTML" => "#e34c26",
        "CSS" => "#563d7c",
        "SCSS" => "#c6538c",
        "Vue" => "#41b883",
        "React" => "#61dafb",
        "Django" => "#092e20",
        "Angular" => "#dd0031",
        _ => FALLBACK_LANGUAGE_COLOR,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RepoCard {
    pub rank: usize,
    pub name: String,
    pub full_name: String,
    pub html_url: Option<String>,
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub language_color: Option<&'static str>,
    pub tech_stack: Vec<String>,
    pub badge: Option<TrendBadge>,
    pub trend: Option<Trend>,
}

impl RepoCard {
    fn build(rank: usize, repo: &Repository, trend: Option<Trend>) -> Self {
        let language = repo
            .primary_language
            .clone()
            .or_else(|| repo.language.clone())
            .filter(|lang| !lang.is_empty());
        Self {
            rank,
            name: if repo.name.is_empty() {
                repo.full_name.clone()
            } else {
                repo.name.clone()
            },
            full_name: repo.full_name.clone(),
            html_url: repo.html_url.clone(),
            description: repo
                .description
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            stars: repo.stars,
            forks: repo.forks,
            language_color: language.as_deref().map(language_color),
            language,
            tech_stack: repo.tech_stack.clone(),
            badge: trend.as_ref().map(trend_badge),
            trend,
        }
    }

    pub fn ranked(ranked: &RankedRepository) -> Self {
        Self::build(ranked.rank, &ranked.repository, Some(ranked.trend))
    }

    /// Card for a list shown without trend comparison.
    pub fn plain(index: usize, repo: &Repository) -> Self {
        Self::build(index + 1, repo, None)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportView {
    pub metadata: ReportMetadata,
    pub repositories: Vec<RepoCard>,
}

impl ReportView {
    pub fn with_trends(metadata: ReportMetadata, ranked: &[RankedRepository]) -> Self {
        Self {
            metadata,
            repositories: ranked.iter().map(RepoCard::ranked).collect(),
        }
    }

    pub fn plain(report: &Report) -> Self {
        Self {
            metadata: report.metadata.clone(),
            repositories: report
                .repositories
                .iter()
                .enumerate()
                .map(|(index, repo)| RepoCard::plain(index, repo))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryRow {
    pub index: usize,
    pub id: i64,
    pub title: String,
    pub generated: String,
    pub total_repositories: u64,
}

pub fn history_rows(entries: &[HistoryEntry]) -> Vec<HistoryRow> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| HistoryRow {
            index: index + 1,
            id: entry.id,
            title: entry
                .report_title
                .clone()
                .unwrap_or_else(|| UNTITLED.to_string()),
            generated: entry
                .generation_date
                .clone()
                .or_else(|| entry.week_start.clone())
                .unwrap_or_default(),
            total_repositories: entry.total_repositories.unwrap_or(0),
        })
        .collect()
}

/// Case-insensitive filter over title, year, week and generation date.
pub fn search_history(entries: &[HistoryEntry], term: &str) -> Vec<HistoryEntry> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return entries.to_vec();
    }
    entries
        .iter()
        .filter(|entry| {
            let title = entry.report_title.as_deref().unwrap_or("").to_lowercase();
            let year = entry.year.map(|y| y.to_string()).unwrap_or_default();
            let week = entry.week.map(|w| w.to_string()).unwrap_or_default();
            let date = entry.generation_date.as_deref().unwrap_or("").to_lowercase();
            title.contains(&term) || year.contains(&term) || week.contains(&term) || date.contains(&term)
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatisticsSummary {
    pub total_weeks: u64,
    pub total_unique_projects: u64,
    pub total_unique_technologies: u64,
    pub total_unique_languages: u64,
}

/// One row of the "most frequently listed" table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectRanking {
    pub position: usize,
    pub name: String,
    pub full_name: String,
    pub count: u64,
    pub last_seen: String,
}

/// Projects by appearance count, most frequent first, cut to the top ten.
pub fn project_rankings(counts: &[ProjectCount]) -> Vec<ProjectRanking> {
    let mut sorted: Vec<&ProjectCount> = counts.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted
        .into_iter()
        .take(PROJECT_CHART_LIMIT)
        .enumerate()
        .map(|(index, project)| ProjectRanking {
            position: index + 1,
            name: project
                .name
                .rsplit('/')
                .next()
                .unwrap_or(&project.name)
                .to_string(),
            full_name: project.name.clone(),
            count: project.count,
            last_seen: project
                .last_seen
                .clone()
                .filter(|seen| !seen.is_empty())
                .unwrap_or_else(|| UNKNOWN_LAST_SEEN.to_string()),
        })
        .collect()
}

/// Chart series as the page draws them, each already cut to its limit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChartSeries {
    pub languages: Vec<NamedCount>,
    pub technologies: Vec<NamedCount>,
    pub projects: Vec<ProjectCount>,
}

impl ChartSeries {
    fn from_statistics(stats: &Statistics) -> Self {
        let mut projects = stats.project_counts.clone();
        projects.sort_by(|a, b| b.count.cmp(&a.count));
        projects.truncate(PROJECT_CHART_LIMIT);
        Self {
            languages: stats
                .top_languages
                .iter()
                .take(LANGUAGE_CHART_LIMIT)
                .cloned()
                .collect(),
            technologies: stats
                .tech_stack_trends
                .iter()
                .take(TECHNOLOGY_CHART_LIMIT)
                .cloned()
                .collect(),
            projects,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsView {
    pub summary: StatisticsSummary,
    pub series: ChartSeries,
    pub rankings: Vec<ProjectRanking>,
    pub charts: Statistics,
}

impl From<Statistics> for StatisticsView {
    fn from(stats: Statistics) -> Self {
        Self {
            summary: StatisticsSummary {
                total_weeks: stats.total_weeks.or(stats.total_days).unwrap_or(0),
                total_unique_projects: stats.total_unique_projects.unwrap_or(0),
                total_unique_technologies: stats.total_unique_technologies.unwrap_or(0),
                total_unique_languages: stats.total_unique_languages.unwrap_or(0),
            },
            series: ChartSeries::from_statistics(&stats),
            rankings: project_rankings(&stats.project_counts),
            charts: stats,
        }
    }
}
