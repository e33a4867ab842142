use crate::client::TrendingApi;
use crate::errors::ClientError;
use crate::models::{BatchDeleteReport, CrawlProgress, HistoryEntry, Notice, Report, SessionResponse};
use crate::progress::run_with_progress;
use crate::session::CredentialStore;
use crate::trend::{reconcile, RankedRepository, Snapshot};
use crate::view::{search_history, ReportView, StatisticsView};
use std::{sync::Arc, time::Duration};
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

const CRAWL_STARTING: &str = "Preparing to crawl...";

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub poll_interval: Duration,
    pub history_depth: usize,
}

/// Application state behind every page action: the upstream client, the
/// operator's credentials and the lists currently on screen.
pub struct Dashboard {
    api: Arc<dyn TrendingApi>,
    credentials: CredentialStore,
    settings: DashboardSettings,
    current: Mutex<Vec<RankedRepository>>,
    history: Mutex<Vec<HistoryEntry>>,
    progress: Arc<watch::Sender<CrawlProgress>>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn TrendingApi>, credentials: CredentialStore, settings: DashboardSettings) -> Self {
        let (progress, _) = watch::channel(CrawlProgress::default());
        Self {
            api,
            credentials,
            settings,
            current: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            progress: Arc::new(progress),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn crawl_progress(&self) -> CrawlProgress {
        self.progress.borrow().clone()
    }

    pub async fn current_repositories(&self) -> Vec<RankedRepository> {
        self.current.lock().await.clone()
    }

    pub fn session(&self) -> SessionResponse {
        let username = self.credentials.username();
        SessionResponse {
            authenticated: username.is_some(),
            username,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        self.api.login(username, password).await?;
        self.credentials.save(username, password);
        info!(username, "admin logged in");
        Ok(())
    }

    pub fn logout(&self) {
        self.credentials.clear();
        info!("admin logged out");
    }

    /// Latest report with each repository classified against recent history.
    pub async fn load_latest(&self) -> Result<ReportView, ClientError> {
        let report = match self.api.latest().await {
            Ok(report) => report,
            Err(err) => {
                self.current.lock().await.clear();
                return Err(err);
            }
        };

        let snapshots = self.recent_snapshots().await;
        let ranked = reconcile(&report.repositories, &snapshots);
        info!(
            repositories = ranked.len(),
            snapshots = snapshots.len(),
            "latest trending loaded"
        );

        let view = ReportView::with_trends(report.metadata, &ranked);
        *self.current.lock().await = ranked;
        Ok(view)
    }

    /// Up to `history_depth` most recent snapshots; entries whose detail
    /// cannot be fetched are skipped.
    async fn recent_snapshots(&self) -> Vec<Snapshot> {
        let entries = match self.api.history().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("history unavailable, trends computed without it: {err}");
                return Vec::new();
            }
        };

        let mut snapshots = Vec::with_capacity(self.settings.history_depth);
        for entry in entries.into_iter().take(self.settings.history_depth) {
            match self.api.weekly_report(entry.id).await {
                Ok(report) => {
                    snapshots.push(Snapshot::new(entry.id, entry.week_start, &report.repositories))
                }
                Err(err) => warn!(id = entry.id, "skipping history snapshot: {err}"),
            }
        }
        snapshots
    }

    pub async fn report_for_week(&self, year: i32, week: u32) -> Result<ReportView, ClientError> {
        let report = self.api.report_for_week(year, week).await?;
        Ok(ReportView::plain(&report))
    }

    pub async fn statistics(&self) -> Result<StatisticsView, ClientError> {
        Ok(self.api.statistics().await?.into())
    }

    fn require_session(&self) -> Result<(), ClientError> {
        if self.credentials.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::NotLoggedIn)
        }
    }

    pub async fn history(&self, search: Option<&str>) -> Result<Vec<HistoryEntry>, ClientError> {
        self.require_session()?;
        let Some(term) = search else {
            return self.refresh_history().await;
        };

        // searching filters the list already on screen; fetch only if there is none
        let cached = self.history.lock().await.clone();
        let entries = if cached.is_empty() {
            self.refresh_history().await?
        } else {
            cached
        };
        Ok(search_history(&entries, term))
    }

    async fn refresh_history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let entries = self.api.history().await?;
        *self.history.lock().await = entries.clone();
        Ok(entries)
    }

    pub async fn report_detail(&self, id: i64) -> Result<Report, ClientError> {
        self.require_session()?;
        self.api.report_by_id(id).await
    }

    pub async fn delete_report(&self, id: i64) -> Result<Notice, ClientError> {
        let credential = self.credentials.require()?;
        self.api.delete_report(id, &credential).await.inspect_err(|err| {
            error!(id, "delete failed: {err}");
        })?;
        info!(id, "history report deleted");

        if let Err(err) = self.refresh_history().await {
            warn!("history refresh after delete failed: {err}");
        }
        Ok(Notice::success("Deleted"))
    }

    /// Deletes each id in turn, tallying failures instead of stopping at the
    /// first one. The history list is refreshed once at the end; if any item
    /// was rejected as unauthenticated the whole action ends in the login prompt.
    pub async fn batch_delete(&self, ids: &[i64]) -> Result<BatchDeleteReport, ClientError> {
        if ids.is_empty() {
            return Err(ClientError::EmptySelection);
        }

        let mut report = BatchDeleteReport {
            requested: ids.len(),
            succeeded: 0,
            failed: 0,
        };
        let mut unauthorized = false;
        for &id in ids {
            let credential = self.credentials.require()?;
            match self.api.delete_report(id, &credential).await {
                Ok(()) => report.succeeded += 1,
                Err(err) => {
                    report.failed += 1;
                    unauthorized |= matches!(err, ClientError::Unauthorized);
                    error!(id, "batch delete item failed: {err}");
                }
            }
        }

        if let Err(err) = self.refresh_history().await {
            warn!("history refresh after batch delete failed: {err}");
        }
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "batch delete finished"
        );
        if unauthorized {
            return Err(ClientError::Unauthorized);
        }
        Ok(report)
    }

    /// Triggers an upstream crawl and reports its progress until the trigger
    /// request returns.
    pub async fn crawl(&self) -> Result<Notice, ClientError> {
        let credential = self.credentials.require()?;

        self.progress.send_replace(CrawlProgress {
            active: true,
            percent: 0,
            message: CRAWL_STARTING.to_string(),
        });
        info!(username = %credential.username, "crawl triggered");

        let outcome = run_with_progress(
            self.api.clone(),
            self.progress.clone(),
            self.settings.poll_interval,
            self.api.trigger_update(&credential),
        )
        .await;

        self.progress.send_modify(|view| view.active = false);

        match outcome {
            Ok(message) => {
                info!("crawl finished");
                if let Err(err) = self.load_latest().await {
                    warn!("reload after crawl failed: {err}");
                }
                Ok(Notice::success(
                    message.unwrap_or_else(|| "Crawl finished".to_string()),
                ))
            }
            Err(err) => {
                if err.requires_login() {
                    warn!("crawl rejected: not authenticated");
                } else {
                    error!("crawl failed: {err}");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ProgressSource;
    use crate::models::{Credential, ProgressState, Repository, Statistics};
    use crate::session::{MemorySessionStorage, SessionStorage, AUTH_KEY};
    use crate::trend::TrendStatus;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeApi {
        latest: Vec<&'static str>,
        history: Vec<i64>,
        weekly: HashMap<i64, Vec<&'static str>>,
        reject_login: bool,
        unauthorized: bool,
        failing_deletes: HashSet<i64>,
        history_calls: AtomicUsize,
        delete_calls: AtomicUsize,
        update_calls: AtomicUsize,
        deleted: StdMutex<Vec<i64>>,
    }

    fn repos(names: &[&'static str]) -> Vec<Repository> {
        names
            .iter()
            .map(|name| Repository {
                full_name: name.to_string(),
                name: name.to_string(),
                ..Repository::default()
            })
            .collect()
    }

    #[async_trait]
    impl ProgressSource for FakeApi {
        async fn fetch_progress(&self) -> Result<ProgressState, ClientError> {
            Ok(ProgressState::default())
        }
    }

    #[async_trait]
    impl TrendingApi for FakeApi {
        async fn latest(&self) -> Result<Report, ClientError> {
            Ok(Report {
                repositories: repos(&self.latest),
                ..Report::default()
            })
        }

        async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .history
                .iter()
                .map(|&id| HistoryEntry {
                    id,
                    week_start: None,
                    report_title: Some(format!("Report {id}")),
                    generation_date: None,
                    total_repositories: None,
                    year: None,
                    week: None,
                })
                .collect())
        }

        async fn weekly_report(&self, id: i64) -> Result<Report, ClientError> {
            match self.weekly.get(&id) {
                Some(names) => Ok(Report {
                    repositories: repos(names),
                    ..Report::default()
                }),
                None => Err(ClientError::Http {
                    status: 404,
                    detail: "HTTP 404".into(),
                }),
            }
        }

        async fn report_by_id(&self, id: i64) -> Result<Report, ClientError> {
            self.weekly_report(id).await
        }

        async fn report_for_week(&self, _year: i32, _week: u32) -> Result<Report, ClientError> {
            self.latest().await
        }

        async fn statistics(&self) -> Result<Statistics, ClientError> {
            Ok(Statistics::default())
        }

        async fn login(&self, _username: &str, _password: &str) -> Result<(), ClientError> {
            if self.reject_login {
                Err(ClientError::Unauthorized)
            } else {
                Ok(())
            }
        }

        async fn trigger_update(&self, _credential: &Credential) -> Result<Option<String>, ClientError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if self.unauthorized {
                Err(ClientError::Unauthorized)
            } else {
                Ok(Some("crawl complete".into()))
            }
        }

        async fn delete_report(&self, id: i64, _credential: &Credential) -> Result<(), ClientError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            if self.unauthorized {
                return Err(ClientError::Unauthorized);
            }
            if self.failing_deletes.contains(&id) {
                return Err(ClientError::Application(format!("cannot delete {id}")));
            }
            self.deleted.lock().unwrap().push(id);
            Ok(())
        }
    }

    fn dashboard(api: FakeApi) -> (Dashboard, Arc<FakeApi>, Arc<MemorySessionStorage>) {
        let api = Arc::new(api);
        let storage = Arc::new(MemorySessionStorage::default());
        let dashboard = Dashboard::new(
            api.clone(),
            CredentialStore::new(storage.clone()),
            DashboardSettings {
                poll_interval: Duration::from_millis(1000),
                history_depth: 5,
            },
        );
        (dashboard, api, storage)
    }

    #[tokio::test]
    async fn latest_skips_unfetchable_snapshots() {
        let (dashboard, _, _) = dashboard(FakeApi {
            latest: vec!["A", "B", "C"],
            // 7 has no detail and is skipped, so B is matched in 6
            history: vec![7, 6],
            weekly: HashMap::from([(6, vec!["B", "A"])]),
            ..FakeApi::default()
        });

        let view = dashboard.load_latest().await.unwrap();
        let statuses: Vec<_> = view
            .repositories
            .iter()
            .map(|card| card.trend.unwrap().status())
            .collect();
        assert_eq!(
            statuses,
            vec![Some(TrendStatus::Rising), Some(TrendStatus::Falling), None]
        );
        assert_eq!(dashboard.current_repositories().await.len(), 3);
    }

    #[tokio::test]
    async fn latest_uses_at_most_configured_depth() {
        let (dashboard, _, _) = dashboard(FakeApi {
            latest: vec!["A"],
            history: vec![6, 5, 4, 3, 2, 1],
            weekly: HashMap::from([(1, vec!["A"])]),
            ..FakeApi::default()
        });

        let view = dashboard.load_latest().await.unwrap();
        assert!(view.repositories[0].trend.unwrap().is_new());
    }

    #[tokio::test]
    async fn login_stores_credentials_only_on_success() {
        let (dashboard, _, storage) = dashboard(FakeApi {
            reject_login: true,
            ..FakeApi::default()
        });
        assert!(matches!(
            dashboard.login("admin", "wrong").await,
            Err(ClientError::Unauthorized)
        ));
        assert!(storage.get_item(AUTH_KEY).is_none());

        let (dashboard, _, _) = dashboard_ok();
        dashboard.login("admin", "secret").await.unwrap();
        assert_eq!(dashboard.session().username.as_deref(), Some("admin"));
        dashboard.logout();
        assert!(!dashboard.session().authenticated);
    }

    fn dashboard_ok() -> (Dashboard, Arc<FakeApi>, Arc<MemorySessionStorage>) {
        dashboard(FakeApi::default())
    }

    #[tokio::test]
    async fn missing_password_never_reaches_upstream() {
        let (dashboard, api, storage) = dashboard_ok();
        storage.set_item(AUTH_KEY, r#"{"authenticated":true,"username":"admin"}"#.into());

        assert!(matches!(dashboard.crawl().await, Err(ClientError::MissingPassword)));
        assert!(matches!(dashboard.delete_report(1).await, Err(ClientError::MissingPassword)));
        assert!(matches!(
            dashboard.batch_delete(&[1, 2]).await,
            Err(ClientError::MissingPassword)
        ));
        assert_eq!(api.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unauthorized_leaves_session_intact() {
        let (dashboard, _, storage) = dashboard(FakeApi {
            unauthorized: true,
            ..FakeApi::default()
        });
        dashboard.credentials().save("admin", "stale");

        let crawl = dashboard.crawl().await.unwrap_err();
        let delete = dashboard.delete_report(3).await.unwrap_err();
        assert!(matches!(crawl, ClientError::Unauthorized));
        assert!(matches!(delete, ClientError::Unauthorized));
        assert!(storage.get_item(AUTH_KEY).is_some());
        assert!(dashboard.credentials().require().is_ok());
        assert!(!dashboard.crawl_progress().active);
    }

    #[tokio::test]
    async fn batch_delete_tallies_and_refreshes_once() {
        let (dashboard, api, _) = dashboard(FakeApi {
            history: vec![1, 2, 3, 4, 5],
            failing_deletes: HashSet::from([2, 5]),
            ..FakeApi::default()
        });
        dashboard.credentials().save("admin", "secret");

        let report = dashboard.batch_delete(&[1, 2, 3, 4, 5]).await.unwrap();
        assert_eq!(
            report,
            BatchDeleteReport {
                requested: 5,
                succeeded: 3,
                failed: 2
            }
        );
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*api.deleted.lock().unwrap(), vec![1, 3, 4]);
    }

    #[tokio::test]
    async fn batch_delete_rejected_upstream_asks_for_login() {
        let (dashboard, api, storage) = dashboard(FakeApi {
            unauthorized: true,
            history: vec![1, 2],
            ..FakeApi::default()
        });
        dashboard.credentials().save("admin", "stale");

        let result = dashboard.batch_delete(&[1, 2]).await;
        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 2);
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
        assert!(storage.get_item(AUTH_KEY).is_some());
    }

    #[tokio::test]
    async fn batch_delete_requires_selection() {
        let (dashboard, api, _) = dashboard_ok();
        dashboard.credentials().save("admin", "secret");
        assert!(matches!(
            dashboard.batch_delete(&[]).await,
            Err(ClientError::EmptySelection)
        ));
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn history_requires_session_and_filters() {
        let (dashboard, api, _) = dashboard(FakeApi {
            history: vec![10, 11],
            ..FakeApi::default()
        });
        assert!(matches!(dashboard.history(None).await, Err(ClientError::NotLoggedIn)));
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);

        dashboard.credentials().save("admin", "secret");
        assert_eq!(dashboard.history(None).await.unwrap().len(), 2);
        let found = dashboard.history(Some("report 11")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 11);
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn crawl_success_reloads_latest() {
        let (dashboard, api, _) = dashboard(FakeApi {
            latest: vec!["A", "B"],
            ..FakeApi::default()
        });
        dashboard.credentials().save("admin", "secret");

        let notice = dashboard.crawl().await.unwrap();
        assert_eq!(notice.message, "crawl complete");
        assert_eq!(api.update_calls.load(Ordering::SeqCst), 1);
        assert_eq!(dashboard.current_repositories().await.len(), 2);
        assert!(!dashboard.crawl_progress().active);
    }
}
