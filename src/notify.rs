//! Notify Engine - Orchestrates the per-repository notification pipeline
//!
//! For each tracked repository the engine fetches the current upstream tag
//! set, diffs it against the persisted record, and when new tags exist
//! drives a campaign through create -> content -> send. The record is
//! committed (with the full fetched set) only after a successful send, so
//! re-runs after success are no-ops and a failed send reproduces the same
//! new-tag set next run. Repositories are processed sequentially and
//! independently: one failure never stops the rest of the run.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::campaign::{CampaignClient, CampaignError};
use crate::config::Config;
use crate::retry::{delete_with_retry, DELETE_BACKOFF};
use crate::store::TagStore;
use crate::tags::TagClient;

/// Campaign lifecycle step at which a notification failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyStage {
    Create,
    Content,
    Send,
}

impl NotifyStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyStage::Create => "create",
            NotifyStage::Content => "content",
            NotifyStage::Send => "send",
        }
    }
}

/// Terminal outcome for one tracked repository
#[derive(Debug)]
pub enum NotifyOutcome {
    /// New tags were found, the notification went out, and the record
    /// now holds the full upstream tag set
    Notified {
        path: PathBuf,
        new_tags: Vec<String>,
    },
    /// No new tags; nothing was sent and nothing changed
    UpToDate { path: PathBuf },
    /// Tracking record could not be read
    LoadFailed { path: PathBuf, error: String },
    /// Upstream tag fetch failed; repository skipped for this run
    FetchFailed { path: PathBuf, error: String },
    /// Campaign lifecycle failed; any created campaign was cleaned up
    /// and the record left untouched
    CampaignFailed {
        path: PathBuf,
        stage: NotifyStage,
        error: String,
    },
    /// The email went out but persisting the record failed; the next run
    /// will re-notify for the same tags
    CommitFailed { path: PathBuf, error: String },
}

/// Results from a complete notification run
#[derive(Debug)]
pub struct NotifySummary {
    pub total_repositories: usize,
    pub notified: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub outcomes: Vec<NotifyOutcome>,
}

/// The main engine driving fetch, diff, campaign lifecycle, and commit
pub struct NotifyEngine {
    store: TagStore,
    tags: TagClient,
    campaigns: CampaignClient,
    delete_backoff: Vec<Duration>,
}

impl NotifyEngine {
    /// Create an engine from configuration
    ///
    /// Credentials and endpoints are taken from the config value rather
    /// than ambient state so tests can substitute fakes.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tagsentry/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            store: TagStore::new(&config.repos_dir),
            tags: TagClient::new(http.clone(), config.github_api_base()),
            campaigns: CampaignClient::new(
                http,
                config.campaign_api_base(),
                config.mailchimp.clone(),
            ),
            delete_backoff: DELETE_BACKOFF.to_vec(),
        })
    }

    /// Override the cleanup backoff schedule (tests use milliseconds)
    pub fn with_delete_backoff(mut self, delays: Vec<Duration>) -> Self {
        self.delete_backoff = delays;
        self
    }

    /// Process every tracked repository once, sequentially
    ///
    /// Only the inability to list the tracking directory is fatal; every
    /// per-repository failure is converted into an outcome and the run
    /// continues with the next repository.
    pub async fn run(&self) -> Result<NotifySummary> {
        let files = self
            .store
            .tracked_files()
            .context("Failed to list tracked repositories")?;

        info!("Checking {} tracked repositories", files.len());

        let mut outcomes = Vec::with_capacity(files.len());
        for path in &files {
            outcomes.push(self.process_repo(path).await);
        }

        let summary = compile_summary(outcomes);

        info!(
            "Run completed: {} notified, {} up to date, {} failed",
            summary.notified, summary.up_to_date, summary.failed
        );

        Ok(summary)
    }

    /// Run the full pipeline for a single tracking record
    async fn process_repo(&self, path: &Path) -> NotifyOutcome {
        let record = match self.store.load(path) {
            Ok(record) => record,
            Err(err) => {
                error!("Skipping {:?}: {}", path, err);
                return NotifyOutcome::LoadFailed {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                };
            }
        };

        let fetched = match self.tags.fetch_tags(&record.owner, &record.repo).await {
            Ok(fetched) => fetched,
            Err(err) => {
                error!("Tag fetch failed for {}: {}", record.full_name(), err);
                return NotifyOutcome::FetchFailed {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                };
            }
        };

        let new_tags = TagStore::new_tags(&record, &fetched);
        if new_tags.is_empty() {
            debug!("{} is up to date", record.full_name());
            return NotifyOutcome::UpToDate {
                path: path.to_path_buf(),
            };
        }

        info!(
            "Found {} new tag(s) for {}: {}",
            new_tags.len(),
            record.full_name(),
            new_tags.join(", ")
        );

        if let Err((stage, err)) = self.notify(&record.owner, &record.repo, &new_tags).await {
            error!(
                "Notification for {} failed at {}: {}",
                record.full_name(),
                stage.as_str(),
                err
            );
            return NotifyOutcome::CampaignFailed {
                path: path.to_path_buf(),
                stage,
                error: err.to_string(),
            };
        }

        match self.store.commit(path, &record, fetched) {
            Ok(()) => NotifyOutcome::Notified {
                path: path.to_path_buf(),
                new_tags,
            },
            Err(err) => {
                // The email is already out; the next run will re-notify.
                error!("Commit failed for {}: {}", record.full_name(), err);
                NotifyOutcome::CommitFailed {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                }
            }
        }
    }

    /// Drive one campaign through create -> content -> send
    ///
    /// The campaign is a transient resource: it is deleted (best-effort)
    /// after a successful send, and also when content or send fails so no
    /// half-built campaign lingers on the account.
    async fn notify(
        &self,
        owner: &str,
        repo: &str,
        new_tags: &[String],
    ) -> Result<(), (NotifyStage, CampaignError)> {
        let campaign_id = self
            .campaigns
            .create_campaign(owner, repo)
            .await
            .map_err(|err| (NotifyStage::Create, err))?;

        if let Err(err) = self
            .campaigns
            .set_content(&campaign_id, owner, repo, new_tags)
            .await
        {
            delete_with_retry(&self.campaigns, &campaign_id, &self.delete_backoff).await;
            return Err((NotifyStage::Content, err));
        }

        if let Err(err) = self.campaigns.send_campaign(&campaign_id).await {
            delete_with_retry(&self.campaigns, &campaign_id, &self.delete_backoff).await;
            return Err((NotifyStage::Send, err));
        }

        delete_with_retry(&self.campaigns, &campaign_id, &self.delete_backoff).await;
        Ok(())
    }
}

/// Compile a run summary from per-repository outcomes
fn compile_summary(outcomes: Vec<NotifyOutcome>) -> NotifySummary {
    let total_repositories = outcomes.len();
    let mut notified = 0;
    let mut up_to_date = 0;
    let mut failed = 0;

    for outcome in &outcomes {
        match outcome {
            NotifyOutcome::Notified { .. } => notified += 1,
            NotifyOutcome::UpToDate { .. } => up_to_date += 1,
            NotifyOutcome::LoadFailed { .. }
            | NotifyOutcome::FetchFailed { .. }
            | NotifyOutcome::CampaignFailed { .. }
            | NotifyOutcome::CommitFailed { .. } => failed += 1,
        }
    }

    NotifySummary {
        total_repositories,
        notified,
        up_to_date,
        failed,
        outcomes,
    }
}
