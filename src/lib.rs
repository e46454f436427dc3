//! TagSentry - Release Tag Notification Service
//!
//! TagSentry watches tracked GitHub repositories for newly published version
//! tags and broadcasts a one-shot email notification per repository through
//! the Mailchimp campaign API, while preventing duplicate notifications
//! across runs.
//!
//! ## Core Features
//!
//! - **Tag Discovery**: fresh upstream tag sets via the GitHub refs API
//! - **Duplicate Prevention**: per-repository tag records committed only
//!   after a notification is successfully sent
//! - **Campaign Lifecycle**: create, set content, send, then clean up the
//!   transient campaign with bounded backoff
//! - **Independent Processing**: one repository's failure never blocks the
//!   rest of the run
//!
//! ## Modules
//!
//! - [`config`]: Configuration and credential management
//! - [`tags`]: GitHub tag reference fetching
//! - [`store`]: Persistent per-repository tag tracking
//! - [`campaign`]: Mailchimp campaign API operations
//! - [`retry`]: Bounded retry with backoff for cleanup
//! - [`notify`]: Per-repository notification orchestration

pub mod campaign;
pub mod config;
pub mod notify;
pub mod retry;
pub mod store;
pub mod tags;

pub use campaign::{content_body, CampaignClient, CampaignError};
pub use config::{Config, Credentials};
pub use notify::{NotifyEngine, NotifyOutcome, NotifyStage, NotifySummary};
pub use retry::{delete_with_retry, retry_with_backoff, DELETE_BACKOFF};
pub use store::{RepoRecord, StoreError, TagStore};
pub use tags::{TagClient, TagFetchError, REFS_TAGS_PREFIX};
