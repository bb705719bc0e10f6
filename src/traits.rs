//! Traits used at the boundaries of a sync run: where contacts come from, and where vCards go to

use async_trait::async_trait;

use crate::contact::SourceContact;
use crate::error::{SyncError, SyncResult};
use crate::vcard::ContactRecord;

/// The outcome of an authentication attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Authenticated,
    /// A code (e.g. sent to a trusted device) must be supplied with [`ContactSource::submit_second_factor`]
    SecondFactorRequired,
}

#[async_trait]
pub trait ContactSource: Send {
    /// Authenticate against the source.
    /// Sources that need no credentials can keep this default implementation.
    async fn authenticate(&mut self) -> SyncResult<AuthStatus> {
        Ok(AuthStatus::Authenticated)
    }

    /// Complete an authentication that returned [`AuthStatus::SecondFactorRequired`]
    async fn submit_second_factor(&mut self, _code: &str) -> SyncResult<()> {
        Err(SyncError::setup("this source does not use a second factor"))
    }

    /// Returns every contact of this source, in the order of the source
    async fn fetch_contacts(&mut self) -> SyncResult<Vec<SourceContact>>;
}

/// Lets a caller pick its source at runtime
#[async_trait]
impl ContactSource for Box<dyn ContactSource> {
    async fn authenticate(&mut self) -> SyncResult<AuthStatus> {
        (**self).authenticate().await
    }

    async fn submit_second_factor(&mut self, code: &str) -> SyncResult<()> {
        (**self).submit_second_factor(code).await
    }

    async fn fetch_contacts(&mut self) -> SyncResult<Vec<SourceContact>> {
        (**self).fetch_contacts().await
    }
}


/// What happened when a destination has been wiped
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WipeReport {
    pub removed: usize,
    /// Entries that could not be removed, or the reason why nothing has been removed at all
    pub errors: Vec<String>,
}

/// What happened to a single record written to a destination
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome {
    Written,
    /// The record was not usable by this destination. It never reached the store.
    Skipped(String),
}

/// A destination store, whose content is replaced by every sync
///
/// Errors returned by `wipe` and `finish` abort the run.
/// Errors returned by `write` only concern the current record, unless they are [fatal](SyncError::is_fatal).
#[async_trait]
pub trait Reconciler: Send {
    /// A human-readable description of this destination, used in logs
    fn name(&self) -> String;

    /// Remove every entry of the destination
    async fn wipe(&mut self) -> SyncResult<WipeReport>;

    /// Store a single record
    async fn write(&mut self, record: &ContactRecord) -> SyncResult<WriteOutcome>;

    /// Called once every record has been written
    async fn finish(&mut self) -> SyncResult<()> {
        Ok(())
    }
}
