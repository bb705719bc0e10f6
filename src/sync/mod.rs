//! This module drives a sync run: authenticate against the source, fetch its contacts, convert them to vCards,
//! and replace the content of a destination with them.
//!
//! A run goes through `Idle → Authenticating → Fetching → Converting → Reconciling → Done | Failed`.
//! Per-contact and per-record failures are counted, they never fail the run.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::contact::SourceContact;
use crate::destination::{reconcile, ImportReport};
use crate::error::{SyncError, SyncResult};
use crate::traits::{AuthStatus, ContactSource, Reconciler};
use crate::vcard::{self, ContactRecord};

pub mod sync_progress;
use sync_progress::{SyncEvent, SyncProgress};

/// The state of a sync run. Transitions only go forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Authenticating,
    /// Sub-state of `Authenticating`: the run is suspended until a code is sent through the second factor channel
    AwaitingSecondFactor,
    Fetching,
    Converting,
    Reconciling,
    Done,
    Failed,
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Idle => "Idle",
            RunState::Authenticating => "Authenticating",
            RunState::AwaitingSecondFactor => "Awaiting second factor",
            RunState::Fetching => "Fetching contacts",
            RunState::Converting => "Converting contacts",
            RunState::Reconciling => "Writing to the destination",
            RunState::Done => "Done",
            RunState::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

/// See [`second_factor_channel`]
pub type SecondFactorSender = oneshot::Sender<String>;
/// See [`second_factor_channel`]
pub type SecondFactorReceiver = oneshot::Receiver<String>;

/// Create the channel a caller uses to supply a second authentication factor to a run
pub fn second_factor_channel() -> (SecondFactorSender, SecondFactorReceiver) {
    oneshot::channel()
}


/// The vCards built out of a list of source contacts
#[derive(Clone, Debug, Default)]
pub struct ConversionReport {
    /// In the order of the source contacts
    pub records: Vec<ContactRecord>,
    pub skipped: usize,
}

/// Convert every contact. A contact that cannot be converted is counted as skipped.
pub fn convert_all(contacts: &[SourceContact], progress: &mut SyncProgress) -> ConversionReport {
    let mut report = ConversionReport::default();
    let total = contacts.len();

    for (index, contact) in contacts.iter().enumerate() {
        match vcard::build_from(contact) {
            Ok(record) => {
                let name = record.full_name().unwrap_or_default();
                progress.debug(&format!("{}/{} {}", index + 1, total, name));
                progress.feedback(SyncEvent::InProgress{
                    step: "converting".to_string(),
                    items_done_already: index + 1,
                    total,
                    details: name,
                });
                report.records.push(record);
            },
            Err(err) => {
                progress.warn(&format!("Skipping contact {}/{}: {}", index + 1, total, err));
                report.skipped += 1;
            },
        }
    }
    report
}


/// The outcome of a complete run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    /// Contacts converted to a vCard
    pub converted: usize,
    /// Contacts that could not be converted, plus records that the destination could not use
    pub skipped: usize,
    /// Records written to the destination
    pub imported: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new(conversion: &ConversionReport, import: ImportReport, started_at: DateTime<Utc>) -> Self {
        Self {
            converted: conversion.records.len(),
            skipped: conversion.skipped + import.skipped,
            imported: import.imported,
            errors: import.errors,
            started_at,
            finished_at: Utc::now(),
        }
    }
}


/// Drives a single sync run from a contact source to a destination
pub struct Orchestrator<S> {
    source: S,
    state: RunState,
    second_factor: Option<SecondFactorReceiver>,
}

impl<S: ContactSource> Orchestrator<S> {
    pub fn new(source: S) -> Self {
        Self { source, state: RunState::Idle, second_factor: None }
    }

    /// Give this run a way to receive a second authentication factor, in case the source asks for one
    pub fn with_second_factor(mut self, receiver: SecondFactorReceiver) -> Self {
        self.second_factor = Some(receiver);
        self
    }

    pub fn state(&self) -> RunState { self.state }
    pub fn source(&self) -> &S { &self.source }

    /// Bring a finished (or failed) run back to `Idle`, so that it can be started again
    pub fn reset(&mut self) -> SyncResult<()> {
        match self.state {
            RunState::Done | RunState::Failed | RunState::Idle => {
                self.state = RunState::Idle;
                Ok(())
            },
            actual => Err(SyncError::InvalidState{ expected: RunState::Done, actual }),
        }
    }

    fn transition(&mut self, state: RunState, progress: &mut SyncProgress) {
        progress.debug(&format!("Run state: {:?} -> {:?}", self.state, state));
        self.state = state;
        progress.feedback(SyncEvent::StateChanged(state));
    }

    /// Perform a complete run, writing to `destination`.
    ///
    /// Only a failure to authenticate, to fetch the contacts, or to prepare the destination returns an `Err`,
    /// and leaves this run in the `Failed` state.
    pub async fn run(&mut self, destination: &mut dyn Reconciler, progress: &mut SyncProgress) -> SyncResult<RunReport> {
        if self.state != RunState::Idle {
            return Err(SyncError::InvalidState{ expected: RunState::Idle, actual: self.state });
        }

        match self.run_inner(destination, progress).await {
            Ok(report) => {
                self.transition(RunState::Done, progress);
                progress.info(&format!("Sync ended: {} imported, {} skipped, {} errors",
                    report.imported, report.skipped, report.errors.len()));
                progress.feedback(SyncEvent::Finished{ success: report.errors.is_empty() });
                Ok(report)
            },
            Err(err) => {
                self.transition(RunState::Failed, progress);
                progress.error(&format!("Sync terminated because of an error: {}", err));
                progress.feedback(SyncEvent::Finished{ success: false });
                Err(err)
            },
        }
    }

    async fn run_inner(&mut self, destination: &mut dyn Reconciler, progress: &mut SyncProgress) -> SyncResult<RunReport> {
        let started_at = Utc::now();
        progress.info("Starting a sync.");

        self.transition(RunState::Authenticating, progress);
        self.authenticate(progress).await?;

        self.transition(RunState::Fetching, progress);
        let contacts = self.source.fetch_contacts().await
            .map_err(|err| as_setup_failure("unable to fetch the contacts", err))?;
        progress.info(&format!("{} contacts fetched", contacts.len()));

        self.transition(RunState::Converting, progress);
        let conversion = convert_all(&contacts, progress);
        progress.info(&format!("{} vCards built, {} contacts skipped", conversion.records.len(), conversion.skipped));

        self.transition(RunState::Reconciling, progress);
        let import = reconcile(destination, &conversion.records, progress).await?;

        Ok(RunReport::new(&conversion, import, started_at))
    }

    async fn authenticate(&mut self, progress: &mut SyncProgress) -> SyncResult<()> {
        let status = self.source.authenticate().await
            .map_err(|err| as_setup_failure("authentication failed", err))?;

        if status == AuthStatus::SecondFactorRequired {
            self.transition(RunState::AwaitingSecondFactor, progress);
            progress.feedback(SyncEvent::AwaitingSecondFactor);

            let receiver = self.second_factor.take()
                .ok_or_else(|| SyncError::setup("a second authentication factor is required, but none can be supplied"))?;
            let code = receiver.await
                .map_err(|_| SyncError::setup("the second authentication factor has not been supplied"))?;

            self.source.submit_second_factor(code.trim()).await
                .map_err(|err| as_setup_failure("second factor rejected", err))?;
        }
        progress.info("Authenticated");
        Ok(())
    }
}

impl<S: ContactSource + 'static> Orchestrator<S> {
    /// Perform the run on a background task, so that the caller stays responsive.
    ///
    /// Follow the progress through the feedback channel of `progress`. The orchestrator is handed back with the result.
    pub fn run_in_background(mut self, mut destination: Box<dyn Reconciler>, mut progress: SyncProgress) -> JoinHandle<(Self, SyncResult<RunReport>)> {
        tokio::spawn(async move {
            let result = self.run(destination.as_mut(), &mut progress).await;
            (self, result)
        })
    }
}

fn as_setup_failure(context: &str, err: SyncError) -> SyncError {
    match err {
        SyncError::FatalSetupFailure{ reason } => SyncError::setup(format!("{}: {}", context, reason)),
        other => SyncError::setup(format!("{}: {}", context, other)),
    }
}
