//! Destination stores, and the reconciliation that makes them match a list of records
//!
//! Reconciliation is always a full replace: the destination is wiped, then every record is written.
//! Nothing is diffed, and nothing is rolled back if the run is interrupted after the wipe.

use serde::Serialize;

use crate::error::SyncResult;
use crate::sync::sync_progress::{SyncEvent, SyncProgress};
use crate::traits::{Reconciler, WriteOutcome};
use crate::vcard::ContactRecord;

pub mod carddav;
pub use carddav::AddressBook;
pub mod local_table;
pub use local_table::LocalTable;
pub mod vcf_file;
pub use vcf_file::VcfFile;

/// What happened when records have been written to a destination
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Replace the content of `destination` with `records`.
///
/// Per-record failures are counted in the returned report. Only a failure to wipe (or to finalize) the destination,
/// or a fatal error, is returned as an `Err`.
pub async fn reconcile(destination: &mut dyn Reconciler, records: &[ContactRecord], progress: &mut SyncProgress) -> SyncResult<ImportReport> {
    let name = destination.name();
    let mut report = ImportReport::default();

    progress.info(&format!("Removing every existing entry from {}", name));
    let wipe = destination.wipe().await?;
    progress.info(&format!("{} entries removed from {}", wipe.removed, name));
    for err in wipe.errors {
        progress.error(&err);
        report.errors.push(err);
    }

    let total = records.len();
    for (index, record) in records.iter().enumerate() {
        let description = record.full_name().unwrap_or_else(|| "<no name>".to_string());
        progress.feedback(SyncEvent::InProgress{
            step: "writing".to_string(),
            items_done_already: index,
            total,
            details: description.clone(),
        });

        match destination.write(record).await {
            Ok(WriteOutcome::Written) => {
                progress.debug(&format!("*   {} written to {}", description, name));
                report.imported += 1;
            },
            Ok(WriteOutcome::Skipped(reason)) => {
                progress.warn(&format!("Skipping {}: {}", description, reason));
                report.skipped += 1;
            },
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                progress.error(&format!("Unable to write {}: {}", description, err));
                report.errors.push(err.to_string());
            },
        }
    }

    destination.finish().await?;
    progress.info(&format!("{} records written to {}", report.imported, name));
    Ok(report)
}
