use async_trait::async_trait;

use crate::client::{Client, Listing};
use crate::error::{SyncError, SyncResult};
use crate::traits::{Reconciler, WipeReport, WriteOutcome};
use crate::vcard::ContactRecord;


/// A CardDAV address book (a collection of vCards on a server)
pub struct AddressBook {
    client: Client,
}

impl AddressBook {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Reconciler for AddressBook {
    fn name(&self) -> String {
        format!("address book {}", self.client.collection_url())
    }

    /// A listing that the server refuses is reported, but does not prevent the records from being uploaded.
    /// A listing that cannot be performed at all (unreachable server, timeout...) aborts the run.
    async fn wipe(&mut self) -> SyncResult<WipeReport> {
        let entries = match self.client.list_entries().await? {
            Listing::Entries(entries) => entries,
            Listing::Refused(status) => {
                let msg = format!("PROPFIND {}: Unexpected HTTP status code {:?}, existing entries have not been removed",
                    self.client.collection_url(), status);
                log::warn!("{}", msg);
                return Ok(WipeReport { removed: 0, errors: vec![msg] });
            },
        };

        let mut report = WipeReport::default();
        for entry in entries {
            match self.client.delete(&entry.url).await {
                Ok(()) => {
                    log::debug!("Deleted {} (version {:?})", entry.url, entry.version_tag);
                    report.removed += 1;
                },
                Err(err) => {
                    log::warn!("Unable to delete {}: {}", entry.url, err);
                    report.errors.push(err.to_string());
                },
            }
        }
        Ok(report)
    }

    async fn write(&mut self, record: &ContactRecord) -> SyncResult<WriteOutcome> {
        if record.is_valid() == false {
            return Ok(WriteOutcome::Skipped("vCard has no FN".to_string()));
        }

        let uid = record.uid();
        let url = self.client.entry_url(uid.as_deref())
            .map_err(|err| SyncError::malformed(uid.as_deref().unwrap_or("<no uid>"), err))?;

        let etag = self.client.put(&url, record.to_vcard()).await?;
        log::debug!("Uploaded {} (version {:?})", url, etag);
        Ok(WriteOutcome::Written)
    }
}
