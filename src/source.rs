//! Contact sources backed by local files

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::contact::SourceContact;
use crate::error::{SyncError, SyncResult};
use crate::traits::ContactSource;
use crate::vcard;

/// A JSON array of contacts, as exported from the cloud account
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl ContactSource for JsonFileSource {
    async fn fetch_contacts(&mut self) -> SyncResult<Vec<SourceContact>> {
        let file = std::fs::File::open(&self.path)
            .map_err(|err| SyncError::setup(format!("Unable to open file {:?}: {}", self.path, err)))?;
        let contacts: Vec<SourceContact> = serde_json::from_reader(std::io::BufReader::new(file))?;
        log::info!("{} contacts read from {:?}", contacts.len(), self.path);
        Ok(contacts)
    }
}


/// A `.vcf` file, e.g. a previous export. Every card is mapped back to a [`SourceContact`].
pub struct VcfFileSource {
    path: PathBuf,
}

impl VcfFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl ContactSource for VcfFileSource {
    async fn fetch_contacts(&mut self) -> SyncResult<Vec<SourceContact>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| SyncError::setup(format!("Unable to read file {:?}: {}", self.path, err)))?;

        let mut contacts = Vec::new();
        for parsed in vcard::parse_records(&content) {
            match parsed {
                Ok(record) => contacts.push(vcard::to_source_contact(&record)),
                Err(err) => log::warn!("Ignoring a vCard of {:?}: {}", self.path, err),
            }
        }
        log::info!("{} contacts read from {:?}", contacts.len(), self.path);
        Ok(contacts)
    }
}
