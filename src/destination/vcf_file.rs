//! A `.vcf` file holding every record, separated by blank lines

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};
use crate::traits::{Reconciler, WipeReport, WriteOutcome};
use crate::vcard::ContactRecord;

pub struct VcfFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl VcfFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), writer: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Reconciler for VcfFile {
    fn name(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn wipe(&mut self) -> SyncResult<WipeReport> {
        let existed = self.path.exists();
        let file = File::create(&self.path)
            .map_err(|err| SyncError::persistence(format!("unable to create {}", self.path.display()), err))?;
        self.writer = Some(BufWriter::new(file));
        Ok(WipeReport { removed: existed as usize, errors: Vec::new() })
    }

    async fn write(&mut self, record: &ContactRecord) -> SyncResult<WriteOutcome> {
        let path = &self.path;
        let writer = match self.writer.as_mut() {
            Some(w) => w,
            None => return Err(SyncError::setup(format!("{} has not been opened", path.display()))),
        };

        writer.write_all(record.to_vcard().as_bytes())
            .and_then(|_| writer.write_all(b"\r\n"))
            .map_err(|err| SyncError::persistence(format!("unable to write to {}", path.display()), err))?;
        Ok(WriteOutcome::Written)
    }

    async fn finish(&mut self) -> SyncResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()
                .map_err(|err| SyncError::persistence(format!("unable to write to {}", self.path.display()), err))?;
        }
        Ok(())
    }
}
