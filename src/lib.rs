//! This crate pushes contacts to a CardDAV address book, or to the local database of a softphone.
//!
//! Contacts come from a [`ContactSource`](traits::ContactSource) (e.g. a JSON export of a cloud account), are converted
//! to vCards by the [`vcard`] module, and are written to a [`Reconciler`](traits::Reconciler):
//! * a CardDAV collection, see [`destination::AddressBook`] and the [`client`] module,
//! * the `friends` table of a local SQLite database, see [`destination::LocalTable`],
//! * a plain `.vcf` file, see [`destination::VcfFile`].
//!
//! Every sync replaces the whole content of the destination. The [`sync::Orchestrator`] drives a complete run.

pub mod traits;
pub mod error;
pub use error::{ErrorKind, SyncError, SyncResult};

pub mod contact;
pub use contact::SourceContact;
pub mod entry;
pub mod vcard;
pub use vcard::ContactRecord;
pub mod phone;

pub mod client;
pub mod resource;
pub mod destination;
pub mod source;
pub mod sync;
pub use sync::Orchestrator;

pub mod config;
pub mod utils;
pub mod mock_behaviour;
