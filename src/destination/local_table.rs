//! The `friends` table of a local softphone database (e.g. Linphone's `friends.db`)
//!
//! Contacts are keyed by a SIP address built from their first phone number, so contacts without a usable
//! mobile or international number cannot be stored and are skipped.

use std::path::Path;

use async_trait::async_trait;
use bitflags::bitflags;
use rusqlite::{params, Connection};

use crate::entry::FriendRow;
use crate::error::{SyncError, SyncResult};
use crate::phone;
use crate::traits::{Reconciler, WipeReport, WriteOutcome};
use crate::vcard::{ContactRecord, Field};

/// The schema of the table, as created by the softphone. This crate never creates it on a real database.
pub const FRIENDS_TABLE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS friends (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    friend_list_id INTEGER,
    sip_uri TEXT NOT NULL,
    subscribe_policy INTEGER,
    send_subscribe INTEGER,
    ref_key TEXT,
    vCard TEXT,
    vCard_etag TEXT,
    vCard_url TEXT,
    presence_received INTEGER
)";

const DEFAULT_FRIEND_LIST_ID: i64 = 1;
const DEFAULT_SUBSCRIBE_POLICY: i64 = 0;
const FRIEND_VCARD_VERSION: &str = "4.0";

bitflags! {
    /// Presence flags stored with every friend
    pub struct FriendPolicy: u8 {
        const SEND_SUBSCRIBE = 0b01;
        const PRESENCE_RECEIVED = 0b10;
    }
}

impl Default for FriendPolicy {
    fn default() -> Self {
        FriendPolicy::SEND_SUBSCRIBE | FriendPolicy::PRESENCE_RECEIVED
    }
}


pub struct LocalTable {
    conn: Connection,
    sip_domain: String,
    policy: FriendPolicy,
    in_batch: bool,
}

impl LocalTable {
    /// Open an existing database. A missing file is an error: the softphone must have created it.
    pub fn open<P: AsRef<Path>>(path: P, sip_domain: &str) -> SyncResult<Self> {
        let path = path.as_ref();
        if path.exists() == false {
            return Err(SyncError::setup(format!("SQLite database not found: {}", path.display())));
        }
        let conn = Connection::open(path)
            .map_err(|err| SyncError::setup(format!("unable to open {}: {}", path.display(), err)))?;
        Ok(Self::from_connection(conn, sip_domain))
    }

    pub fn from_connection(conn: Connection, sip_domain: &str) -> Self {
        Self {
            conn,
            sip_domain: sip_domain.to_string(),
            policy: FriendPolicy::default(),
            in_batch: false,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Every row of the table
    pub fn friends(&self) -> SyncResult<Vec<FriendRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT friend_list_id, sip_uri, subscribe_policy, send_subscribe, ref_key, vCard, vCard_etag, vCard_url, presence_received
             FROM friends ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FriendRow {
                    friend_list_id: row.get(0)?,
                    sip_uri: row.get(1)?,
                    subscribe_policy: row.get(2)?,
                    send_subscribe: row.get::<_, i64>(3)? != 0,
                    ref_key: row.get(4)?,
                    vcard: row.get(5)?,
                    vcard_etag: row.get(6)?,
                    vcard_url: row.get(7)?,
                    presence_received: row.get::<_, i64>(8)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert(&self, sip_uri: &str, vcard: &str) -> SyncResult<()> {
        self.conn.execute(
            "INSERT INTO friends (
                friend_list_id, sip_uri, subscribe_policy, send_subscribe,
                ref_key, vCard, vCard_etag, vCard_url, presence_received
            ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, NULL, NULL, ?6)",
            params![
                DEFAULT_FRIEND_LIST_ID,
                sip_uri,
                DEFAULT_SUBSCRIBE_POLICY,
                self.policy.contains(FriendPolicy::SEND_SUBSCRIBE) as i32,
                vcard,
                self.policy.contains(FriendPolicy::PRESENCE_RECEIVED) as i32,
            ],
        ).map_err(|err| SyncError::persistence(format!("INSERT {}", sip_uri), err))?;
        Ok(())
    }
}

/// The minimal vCard stored alongside a friend
pub fn friend_vcard(record: &ContactRecord, number: &str, sip_uri: &str) -> ContactRecord {
    let full_name = record.full_name()
        .filter(|name| name.trim().is_empty() == false)
        .unwrap_or_else(|| number.to_string());

    let mut card = ContactRecord::new();
    card.push(Field::raw("VERSION", FRIEND_VCARD_VERSION));
    card.push(Field::raw("IMPP", sip_uri));
    card.push(Field::text("FN", &full_name));
    if let Some(email) = record.emails().into_iter().find(|e| e.is_empty() == false) {
        card.push(Field::text("EMAIL", &email));
    }
    if let Some(org) = record.organization() {
        card.push(Field::text("ROLE", &org));
    }
    card
}

#[async_trait]
impl Reconciler for LocalTable {
    fn name(&self) -> String {
        match self.conn.path() {
            Some(path) => format!("friends table of {}", path),
            None => "friends table".to_string(),
        }
    }

    async fn wipe(&mut self) -> SyncResult<WipeReport> {
        let tx = self.conn.transaction()
            .map_err(|err| SyncError::persistence("BEGIN", err))?;
        let removed = tx.execute("DELETE FROM friends", [])
            .map_err(|err| SyncError::persistence("DELETE FROM friends", err))?;
        tx.commit()
            .map_err(|err| SyncError::persistence("COMMIT", err))?;
        log::info!("All {} existing friends have been removed", removed);
        Ok(WipeReport { removed, errors: Vec::new() })
    }

    async fn write(&mut self, record: &ContactRecord) -> SyncResult<WriteOutcome> {
        let raw_number = match record.phones().into_iter().next() {
            None => return Ok(WriteOutcome::Skipped("contact has no phone number".to_string())),
            Some(number) => number,
        };
        let number = match phone::normalize(&raw_number) {
            None => return Ok(WriteOutcome::Skipped(format!("invalid phone number {:?}", raw_number))),
            Some(number) => number,
        };
        let sip_uri = phone::sip_uri(&number, &self.sip_domain);
        let vcard = friend_vcard(record, &number, &sip_uri).to_vcard();

        if self.in_batch == false {
            self.conn.execute_batch("BEGIN")
                .map_err(|err| SyncError::persistence("BEGIN", err))?;
            self.in_batch = true;
        }

        self.insert(&sip_uri, &vcard)?;
        log::info!("Contact ready: {} -> {}", record.full_name().unwrap_or_default(), sip_uri);
        Ok(WriteOutcome::Written)
    }

    async fn finish(&mut self) -> SyncResult<()> {
        if self.in_batch {
            self.conn.execute_batch("COMMIT")
                .map_err(|err| SyncError::persistence("COMMIT", err))?;
            self.in_batch = false;
        }
        Ok(())
    }
}
