//! Entries persisted in a destination store

use serde::{Deserialize, Serialize};
use url::Url;


/// A VersionTag is basically a WebDAV `etag`. Whenever it changes, this means the data has changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTag {
    tag: String
}

impl From<String> for VersionTag {
    fn from(tag: String) -> VersionTag {
        Self { tag }
    }
}

impl VersionTag {
    /// Get the inner version tag (usually a WebDAV `etag`)
    pub fn as_str(&self) -> &str {
        &self.tag
    }
}


/// A vCard stored in a remote collection
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteEntry {
    pub url: Url,
    /// Some servers do not return an etag in listings
    pub version_tag: Option<VersionTag>,
}


/// A row of the local softphone `friends` table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FriendRow {
    pub friend_list_id: i64,
    pub sip_uri: String,
    pub subscribe_policy: i64,
    pub send_subscribe: bool,
    pub ref_key: Option<String>,
    pub vcard: String,
    pub vcard_etag: Option<String>,
    pub vcard_url: Option<String>,
    pub presence_received: bool,
}
