//! This module provides a client to connect to a CardDAV address book

use std::time::Duration;

use minidom::Element;
use once_cell::sync::Lazy;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::entry::{RemoteEntry, VersionTag};
use crate::error::{SyncError, SyncResult};
use crate::resource::Resource;
use crate::utils::{find_elem, find_elems};

static PROPFIND: Lazy<Method> = Lazy::new(|| {
    Method::from_bytes(b"PROPFIND").expect("cannot create PROPFIND method.")
});

static ETAGS_BODY: &str = r#"<?xml version="1.0"?>
    <d:propfind xmlns:d="DAV:">
       <d:prop>
           <d:getetag />
       </d:prop>
    </d:propfind>
"#;

/// The file suffix of the vCards uploaded to the collection
pub const VCARD_SUFFIX: &str = ".vcf";

/// The result of listing a collection
#[derive(Debug)]
pub enum Listing {
    Entries(Vec<RemoteEntry>),
    /// The server answered, but with a non-success status code
    Refused(StatusCode),
}


/// A client for a single CardDAV collection
pub struct Client {
    resource: Resource,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString, U: ToString>(url: S, username: T, password: U, timeout: Duration) -> SyncResult<Self> {
        let url = Url::parse(url.as_ref())?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SyncError::setup(format!("unable to build the HTTP client: {}", err)))?;

        Ok(Self{
            resource: Resource::new(url, username.to_string(), password.to_string()),
            http,
        })
    }

    pub fn collection_url(&self) -> &Url {
        self.resource.url()
    }

    /// The URL a vCard with this UID is stored at. A random name is generated when there is no UID.
    pub fn entry_url(&self, uid: Option<&str>) -> SyncResult<Url> {
        let name = match uid.map(|uid| sanitize_filename::sanitize(uid)) {
            Some(name) if name.is_empty() == false => name,
            _ => format!("generated-{}", uuid::Uuid::new_v4().to_hyphenated()),
        };
        self.resource.join(&format!("{}{}", name, VCARD_SUFFIX))
    }

    async fn sub_request(&self, url: &Url, body: String, depth: u32) -> SyncResult<reqwest::Response> {
        let res = self.http
            .request(PROPFIND.clone(), url.as_str())
            .header("Depth", depth)
            .header(CONTENT_TYPE, "application/xml")
            .basic_auth(self.resource.username(), Some(self.resource.password()))
            .body(body)
            .send()
            .await?;
        Ok(res)
    }

    /// List the entries of the collection, the collection itself excluded
    pub async fn list_entries(&self) -> SyncResult<Listing> {
        let url = self.resource.url();
        let res = self.sub_request(url, ETAGS_BODY.to_string(), 1).await?;

        let status = res.status();
        if status != StatusCode::OK && status != StatusCode::MULTI_STATUS {
            return Ok(Listing::Refused(status));
        }

        let text = res.text().await?;
        let entries = parse_listing(&text, &self.resource)?;
        log::debug!("{} entries found in {}", entries.len(), url);
        Ok(Listing::Entries(entries))
    }

    pub async fn delete(&self, url: &Url) -> SyncResult<()> {
        let del_response = self.http
            .delete(url.clone())
            .basic_auth(self.resource.username(), Some(self.resource.password()))
            .send()
            .await?;

        if del_response.status().is_success() == false {
            return Err(SyncError::transport(
                format!("DELETE {}", url),
                format!("Unexpected HTTP status code {:?}", del_response.status()),
            ));
        }
        Ok(())
    }

    /// Create or replace the vCard at `url`
    pub async fn put(&self, url: &Url, vcard: String) -> SyncResult<Option<VersionTag>> {
        let response = self.http
            .put(url.clone())
            .header(CONTENT_TYPE, "text/vcard")
            .basic_auth(self.resource.username(), Some(self.resource.password()))
            .body(vcard)
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT) == false {
            return Err(SyncError::transport(
                format!("PUT {}", url),
                format!("Unexpected HTTP status code {:?}", status),
            ));
        }

        let etag = response.headers()
            .get("ETag")
            .and_then(|etag| etag.to_str().ok())
            .map(|etag| VersionTag::from(etag.to_string()));
        Ok(etag)
    }
}

/// Extract the entries of a `multistatus` answer. Hrefs ending with a `/` are collections, and are ignored.
fn parse_listing(text: &str, resource: &Resource) -> SyncResult<Vec<RemoteEntry>> {
    let root: Element = text.parse()
        .map_err(|err| SyncError::transport(format!("PROPFIND {}", resource.url()), format!("invalid listing: {}", err)))?;

    let mut entries = Vec::new();
    for response in find_elems(&root, "response") {
        let href = match find_elem(response, "href") {
            None => {
                log::warn!("Unable to extract HREF");
                continue;
            },
            Some(h) => h.text(),
        };
        let href = href.trim();
        if href.is_empty() || href.ends_with('/') {
            continue;
        }

        let version_tag = find_elem(response, "getetag")
            .map(|etag| VersionTag::from(etag.text()));
        entries.push(RemoteEntry {
            url: resource.join(href)?,
            version_tag,
        });
    }
    Ok(entries)
}


#[cfg(test)]
mod tests {
    use super::*;

    const MULTISTATUS: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:">
    <d:response>
        <d:href>/dav/ab/</d:href>
        <d:propstat><d:prop><d:getetag/></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
    </d:response>
    <d:response>
        <d:href>/dav/ab/alice.vcf</d:href>
        <d:propstat><d:prop><d:getetag>"a1"</d:getetag></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
    </d:response>
    <d:response>
        <d:href>bob.vcf</d:href>
    </d:response>
</d:multistatus>"#;

    fn test_client() -> Client {
        Client::new("https://dav.example/dav/ab", "john", "pw", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn listing_skips_the_collection_itself() {
        let client = test_client();
        let entries = parse_listing(MULTISTATUS, &client.resource).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url.as_str(), "https://dav.example/dav/ab/alice.vcf");
        assert_eq!(entries[0].version_tag.as_ref().map(|v| v.as_str()), Some("\"a1\""));
        assert_eq!(entries[1].url.as_str(), "https://dav.example/dav/ab/bob.vcf");
        assert_eq!(entries[1].version_tag, None);
    }

    #[test]
    fn invalid_listing_is_a_transport_failure() {
        let client = test_client();
        let err = parse_listing("this is not XML", &client.resource).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TransportFailure);
    }

    #[test]
    fn entry_urls() {
        let client = test_client();
        assert_eq!(client.entry_url(Some("ABC-123")).unwrap().as_str(), "https://dav.example/dav/ab/ABC-123.vcf");
        assert_eq!(client.entry_url(Some("group/abc")).unwrap().as_str(), "https://dav.example/dav/ab/groupabc.vcf");

        let generated = client.entry_url(None).unwrap();
        assert!(generated.path().starts_with("/dav/ab/generated-"));
        assert!(generated.path().ends_with(".vcf"));
    }
}
