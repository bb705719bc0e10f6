use url::Url;

use crate::error::SyncResult;

/// Just a wrapper around a collection URL and credentials
#[derive(Clone)]
pub struct Resource {
    url: Url,
    username: String,
    password: String,
}

impl Resource {
    /// The URL is made to end with a `/`, so that relative hrefs resolve inside the collection
    pub fn new(mut url: Url, username: String, password: String) -> Self {
        if url.path().ends_with('/') == false {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Self { url, username, password }
    }

    pub fn url(&self) -> &Url { &self.url }
    pub fn username(&self) -> &String { &self.username }
    pub fn password(&self) -> &String { &self.password }

    /// Resolve an href (absolute path or path relative to the collection) against the collection URL
    pub fn join(&self, href: &str) -> SyncResult<Url> {
        Ok(self.url.join(href)?)
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .finish()
    }
}
