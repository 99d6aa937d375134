//! Configuration for the expense list and the REST client.

use std::{str::FromStr, time::Duration};

use crate::{Error, page::PageSize};

/// How the list catches up with the server after an expense is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteStrategy {
    /// Fetch the current page again and take the server's totals.
    #[default]
    Refetch,
    /// Remove the record from the displayed page and adjust the totals locally.
    ///
    /// The previous page is fetched if the current page becomes empty.
    LocalSplice,
}

impl FromStr for DeleteStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refetch" => Ok(Self::Refetch),
            "local-splice" | "splice" => Ok(Self::LocalSplice),
            other => Err(format!(
                "unknown delete strategy \"{other}\", expected \"refetch\" or \"local-splice\""
            )),
        }
    }
}

/// The config for the expense list.
#[derive(Debug, Clone)]
pub struct ListConfig {
    /// The page sizes the user may choose from.
    pub page_sizes: Vec<u64>,
    /// The page size to start with. Must be one of `page_sizes`.
    pub default_page_size: u64,
    /// The maximum number of page links to show in the pagination indicator.
    pub max_page_links: u64,
    /// How to update the list after a delete.
    pub delete_strategy: DeleteStrategy,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_sizes: vec![10, 25],
            default_page_size: 10,
            max_page_links: 5,
            delete_strategy: DeleteStrategy::default(),
        }
    }
}

impl ListConfig {
    /// Check that `size` is one of the configured page sizes.
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] if it is not.
    pub fn page_size(&self, size: u64) -> Result<PageSize, Error> {
        PageSize::try_new(size, &self.page_sizes)
    }

    /// The configured default page size.
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] if the default is not one of the
    /// configured page sizes.
    pub fn default_page_size(&self) -> Result<PageSize, Error> {
        self.page_size(self.default_page_size)
    }
}

/// The config for talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// The URL the API is served under, without a trailing slash,
    /// e.g. "http://localhost:8080/api".
    pub base_url: String,
    /// How long to wait for a response before giving up.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Create a config for the API at `base_url`, ignoring any trailing slashes.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            ..Self::default()
        }
    }

    /// The full URL for `path`, which must start with a slash.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
