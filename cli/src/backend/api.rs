//! HTTP API backend.
//!
//! Talks to the media gateway REST endpoints under `/mgw/api/blacklists`.
//! Listings are paginated; entry removal is a deactivate followed by a
//! delete, and both must succeed. Entries the listing reports as inactive
//! skip the deactivate.

use crate::auth::AuthToken;
use async_trait::async_trait;
use blacklist_engine::{
    error::Result, Backend, Collection, CollectionId, Dispatch, Error, Member, MemberId,
    RemovalKeying,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BLACKLISTS_PATH: &str = "/mgw/api/blacklists";

/// Page size when listing blacklists.
pub const BLACKLIST_PAGE_SIZE: u32 = 100;

/// Connection settings for the API backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8877`
    pub base_url: String,
    /// Authorization header value
    pub token: AuthToken,
    /// Page size when listing entries
    pub page_size: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a config with default paging and timeout.
    pub fn new(base_url: impl Into<String>, token: AuthToken) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            page_size: 1000,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the entry listing page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One page of a listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    content: Vec<T>,
    #[serde(default)]
    last: Option<bool>,
    #[serde(default)]
    total_pages: Option<u32>,
}

impl<T> Page<T> {
    /// Whether page `number` of size `size` is the final one.
    fn is_last(&self, number: u32, size: u32) -> bool {
        if let Some(last) = self.last {
            return last;
        }
        if let Some(total) = self.total_pages {
            return number + 1 >= total;
        }
        (self.content.len() as u32) < size
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct BlacklistDto {
    id: CollectionId,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct EntryDto {
    id: MemberId,
    msisdn: String,
    #[serde(default)]
    active: Option<bool>,
}

impl From<EntryDto> for Member {
    fn from(dto: EntryDto) -> Self {
        Member {
            id: dto.id,
            msisdn: dto.msisdn,
            active: dto.active,
        }
    }
}

/// Request body for creating an entry.
#[derive(Debug, Serialize)]
struct CreateEntryRequest<'a> {
    msisdn: &'a str,
    description: Option<String>,
    username: Option<String>,
}

/// Backend speaking to the REST API.
#[derive(Debug)]
pub struct ApiBackend {
    client: Client,
    config: ApiConfig,
}

impl ApiBackend {
    /// Create a new API backend.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        self.client
            .request(method, url)
            .header(AUTHORIZATION, self.config.token.as_str())
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<reqwest::Response> {
        builder.send().await.map_err(|e| {
            tracing::debug!(action, error = %e, "request failed");
            Error::Transport(format!("{}: {}", action, e))
        })
    }

    /// Fetch one page of a listing endpoint.
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        number: u32,
        size: u32,
        sort_prop: &str,
    ) -> Result<Page<T>> {
        let action = format!("list {} page {}", path, number);
        let builder = self.request(Method::GET, path).query(&[
            ("page", number.to_string()),
            ("size", size.to_string()),
            ("sortDir", "ASC".to_string()),
            ("sortProp", sort_prop.to_string()),
        ]);

        let response = self.send(builder, &action).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::status(action, status.as_u16()));
        }

        response
            .json::<Page<T>>()
            .await
            .map_err(|e| Error::Decode(format!("{}: {}", action, e)))
    }

    /// A server that ignores `page` keeps answering with the same content.
    fn ensure_advanced<T: PartialEq>(
        previous: &Option<Vec<T>>,
        page: &Page<T>,
        path: &str,
        number: u32,
    ) -> Result<()> {
        if previous.as_ref() == Some(&page.content) {
            return Err(Error::Decode(format!(
                "{} page {} repeats the previous page",
                path, number
            )));
        }
        Ok(())
    }

    fn entries_path(collection: &Collection) -> String {
        format!("{}/{}/entries", BLACKLISTS_PATH, collection.id)
    }

    async fn expect_status(
        &self,
        builder: RequestBuilder,
        action: String,
        expected: StatusCode,
    ) -> Result<()> {
        let response = self.send(builder, &action).await?;
        let status = response.status();
        tracing::debug!(%action, status = status.as_u16(), "response");
        if status == expected {
            Ok(())
        } else {
            Err(Error::status(action, status.as_u16()))
        }
    }
}

#[async_trait]
impl Backend for ApiBackend {
    fn name(&self) -> &'static str {
        "api"
    }

    fn removal_keying(&self) -> RemovalKeying {
        RemovalKeying::ByMemberId
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Sequential
    }

    async fn resolve_collection(&self, name: &str) -> Result<Collection> {
        let mut number = 0;
        let mut previous = None;
        loop {
            let page: Page<BlacklistDto> = self
                .fetch_page(BLACKLISTS_PATH, number, BLACKLIST_PAGE_SIZE, "name")
                .await?;
            Self::ensure_advanced(&previous, &page, BLACKLISTS_PATH, number)?;

            if let Some(found) = page
                .content
                .iter()
                .map(|dto| Collection::new(dto.id, dto.name.clone()))
                .find(|c| c.matches_name(name))
            {
                tracing::debug!(id = found.id, name = %found.name, "blacklist resolved");
                return Ok(found);
            }

            if page.content.is_empty() || page.is_last(number, BLACKLIST_PAGE_SIZE) {
                return Err(Error::CollectionNotFound(name.to_string()));
            }
            previous = Some(page.content);
            number += 1;
        }
    }

    async fn list_members(&self, collection: &Collection) -> Result<Vec<Member>> {
        let path = Self::entries_path(collection);
        let size = self.config.page_size;
        let mut members = Vec::new();
        let mut number = 0;
        let mut previous = None;

        loop {
            let page: Page<EntryDto> = self.fetch_page(&path, number, size, "msisdn").await?;
            Self::ensure_advanced(&previous, &page, &path, number)?;
            let done = page.content.is_empty() || page.is_last(number, size);
            members.extend(page.content.iter().cloned().map(Member::from));
            if done {
                break;
            }
            previous = Some(page.content);
            number += 1;
        }

        Ok(members)
    }

    async fn create_member(&self, collection: &Collection, msisdn: &str) -> Result<()> {
        let body = CreateEntryRequest {
            msisdn,
            description: None,
            username: None,
        };
        let builder = self
            .request(Method::POST, &Self::entries_path(collection))
            .header(CONTENT_TYPE, "application/json")
            .json(&body);

        self.expect_status(builder, format!("create entry {}", msisdn), StatusCode::CREATED)
            .await
    }

    async fn remove_member(&self, collection: &Collection, member: &Member) -> Result<()> {
        let entry_path = format!("{}/{}", Self::entries_path(collection), member.id);

        if member.is_active() {
            let deactivate = self.request(Method::DELETE, &format!("{}/active", entry_path));
            self.expect_status(
                deactivate,
                format!("deactivate entry {}", member.id),
                StatusCode::OK,
            )
            .await?;
        } else {
            tracing::debug!(id = member.id, "entry already inactive");
        }

        let delete = self.request(Method::DELETE, &entry_path);
        self.expect_status(delete, format!("delete entry {}", member.id), StatusCode::OK)
            .await
    }
}
