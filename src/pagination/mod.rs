//! Pagination over paged API responses.
//!
//! A paged response carries one page of items under a resource key and a
//! `pages` object whose `next_page` is the absolute URL of the following
//! page. [`Paginator`] walks the pages one request at a time.

use crate::client::RequestExecutor;
use crate::decode::ResponseParser;
use crate::errors::{CalendarError, CalendarResult};
use crate::transport::HttpMethod;
use crate::types::Pages;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use tracing::debug;

enum State<T> {
    Unfetched {
        path: String,
        query: Vec<(String, String)>,
    },
    HasCurrentPage {
        items: VecDeque<T>,
        next_page: Option<String>,
    },
    Exhausted,
}

/// Iterator over the items of a paged resource.
///
/// Pages are fetched lazily, never ahead of need, and are not cached; a
/// paginator is consumed by iterating it. Any failure to fetch a page is
/// returned once and ends the iteration.
pub struct Paginator<'a, T> {
    executor: &'a RequestExecutor,
    attribute: &'static str,
    state: State<T>,
    pages: Option<Pages>,
}

impl<'a, T: DeserializeOwned> Paginator<'a, T> {
    /// Creates a paginator whose first page is at `path`.
    ///
    /// Nothing is fetched until the first item is requested.
    pub fn new(
        executor: &'a RequestExecutor,
        path: impl Into<String>,
        query: Vec<(String, String)>,
        attribute: &'static str,
    ) -> Self {
        Self {
            executor,
            attribute,
            state: State::Unfetched {
                path: path.into(),
                query,
            },
            pages: None,
        }
    }

    /// Creates a paginator and fetches its first page.
    ///
    /// Errors of the initial request surface here rather than on iteration.
    pub async fn start(
        executor: &'a RequestExecutor,
        path: impl Into<String>,
        query: Vec<(String, String)>,
        attribute: &'static str,
    ) -> CalendarResult<Self> {
        let mut paginator = Self::new(executor, path, query, attribute);
        paginator.fetch_first().await?;
        Ok(paginator)
    }

    async fn fetch_first(&mut self) -> CalendarResult<()> {
        if let State::Unfetched { path, query } = std::mem::replace(&mut self.state, State::Exhausted) {
            let response = self
                .executor
                .execute(HttpMethod::Get, &path, &query, None)
                .await?;
            self.load(&response.body)?;
        }
        Ok(())
    }

    fn load(&mut self, body: &str) -> CalendarResult<()> {
        let parser = ResponseParser::new(body);
        let items: Vec<T> = parser.parse_collection(Some(self.attribute))?;
        let pages: Option<Pages> = parser.parse_optional("pages")?;
        let next_page = pages.as_ref().and_then(|p| p.next_page.clone());

        debug!(
            attribute = self.attribute,
            items = items.len(),
            page = pages.as_ref().map(|p| p.current),
            has_next = next_page.is_some(),
            "Loaded page"
        );

        self.pages = pages;
        self.state = State::HasCurrentPage {
            items: items.into(),
            next_page,
        };
        Ok(())
    }

    /// Returns the next item, fetching the next page when needed.
    ///
    /// `Ok(None)` means every page has been read.
    pub async fn next_item(&mut self) -> CalendarResult<Option<T>> {
        loop {
            match std::mem::replace(&mut self.state, State::Exhausted) {
                State::Exhausted => return Ok(None),
                State::Unfetched { path, query } => {
                    self.state = State::Unfetched { path, query };
                    self.fetch_first().await?;
                }
                State::HasCurrentPage {
                    mut items,
                    next_page,
                } => {
                    if let Some(item) = items.pop_front() {
                        self.state = State::HasCurrentPage { items, next_page };
                        return Ok(Some(item));
                    }

                    match next_page {
                        Some(url) => {
                            let response = self.executor.execute_url(HttpMethod::Get, &url).await?;
                            self.load(&response.body)?;
                        }
                        None => return Ok(None),
                    }
                }
            }
        }
    }

    /// Page metadata of the most recently fetched page.
    pub fn pages(&self) -> Option<&Pages> {
        self.pages.as_ref()
    }

    /// Returns true once every item has been read or a fetch failed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted)
    }

    /// Reads every remaining item.
    pub async fn collect_all(mut self) -> CalendarResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Converts the paginator into a stream of items.
    pub fn into_stream(self) -> impl Stream<Item = CalendarResult<T>> + 'a
    where
        T: 'a,
    {
        stream::try_unfold(self, |mut paginator| async move {
            let item = paginator.next_item().await?;
            Ok::<_, CalendarError>(item.map(|item| (item, paginator)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialStore;
    use crate::config::CalendarConfig;
    use crate::errors::CalendarErrorKind;
    use crate::mocks::MockTransport;
    use crate::types::Calendar;
    use futures::TryStreamExt;
    use serde_json::json;
    use std::sync::Arc;

    fn executor(transport: Arc<MockTransport>) -> RequestExecutor {
        let credentials = Arc::new(CredentialStore::new());
        credentials.set("token", None);
        RequestExecutor::new(transport, Arc::new(CalendarConfig::default()), credentials)
    }

    fn page(ids: &[&str], next_page: Option<&str>) -> String {
        let calendars: Vec<_> = ids.iter().map(|id| json!({ "calendar_id": id })).collect();
        let mut pages = json!({ "current": 1, "total": 2 });
        if let Some(next) = next_page {
            pages["next_page"] = json!(next);
        }
        json!({ "pages": pages, "calendars": calendars }).to_string()
    }

    #[tokio::test]
    async fn test_walks_all_pages() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, &page(&["a", "b"], Some("https://api.example.com/v1/next/2")));
        transport.push_json(200, &page(&["c"], None));
        let executor = executor(transport.clone());

        let paginator: Paginator<'_, Calendar> =
            Paginator::start(&executor, "/v1/things", Vec::new(), "calendars")
                .await
                .unwrap();
        assert_eq!(transport.requests().len(), 1);

        let ids: Vec<String> = paginator
            .into_stream()
            .map_ok(|c| c.calendar_id)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(ids, vec!["a", "b", "c"]);
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].url, "https://api.example.com/v1/next/2");
        assert_eq!(requests[1].header_value("authorization"), Some("Bearer token"));
    }

    #[tokio::test]
    async fn test_failed_page_halts_iteration() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, &page(&["a"], Some("https://api.example.com/v1/next/2")));
        transport.push_json(404, "{}");
        let executor = executor(transport.clone());

        let mut paginator: Paginator<'_, Calendar> =
            Paginator::start(&executor, "/v1/things", Vec::new(), "calendars")
                .await
                .unwrap();

        assert_eq!(paginator.next_item().await.unwrap().unwrap().calendar_id, "a");
        let err = paginator.next_item().await.unwrap_err();
        assert_eq!(err.kind(), CalendarErrorKind::NotFound);
        assert!(paginator.is_exhausted());
        assert!(paginator.next_item().await.unwrap().is_none());
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_next_page_followed_without_page_counts() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &json!({
                "pages": { "current": 1, "next_page": "https://api.example.com/v1/next/2" },
                "calendars": [{ "calendar_id": "a" }]
            })
            .to_string(),
        );
        transport.push_json(200, &json!({ "calendars": [{ "calendar_id": "b" }] }).to_string());
        let executor = executor(transport.clone());

        let paginator: Paginator<'_, Calendar> =
            Paginator::start(&executor, "/v1/things", Vec::new(), "calendars")
                .await
                .unwrap();
        assert_eq!(paginator.pages().map(|p| p.total), Some(0));

        let ids: Vec<String> = paginator
            .collect_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.calendar_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_pages_is_decode_error() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(
            200,
            &json!({
                "pages": { "current": "first", "next_page": "https://api.example.com/v1/next/2" },
                "calendars": [{ "calendar_id": "a" }]
            })
            .to_string(),
        );
        let executor = executor(transport.clone());

        let err = Paginator::<'_, Calendar>::start(&executor, "/v1/things", Vec::new(), "calendars")
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), CalendarErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_next_page_on_another_host_is_refused() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, &page(&["a"], Some("https://elsewhere.example.net/v1/next/2")));
        let executor = executor(transport.clone());

        let mut paginator: Paginator<'_, Calendar> =
            Paginator::start(&executor, "/v1/things", Vec::new(), "calendars")
                .await
                .unwrap();

        assert!(paginator.next_item().await.unwrap().is_some());
        let err = paginator.next_item().await.unwrap_err();
        assert_eq!(err.kind(), CalendarErrorKind::Decode);
        assert!(paginator.is_exhausted());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_lazy_paginator_fetches_on_first_item() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, &page(&[], None));
        let executor = executor(transport.clone());

        let mut paginator: Paginator<'_, Calendar> =
            Paginator::new(&executor, "/v1/things", Vec::new(), "calendars");
        assert!(transport.requests().is_empty());

        assert!(paginator.next_item().await.unwrap().is_none());
        assert_eq!(paginator.pages().map(|p| p.total), Some(2));
        assert_eq!(transport.requests().len(), 1);
    }
}
