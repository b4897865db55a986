use reqwest::Url;
use crate::error::{CheckerError, ProcessingError, Result};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger};
use crate::models::Page;
use crate::provider::AlchemyClient;

/// Which side of the provider's spam classification a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamFilter {
    /// Non-spam tokens only
    ExcludeSpam,
    /// Every token, spam included
    IncludeSpam,
}

impl SpamFilter {
    pub fn label(self) -> &'static str {
        match self {
            SpamFilter::ExcludeSpam => "non_spam",
            SpamFilter::IncludeSpam => "all_tokens",
        }
    }
}

/// One logical owned-tokens query: where the first page lives and
/// which URL later pages hang their continuation token off.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub label: String,
    pub initial_url: Url,
    pub pagination_url: Url,
}

impl CollectionQuery {
    pub fn new(label: &str, initial_url: Url, pagination_url: Url) -> Self {
        Self {
            label: label.to_string(),
            initial_url,
            pagination_url,
        }
    }

    /// The pagination URL with `pageKey` appended
    pub fn continuation_url(&self, page_key: &str) -> Url {
        let mut url = self.pagination_url.clone();
        url.query_pairs_mut().append_pair("pageKey", page_key);
        url
    }
}

/// Pages collected for one query, plus the failure that stopped it early, if any
#[derive(Debug)]
pub struct FetchOutcome {
    pub pages: Vec<Page>,
    pub failure: Option<CheckerError>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Walk a query's pages until the provider stops handing out continuation tokens.
///
/// A provider failure (bad status, timeout, unreachable host) ends the walk:
/// the pages fetched so far are kept and the error is returned alongside them.
/// A body that cannot be decoded, or a continuation token that repeats the
/// previous one, aborts the query with an error instead.
pub async fn fetch_collection(client: &AlchemyClient, query: &CollectionQuery) -> Result<FetchOutcome> {
    let context = LogContext::new("fetcher", "fetch_collection")
        .with_query(&query.label);

    let mut pages: Vec<Page> = Vec::new();
    let mut next_url = query.initial_url.clone();
    let mut previous_key: Option<String> = None;

    loop {
        let page = match client.get_page(&next_url).await {
            Ok(page) => page,
            Err(error) => {
                ErrorLogger::log_error(
                    &error,
                    Some(LogContext::new("fetcher", "fetch_collection")
                        .with_query(&query.label)
                        .with_page_number(pages.len() + 1)),
                );
                if !error.is_fetch_failure() {
                    return Err(error);
                }
                return Ok(FetchOutcome { pages, failure: Some(error) });
            }
        };

        let continuation = page.continuation().map(str::to_string);
        MetricsLogger::log_page_fetched(&query.label, pages.len() + 1, page.token_count(), continuation.is_some());
        pages.push(page);

        match continuation {
            Some(page_key) if previous_key.as_deref() == Some(page_key.as_str()) => {
                return Err(ProcessingError::MalformedResponse(format!(
                    "{} page {} repeated continuation key {}",
                    query.label,
                    pages.len(),
                    page_key
                ))
                .into());
            }
            Some(page_key) => {
                context.debug(&format!("Next page found, key {}", page_key));
                next_url = query.continuation_url(&page_key);
                previous_key = Some(page_key);
            }
            None => break,
        }
    }

    context.info(&format!("Collected {} page(s)", pages.len()));
    Ok(FetchOutcome { pages, failure: None })
}
