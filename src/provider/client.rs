use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use crate::config::ProviderConfig;
use crate::error::{CheckerError, ConfigError, ProcessingError, ProviderError, Result};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{Address, FloorPriceResponse, Page};
use crate::provider::fetcher::{CollectionQuery, SpamFilter};
use crate::retry::{RetryConfig, RetryManager};

const GET_NFTS: &str = "getNFTs";
const GET_FLOOR_PRICE: &str = "getFloorPrice";

/// Subset of token metadata read when looking for an ENS name's image
#[derive(Debug, Deserialize)]
struct TokenMetadataDocument {
    #[serde(default)]
    image_url: Option<String>,
}

/// HTTP client for the Alchemy NFT API.
/// The API key is part of every URL, so it is redacted before anything is logged.
#[derive(Clone)]
pub struct AlchemyClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_seconds: u64,
    page_retry: RetryConfig,
    price_retry: RetryConfig,
}

impl AlchemyClient {
    /// Build a client from the provider section.
    /// Fails with `MissingCredential` before any request can be made without a key.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        Url::parse(&config.base_url)
            .map_err(|_| ConfigError::InvalidUrl(config.base_url.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(ProviderError::Http)?;

        let context = LogContext::new("provider_client", "initialization")
            .with_metadata("base_url", serde_json::json!(config.base_url))
            .with_metadata("timeout_seconds", serde_json::json!(config.timeout_seconds));
        context.debug("Initializing NFT API client");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_seconds: config.timeout_seconds,
            page_retry: RetryConfig::for_pages(config),
            price_retry: RetryConfig::for_price_lookup(config),
        })
    }

    /// Override the retry policies, mostly useful in tests
    pub fn with_retry(mut self, page_retry: RetryConfig, price_retry: RetryConfig) -> Self {
        self.page_retry = page_retry;
        self.price_retry = price_retry;
        self
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let raw = format!("{}/{}/{}", self.base_url, self.api_key, endpoint);
        Url::parse(&raw)
            .map_err(|_| ConfigError::InvalidUrl(self.redact(&raw)).into())
    }

    /// Build the owned-tokens query for one owner.
    /// `ExcludeSpam` adds the provider's `filters[]=SPAM` parameter.
    pub fn nft_query(&self, owner: &Address, filter: SpamFilter) -> Result<CollectionQuery> {
        let mut url = self.endpoint_url(GET_NFTS)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("owner", owner.as_str());
            pairs.append_pair("withMetadata", "true");
            if filter == SpamFilter::ExcludeSpam {
                pairs.append_pair("filters[]", "SPAM");
            }
        }

        // Same logical query; the continuation token is appended per page
        Ok(CollectionQuery::new(filter.label(), url.clone(), url))
    }

    pub fn floor_price_url(&self, contract_address: &str) -> Result<Url> {
        let mut url = self.endpoint_url(GET_FLOOR_PRICE)?;
        url.query_pairs_mut().append_pair("contractAddress", contract_address);
        Ok(url)
    }

    /// Fetch and decode one collection page, retrying transient failures
    pub async fn get_page(&self, url: &Url) -> Result<Page> {
        let retry = RetryManager::new(GET_NFTS, self.page_retry.clone());
        retry.execute(|| self.get_json::<Page>(url, GET_NFTS)).await
    }

    /// Fetch the floor price quotes for one contract
    pub async fn get_floor_price(&self, contract_address: &str) -> Result<FloorPriceResponse> {
        let url = self.floor_price_url(contract_address)?;
        let retry = RetryManager::new(GET_FLOOR_PRICE, self.price_retry.clone());
        retry.execute(|| self.get_json::<FloorPriceResponse>(&url, GET_FLOOR_PRICE)).await
    }

    /// Read `image_url` from a token's metadata document
    pub async fn get_image_url(&self, raw_token_uri: &str) -> Result<Option<String>> {
        let url = Url::parse(raw_token_uri)
            .map_err(|e| ProcessingError::MalformedResponse(format!("token URI {}: {}", raw_token_uri, e)))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                log::debug!("Skipping image lookup for unsupported scheme {}", scheme);
                return Ok(None);
            }
        }

        let document: TokenMetadataDocument = self.get_json(&url, "tokenMetadata").await?;
        Ok(document.image_url.filter(|image| !image.is_empty()))
    }

    /// Single GET attempt with error classification
    async fn get_json<T: DeserializeOwned>(&self, url: &Url, endpoint: &str) -> Result<T> {
        let context = LogContext::new("provider_client", "get_json")
            .with_metadata("endpoint", serde_json::json!(endpoint))
            .with_metadata("url", serde_json::json!(self.redact(url.as_str())));
        context.trace(&format!("Sending {} request", endpoint));

        let monitor = PerformanceMonitor::new(&format!("provider_{}", endpoint));
        let result = self.send(url, endpoint).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_provider_call(endpoint, duration, result.is_ok());

        let body = result?;
        serde_json::from_str(&body).map_err(|e| {
            CheckerError::Processing(ProcessingError::MalformedResponse(
                format!("{} response could not be decoded: {}", endpoint, e)
            ))
        })
    }

    async fn send(&self, url: &Url, endpoint: &str) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(1);
            return Err(ProviderError::RateLimit { seconds }.into());
        }
        if !status.is_success() {
            return Err(ProviderError::RequestFailed {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            }.into());
        }

        response.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, error: reqwest::Error) -> CheckerError {
        let error = error.without_url();
        if error.is_timeout() {
            ProviderError::Timeout { seconds: self.timeout_seconds }.into()
        } else if error.is_connect() {
            ProviderError::Connection(error.to_string()).into()
        } else {
            ProviderError::Http(error).into()
        }
    }

    /// Replace the API key in a URL with asterisks
    pub fn redact(&self, url: &str) -> String {
        url.replace(&self.api_key, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AlchemyClient {
        let config = ProviderConfig {
            api_key: Some("secret-key".to_string()),
            ..ProviderConfig::default()
        };
        AlchemyClient::new(&config).unwrap()
    }

    #[test]
    fn test_missing_key_rejected() {
        let result = AlchemyClient::new(&ProviderConfig::default());
        assert!(matches!(
            result,
            Err(CheckerError::Config(ConfigError::MissingCredential(_)))
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = ProviderConfig {
            base_url: "not a url".to_string(),
            api_key: Some("secret-key".to_string()),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            AlchemyClient::new(&config),
            Err(CheckerError::Config(ConfigError::InvalidUrl(_)))
        ));
    }

    #[test]
    fn test_nft_query_urls() {
        let client = test_client();
        let owner = Address::Ens("vitalik.eth".to_string());

        let clean = client.nft_query(&owner, SpamFilter::ExcludeSpam).unwrap();
        let url = clean.initial_url.as_str();
        assert!(url.starts_with("https://eth-mainnet.g.alchemy.com/nft/v2/secret-key/getNFTs?"));
        assert!(url.contains("owner=vitalik.eth"));
        assert!(url.contains("withMetadata=true"));
        assert!(url.contains("filters%5B%5D=SPAM"));

        let all = client.nft_query(&owner, SpamFilter::IncludeSpam).unwrap();
        assert!(!all.initial_url.as_str().contains("SPAM"));
        assert_eq!(all.initial_url, all.pagination_url);
    }

    #[test]
    fn test_floor_price_url() {
        let client = test_client();
        let url = client.floor_price_url("0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d").unwrap();
        assert_eq!(
            url.as_str(),
            "https://eth-mainnet.g.alchemy.com/nft/v2/secret-key/getFloorPrice?contractAddress=0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"
        );
    }

    #[test]
    fn test_redaction() {
        let client = test_client();
        let url = client.floor_price_url("0xabc").unwrap();
        let redacted = client.redact(url.as_str());
        assert!(!redacted.contains("secret-key"));
        assert!(redacted.contains("/***/getFloorPrice"));
    }
}
