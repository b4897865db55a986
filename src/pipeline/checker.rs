use serde::Serialize;
use crate::config::ProviderConfig;
use crate::error::{CheckerError, Result};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{validate_address, Address, Page, PricedToken, TokenRecord};
use crate::pipeline::bag::{isolate_spam, join_prices, BagSummary};
use crate::pipeline::normalizer::normalize_pages;
use crate::provider::{fetch_collection, lookup_floor_prices, AlchemyClient, FetchOutcome, SpamFilter};

/// A query that stopped early; its pages up to the failure were still used
#[derive(Debug, Clone, Serialize)]
pub struct FetchFailure {
    pub query: String,
    pub pages_collected: usize,
    pub message: String,
}

/// Everything one check produces for the front ends
#[derive(Debug, Clone, Serialize)]
pub struct BagReport {
    pub address: Address,
    pub clean: Vec<PricedToken>,
    pub spam: Vec<TokenRecord>,
    pub summary: BagSummary,
    pub fetch_failures: Vec<FetchFailure>,
}

impl BagReport {
    pub fn has_fetch_failures(&self) -> bool {
        !self.fetch_failures.is_empty()
    }

    /// The clean token named after the checked ENS name, if the wallet holds it
    pub fn name_token(&self) -> Option<&PricedToken> {
        if !self.address.is_ens() {
            return None;
        }
        let name = self.address.as_str();
        self.clean
            .iter()
            .find(|row| row.token.title.as_deref().is_some_and(|title| title.contains(name)))
    }
}

/// Runs one wallet through validation, both collection fetches, normalization,
/// spam isolation and floor price enrichment.
pub struct BagChecker {
    client: AlchemyClient,
}

impl BagChecker {
    pub fn new(client: AlchemyClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Ok(Self::new(AlchemyClient::new(config)?))
    }

    pub async fn check(&self, raw_address: &str) -> Result<BagReport> {
        // Nothing goes over the network for a bad address
        let address = validate_address(raw_address)?;
        let monitor = PerformanceMonitor::new("bag_check")
            .with_metadata("address", serde_json::json!(address.as_str()));
        let context = LogContext::new("checker", "check").with_address(address.as_str());
        context.info("Checking wallet");

        let clean_query = self.client.nft_query(&address, SpamFilter::ExcludeSpam)?;
        let all_query = self.client.nft_query(&address, SpamFilter::IncludeSpam)?;

        let mut fetch_failures = Vec::new();
        let clean_outcome = fetch_collection(&self.client, &clean_query).await?;
        let clean_pages = record_failure(&clean_query.label, clean_outcome, &mut fetch_failures);
        let all_outcome = fetch_collection(&self.client, &all_query).await?;
        let all_pages = record_failure(&all_query.label, all_outcome, &mut fetch_failures);

        let clean_bag = normalize_pages(&clean_pages)?;
        let all_tokens = normalize_pages(&all_pages)?;
        let spam = isolate_spam(&all_tokens, &clean_bag);

        let prices = lookup_floor_prices(&self.client, &clean_bag).await;
        let clean = join_prices(clean_bag, prices);

        let summary = BagSummary::from_bags(&clean, &spam);
        MetricsLogger::log_bag_summary(address.as_str(), summary.clean_count, summary.spam_count, monitor.elapsed_ms());
        monitor.finish();

        Ok(BagReport {
            address,
            clean,
            spam,
            summary,
            fetch_failures,
        })
    }

    /// Image for the checked ENS name, read from its token's metadata.
    /// Any failure just means no image.
    pub async fn name_image_url(&self, report: &BagReport) -> Option<String> {
        let raw_uri = report.name_token()?.token.raw_token_uri.as_deref()?;

        match self.client.get_image_url(raw_uri).await {
            Ok(image) => image,
            Err(error) => {
                LogContext::new("checker", "name_image_url")
                    .with_address(report.address.as_str())
                    .warn(&format!("Could not load name image: {}", error));
                None
            }
        }
    }
}

fn record_failure(query: &str, outcome: FetchOutcome, failures: &mut Vec<FetchFailure>) -> Vec<Page> {
    if let Some(error) = outcome.failure {
        failures.push(describe_failure(query, outcome.pages.len(), &error));
    }
    outcome.pages
}

fn describe_failure(query: &str, pages_collected: usize, error: &CheckerError) -> FetchFailure {
    FetchFailure {
        query: query.to_string(),
        pages_collected,
        message: error.to_string(),
    }
}
