use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use crate::models::{FloorPriceRow, PricedToken, TokenRecord};

/// Label used for rows whose token type the provider did not report
pub const UNKNOWN_TOKEN_TYPE: &str = "UNKNOWN";

/// Rows of the all-tokens table that do not appear in the non-spam table.
/// Order and duplicates of `all_tokens` are preserved.
pub fn isolate_spam(all_tokens: &[TokenRecord], clean: &[TokenRecord]) -> Vec<TokenRecord> {
    let clean_rows: HashSet<&TokenRecord> = clean.iter().collect();

    all_tokens
        .iter()
        .filter(|row| !clean_rows.contains(row))
        .cloned()
        .collect()
}

/// Attach each token's floor price by contract address.
/// Tokens without a matching quote get the placeholder row.
pub fn join_prices(tokens: Vec<TokenRecord>, prices: Vec<FloorPriceRow>) -> Vec<PricedToken> {
    let by_contract: HashMap<String, FloorPriceRow> = prices
        .into_iter()
        .filter_map(|row| row.contract_address.clone().map(|contract| (contract, row)))
        .collect();

    tokens
        .into_iter()
        .map(|token| {
            let price = token
                .contract_address
                .as_ref()
                .and_then(|contract| by_contract.get(contract).cloned())
                .unwrap_or_else(|| FloorPriceRow::unavailable(token.contract_address.clone()));
            PricedToken { token, price }
        })
        .collect()
}

/// Share of a bag held in one token type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenTypeShare {
    pub token_type: String,
    pub count: usize,
    pub percentage: f64,
}

/// Counts and token type breakdowns for a checked wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BagSummary {
    pub clean_count: usize,
    pub spam_count: usize,
    pub clean_token_types: Vec<TokenTypeShare>,
    pub spam_token_types: Vec<TokenTypeShare>,
}

impl BagSummary {
    pub fn from_bags(clean: &[PricedToken], spam: &[TokenRecord]) -> Self {
        Self {
            clean_count: clean.len(),
            spam_count: spam.len(),
            clean_token_types: token_type_breakdown(clean.iter().map(|row| &row.token)),
            spam_token_types: token_type_breakdown(spam.iter()),
        }
    }
}

/// Percentage of rows per token type, most common first
pub fn token_type_breakdown<'a, I>(rows: I) -> Vec<TokenTypeShare>
where
    I: IntoIterator<Item = &'a TokenRecord>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total = 0usize;

    for row in rows {
        let token_type = row.token_type.as_deref().unwrap_or(UNKNOWN_TOKEN_TYPE);
        *counts.entry(token_type).or_insert(0) += 1;
        total += 1;
    }

    let mut shares: Vec<TokenTypeShare> = counts
        .into_iter()
        .map(|(token_type, count)| TokenTypeShare {
            token_type: token_type.to_string(),
            count,
            percentage: count as f64 * 100.0 / total as f64,
        })
        .collect();

    // BTreeMap order breaks ties alphabetically
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}
