use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::models::FloorPriceRow;

/// One owned NFT flattened into a table row.
/// Rows compare by every field, which is what spam isolation relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Last provider update, truncated to whole seconds
    pub last_updated: Option<NaiveDateTime>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub contract_address: Option<String>,
    pub token_type: Option<String>,
    pub raw_token_uri: Option<String>,
}

/// A clean-bag row with its floor price quote attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedToken {
    #[serde(flatten)]
    pub token: TokenRecord,
    #[serde(flatten)]
    pub price: FloorPriceRow,
}
