use serde::{Deserialize, Serialize};

/// Placeholder shown wherever a marketplace quote is missing
pub const NOT_AVAILABLE: &str = "Not Available";

/// `getFloorPrice` response body
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPriceResponse {
    #[serde(default)]
    pub open_sea: Option<MarketplaceFloor>,
    #[serde(default)]
    pub looks_rare: Option<MarketplaceFloor>,
}

/// One marketplace's quote; on failure only `error` is set
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceFloor {
    #[serde(default)]
    pub floor_price: Option<f64>,
    #[serde(default)]
    pub price_currency: Option<String>,
    #[serde(default)]
    pub collection_url: Option<String>,
    #[serde(default)]
    pub retrieved_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Floor price quote for one contract
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorPriceRow {
    /// Join key back to the token row; skipped when flattened next to the token
    #[serde(skip)]
    pub contract_address: Option<String>,
    #[serde(rename = "opensea_floorprice")]
    pub opensea_floor_price: Option<f64>,
    pub opensea_currency: Option<String>,
    #[serde(rename = "looksrare_floorprice")]
    pub looksrare_floor_price: Option<f64>,
    pub looksrare_currency: Option<String>,
}

impl FloorPriceRow {
    /// A row with every quote missing
    pub fn unavailable(contract_address: Option<String>) -> Self {
        Self {
            contract_address,
            opensea_floor_price: None,
            opensea_currency: None,
            looksrare_floor_price: None,
            looksrare_currency: None,
        }
    }

    pub fn from_response(contract_address: Option<String>, response: FloorPriceResponse) -> Self {
        let opensea = response.open_sea.unwrap_or_else(MarketplaceFloor::empty);
        let looksrare = response.looks_rare.unwrap_or_else(MarketplaceFloor::empty);

        Self {
            contract_address,
            opensea_floor_price: opensea.floor_price,
            opensea_currency: opensea.price_currency,
            looksrare_floor_price: looksrare.floor_price,
            looksrare_currency: looksrare.price_currency,
        }
    }

    /// True if at least one marketplace returned a price
    pub fn has_quote(&self) -> bool {
        self.opensea_floor_price.is_some() || self.looksrare_floor_price.is_some()
    }

    /// The four price cells in column order, with the placeholder filled in
    pub fn display_cells(&self) -> [String; 4] {
        [
            price_cell(self.opensea_floor_price),
            text_cell(self.opensea_currency.as_deref()),
            price_cell(self.looksrare_floor_price),
            text_cell(self.looksrare_currency.as_deref()),
        ]
    }
}

impl MarketplaceFloor {
    fn empty() -> Self {
        Self {
            floor_price: None,
            price_currency: None,
            collection_url: None,
            retrieved_at: None,
            error: None,
        }
    }
}

fn price_cell(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |price| price.to_string())
}

fn text_cell(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}
