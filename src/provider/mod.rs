pub mod client;
pub mod fetcher;
pub mod price_lookup;

pub use client::AlchemyClient;
pub use fetcher::{fetch_collection, CollectionQuery, FetchOutcome, SpamFilter};
pub use price_lookup::lookup_floor_prices;
