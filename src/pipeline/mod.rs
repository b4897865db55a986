pub mod normalizer;
pub mod bag;
pub mod checker;

pub use normalizer::normalize_pages;
pub use bag::{isolate_spam, join_prices, token_type_breakdown, BagSummary, TokenTypeShare};
pub use checker::{BagChecker, BagReport, FetchFailure};
