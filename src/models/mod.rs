pub mod address;
pub mod page;
pub mod token;
pub mod floor_price;

pub use address::{Address, validate_address};
pub use page::{Page, OwnedNft};
pub use token::{TokenRecord, PricedToken};
pub use floor_price::{FloorPriceRow, FloorPriceResponse, MarketplaceFloor, NOT_AVAILABLE};
