//! Novasoft ERP client: authentication, paginated feed fetching, and the
//! merge stage producing canonical per-code records.

pub mod client;
pub mod clock;
pub mod error;
pub mod extract;
mod fetch_all;
pub mod merge;
pub mod token;
pub mod types;

pub use client::{ErpClient, Feed, FeedSelectors};
pub use clock::{Clock, SystemClock};
pub use error::ErpError;
pub use merge::merge;
pub use token::TokenManager;
pub use types::{ItemRecord, PriceRecord};
