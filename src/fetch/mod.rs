pub mod executor;
pub mod service;
pub mod types;

pub use executor::{attempt, fetch};
pub use service::{FetchService, FetchSubscription, ResilientFetcher};
pub use types::{FetchRequest, CONNECT_TIMEOUT, READ_TIMEOUT, USER_AGENT};
