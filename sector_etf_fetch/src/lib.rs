//! HTTP page fetching for fund provider websites.
//!
//! Fetches raw HTML with browser-like headers, a rotating user agent, a
//! request timeout, and a bounded number of retries. Parsing is left to the
//! caller.

mod client;
mod errors;
mod user_agent;

pub use self::client::{FetchOptions, PageClient};
pub use self::errors::Error;
pub use self::user_agent::get_user_agent;
