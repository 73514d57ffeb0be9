//! UGANDA MOBILE MONEY COMPLAINT SCRAPER
//! Walks X search results week by week and dumps complaint posts to a CSV.

pub mod client;
pub mod config;
mod cookies;
mod error;
mod export;
mod filter;
mod macros;
pub mod process;

pub use error::{Error, Result};

const COOKIE_PATH: &str = "cookies.json";
/// Posts requested per search page.
const PAGE_SIZE: u32 = 100;
/// Length of one search date window.
const WINDOW_DAYS: i64 = 7;
const MAX_LOGIN_ATTEMPTS: usize = 3;
/// Extra seconds slept past a rate-limit reset timestamp.
const RATE_LIMIT_MARGIN_SECS: i64 = 10;
/// Rewrite the CSV after this many newly collected complaints.
const CHECKPOINT_EVERY: usize = 100;
/// Inclusive bounds in seconds for the delay between page fetches.
const PAGE_DELAY_SECS: (u64, u64) = (3, 7);
