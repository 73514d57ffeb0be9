use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::Rng;
use tokio::time::sleep;

use crate::client::{Post, Product, SearchPage, UserProfile, XClient};
use crate::config::{Config, Credentials};
use crate::{
    cookies, export, filter, info_time, warn_time, Error, Result, CHECKPOINT_EVERY, COOKIE_PATH,
    MAX_LOGIN_ATTEMPTS, PAGE_DELAY_SECS, PAGE_SIZE, RATE_LIMIT_MARGIN_SECS, WINDOW_DAYS,
};

/// Search queries for Uganda mobile money complaints from the general public.
pub const QUERIES: &[&str] = &[
    // General complaints with Uganda context
    "(mobile money OR momo OR airtel money OR mtn momo) (problem OR issue OR complaint) Uganda lang:en",
    "(mobile money failed OR transaction failed) Uganda lang:en",
    "(\"my money has not been received\" OR \"transaction failed but money deducted\") Uganda lang:en",
    // Provider-specific complaints
    "(airtel money complaint OR #StopAirtelTheft) Uganda lang:en",
    "(mtn momo complaint OR mtn mobile money issue) Uganda lang:en",
    // General mobile money issues in Uganda
    "(\"mobile money not working\" OR \"momo down\") Uganda lang:en",
    "(\"mobile money fraud\" OR \"mobile money scam\") Uganda lang:en",
    // Hashtags related to mobile money in Uganda
    "#MobileMoneyFraud Uganda lang:en",
    "#AirtelMoneyComplaint lang:en",
];

const PRODUCTS: [Product; 2] = [Product::Top, Product::Latest];

pub async fn run(config: Config) -> Result<()> {
    let start_time = Local::now();
    let mut client = XClient::new();

    authenticate(&mut client, &config.x).await?;

    info_time!(
        "Starting complaint collection from {} to {}",
        config.search.start_date,
        config.search.end_date
    );
    let complaints = collect(&mut client, &config).await?;

    export::save_complaints(&config.search.output, &complaints)?;
    info_time!(
        start_time,
        "Done! Collected {} complaints -> {}",
        complaints.len(),
        config.search.output
    );
    Ok(())
}

/// Reuses the cookie session when the file is present, otherwise logs in
/// fresh. A failed attempt removes the stale cookie file before the retry.
async fn authenticate(client: &mut XClient, creds: &Credentials) -> Result<()> {
    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        match try_authenticate(client, creds).await {
            Ok(profile) => {
                info_time!("Authenticated as: {} (@{})", profile.name, profile.screen_name);
                return Ok(());
            }
            Err(e) => {
                warn_time!("Authentication attempt {attempt} failed: {e}");
                let _ = std::fs::remove_file(COOKIE_PATH);
            }
        }
    }
    Err(Error::Auth(format!(
        "max authentication attempts ({MAX_LOGIN_ATTEMPTS}) reached"
    )))
}

async fn try_authenticate(client: &mut XClient, creds: &Credentials) -> Result<UserProfile> {
    if Path::new(COOKIE_PATH).exists() {
        client.load_cookies(COOKIE_PATH)?;
    } else {
        client
            .login(&creds.username, &creds.email, &creds.password)
            .await?;
        client.save_cookies(COOKIE_PATH)?;
        info_time!("Logged in and saved cookies to {COOKIE_PATH}");
    }
    // Verifies the session either way.
    client.user().await
}

/// Walks week-long windows over the configured date range, running every
/// query in both product modes and checkpointing the CSV as results pile up.
async fn collect(client: &mut XClient, config: &Config) -> Result<Vec<Post>> {
    let mut acc = Accumulator::default();
    let mut last_checkpoint = 0;

    let mut window_start = config.search.start_date;
    while window_start <= config.search.end_date {
        let window_end = clamp_window_end(window_start, config.search.end_date);

        for &query in QUERIES {
            for product in PRODUCTS {
                scrape_result_set(client, query, window_start, window_end, product, &mut acc)
                    .await;
            }
        }

        window_start = window_end + chrono::Duration::days(1);

        if acc.len() - last_checkpoint >= CHECKPOINT_EVERY {
            export::save_complaints(&config.search.output, &acc.posts)?;
            last_checkpoint = acc.len();
            info_time!("Saved {} complaints to {}", acc.len(), config.search.output);
        }
    }

    Ok(acc.posts)
}

/// End date of the window starting at `start`, clamped to the overall range.
fn clamp_window_end(start: NaiveDate, range_end: NaiveDate) -> NaiveDate {
    let end = start + chrono::Duration::days(WINDOW_DAYS);
    if end > range_end {
        range_end
    } else {
        end
    }
}

/// Drains one search result set page by page. Every error that isn't a rate
/// limit ends the set; the caller moves on to the next query.
async fn scrape_result_set(
    client: &mut XClient,
    query: &str,
    since: NaiveDate,
    until: NaiveDate,
    product: Product,
    acc: &mut Accumulator,
) {
    let Some(mut page) = search_window(client, query, since, until, product).await else {
        return;
    };

    let mut page_num = 1;
    loop {
        let mut new_complaints = 0;
        for post in page.posts.drain(..) {
            if filter::is_complaint(&post.text) && acc.insert(post) {
                new_complaints += 1;
            }
        }
        info_time!(
            "Found {new_complaints} new complaints on page {page_num} (total: {})",
            acc.len()
        );

        // Respectful delay between page fetches.
        let delay = rand::rng().random_range(PAGE_DELAY_SECS.0..=PAGE_DELAY_SECS.1);
        sleep(Duration::from_secs(delay)).await;

        match next_page_retrying(client, &page).await {
            Ok(Some(next)) => {
                page = next;
                page_num += 1;
            }
            Ok(None) => break,
            Err(e) => {
                info_time!("Error getting next page: {e}");
                break;
            }
        }
    }
}

/// Issues the first fetch of a result set. A duplicate-session cookie error
/// gets one repair-and-retry; anything else unrecoverable abandons the query.
async fn search_window(
    client: &mut XClient,
    query: &str,
    since: NaiveDate,
    until: NaiveDate,
    product: Product,
) -> Option<SearchPage> {
    let full_query = format!("{query} since:{since} until:{until}");
    info_time!("Searching: {full_query} (Product: {})", product.as_str());

    match search_retrying(client, &full_query, product).await {
        Ok(page) => Some(page),
        Err(e) if e.is_duplicate_cookie() => {
            warn_time!("Cookie error detected, attempting to fix...");
            if cookies::repair(COOKIE_PATH) && client.load_cookies(COOKIE_PATH).is_ok() {
                match search_retrying(client, &full_query, product).await {
                    Ok(page) => Some(page),
                    Err(retry_err) => {
                        warn_time!("Retry failed after cookie fix: {retry_err}");
                        None
                    }
                }
            } else {
                warn_time!("Cookie fix failed, need to reauthenticate");
                None
            }
        }
        Err(e) => {
            warn_time!("Error with query {full_query}: {e}");
            None
        }
    }
}

async fn search_retrying(
    client: &XClient,
    full_query: &str,
    product: Product,
) -> Result<SearchPage> {
    loop {
        match client.search(full_query, product, PAGE_SIZE).await {
            Err(Error::RateLimited { reset }) => wait_for_rate_limit(reset).await,
            other => return other,
        }
    }
}

async fn next_page_retrying(client: &XClient, page: &SearchPage) -> Result<Option<SearchPage>> {
    loop {
        match client.next_page(page).await {
            Err(Error::RateLimited { reset }) => wait_for_rate_limit(reset).await,
            other => return other,
        }
    }
}

/// Sleeps until the platform-provided reset timestamp plus a safety margin.
async fn wait_for_rate_limit(reset: i64) {
    let reset_at = DateTime::from_timestamp(reset, 0)
        .map(|dt| dt.with_timezone(&Local).to_string())
        .unwrap_or_else(|| reset.to_string());
    info_time!("Rate limit reached. Waiting until {reset_at}");

    let wait = reset + RATE_LIMIT_MARGIN_SECS - Utc::now().timestamp();
    if wait > 0 {
        sleep(Duration::from_secs(wait as u64)).await;
    }
}

/// Ordered complaints plus the set of identifiers already recorded.
/// Lives for one run, dropped after the final write.
#[derive(Default)]
struct Accumulator {
    posts: Vec<Post>,
    seen: HashSet<String>,
}

impl Accumulator {
    /// Records a post unless its identifier was seen before.
    fn insert(&mut self, post: Post) -> bool {
        if !self.seen.insert(post.id.clone()) {
            return false;
        }
        self.posts.push(post);
        true
    }

    fn len(&self) -> usize {
        self.posts.len()
    }
}
