//! Thin client for the platform's web API: login, cookie persistence, user
//! lookup and cursor-paged search. Everything the pipeline needs and nothing
//! more.

use std::path::Path;

use serde::Deserialize;

use crate::cookies::{self, Cookie};
use crate::error::DUPLICATE_COOKIE_MSG;
use crate::{Error, Result};

const BASE_URL: &str = "https://api.x.com/1.1";
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Result ordering mode of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    Top,
    Latest,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Top => "Top",
            Product::Latest => "Latest",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
    pub screen_name: String,
}

/// A post as returned by search. Read-only; the pipeline only derives labels
/// from `text`.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: String,
    pub created_at: String,
    pub user: Author,
    pub text: String,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub favorite_count: u64,
    /// Not present on every payload variant.
    #[serde(default)]
    pub reply_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    posts: Vec<Post>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub screen_name: String,
}

/// One page of search results, carrying what `next_page` needs to advance.
#[derive(Debug)]
pub struct SearchPage {
    pub posts: Vec<Post>,
    query: String,
    product: Product,
    count: u32,
    cursor: Option<String>,
}

pub struct XClient {
    http: reqwest::Client,
    cookies: Vec<Cookie>,
}

impl XClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            cookies: Vec::new(),
        }
    }

    /// Logs in with the configured credentials and captures the session
    /// cookies from the response.
    pub async fn login(&mut self, username: &str, email: &str, password: &str) -> Result<()> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });
        let resp = self
            .http
            .post(format!("{BASE_URL}/auth/login"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("login rejected ({status}): {message}")));
        }

        let mut session = Vec::new();
        for value in resp.headers().get_all(reqwest::header::SET_COOKIE) {
            if let Some(cookie) = value.to_str().ok().and_then(parse_set_cookie) {
                session.push(cookie);
            }
        }
        if session.is_empty() {
            return Err(Error::Auth("login returned no session cookies".into()));
        }
        self.cookies = session;
        Ok(())
    }

    pub fn save_cookies(&self, path: impl AsRef<Path>) -> Result<()> {
        cookies::save(path, &self.cookies)
    }

    pub fn load_cookies(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.cookies = cookies::load(path)?;
        Ok(())
    }

    /// Fetches the authenticated account profile. Cheap way to verify that a
    /// reused cookie session is still alive.
    pub async fn user(&self) -> Result<UserProfile> {
        self.get_json(&format!("{BASE_URL}/account/me"), &[]).await
    }

    /// Runs a search and returns the first page of results.
    pub async fn search(&self, query: &str, product: Product, count: u32) -> Result<SearchPage> {
        let resp: SearchResponse = self
            .get_json(
                &format!("{BASE_URL}/search/timeline"),
                &[
                    ("q", query),
                    ("product", product.as_str()),
                    ("count", &count.to_string()),
                ],
            )
            .await?;
        Ok(SearchPage {
            posts: resp.posts,
            query: query.to_string(),
            product,
            count,
            cursor: resp.next_cursor,
        })
    }

    /// Advances a result set by one page. `None` means exhausted.
    pub async fn next_page(&self, page: &SearchPage) -> Result<Option<SearchPage>> {
        let Some(cursor) = page.cursor.as_deref() else {
            return Ok(None);
        };
        let resp: SearchResponse = self
            .get_json(
                &format!("{BASE_URL}/search/timeline"),
                &[
                    ("q", &page.query),
                    ("product", page.product.as_str()),
                    ("count", &page.count.to_string()),
                    ("cursor", cursor),
                ],
            )
            .await?;
        if resp.posts.is_empty() {
            return Ok(None);
        }
        Ok(Some(SearchPage {
            posts: resp.posts,
            query: page.query.clone(),
            product: page.product,
            count: page.count,
            cursor: resp.next_cursor,
        }))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let header = cookie_header(&self.cookies)?;
        let resp = self
            .http
            .get(url)
            .query(params)
            .header(reqwest::header::COOKIE, header)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reset = resp
                .headers()
                .get(RATE_LIMIT_RESET_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or_else(|| chrono::Utc::now().timestamp() + 60);
            return Err(Error::RateLimited { reset });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}

impl Default for XClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the `Cookie` request header. Two cookies sharing `(name, domain)`
/// mean the session file is corrupted and the request must not go out.
fn cookie_header(cookies: &[Cookie]) -> Result<String> {
    let mut seen: Vec<(&str, &str)> = Vec::with_capacity(cookies.len());
    for cookie in cookies {
        let key = (cookie.name.as_str(), cookie.domain.as_str());
        if seen.contains(&key) {
            return Err(Error::Auth(format!(
                "{DUPLICATE_COOKIE_MSG}, domain={}",
                cookie.domain
            )));
        }
        seen.push(key);
    }
    Ok(cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; "))
}

/// Extracts name, value and domain from a `Set-Cookie` header line.
fn parse_set_cookie(line: &str) -> Option<Cookie> {
    let mut parts = line.split(';');
    let (name, value) = parts.next()?.trim().split_once('=')?;
    let domain = parts
        .filter_map(|attr| attr.trim().split_once('='))
        .find(|(k, _)| k.eq_ignore_ascii_case("domain"))
        .map(|(_, v)| v.trim().to_string())
        .unwrap_or_default();
    Some(Cookie {
        name: name.trim().to_string(),
        domain,
        value: value.trim().to_string(),
        extra: serde_json::Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, domain: &str, value: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            domain: domain.to_string(),
            value: value.to_string(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let header = cookie_header(&[
            cookie("ct0", ".x.com", "abc"),
            cookie("auth_token", ".x.com", "tok"),
        ])
        .unwrap();
        assert_eq!(header, "ct0=abc; auth_token=tok");
    }

    #[test]
    fn duplicate_session_cookie_is_rejected_before_sending() {
        let err = cookie_header(&[
            cookie("ct0", ".x.com", "old"),
            cookie("ct0", ".x.com", "new"),
        ])
        .unwrap_err();
        assert!(err.is_duplicate_cookie());
    }

    #[test]
    fn set_cookie_parsing() {
        let parsed =
            parse_set_cookie("ct0=abc123; Domain=.x.com; Path=/; Secure; HttpOnly").unwrap();
        assert_eq!(parsed.name, "ct0");
        assert_eq!(parsed.value, "abc123");
        assert_eq!(parsed.domain, ".x.com");

        assert!(parse_set_cookie("malformed").is_none());
    }

    #[test]
    fn search_response_deserializes_with_and_without_cursor() {
        let raw = r#"{
            "posts": [{
                "id": "1",
                "created_at": "Wed Jan 10 12:00:00 +0000 2024",
                "user": {"name": "Jane", "screen_name": "jane_ug"},
                "text": "momo failed again",
                "retweet_count": 2,
                "favorite_count": 5
            }],
            "next_cursor": "scroll:abc"
        }"#;
        let resp: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.posts.len(), 1);
        assert_eq!(resp.posts[0].reply_count, None);
        assert_eq!(resp.next_cursor.as_deref(), Some("scroll:abc"));

        let last: SearchResponse = serde_json::from_str(r#"{"posts": []}"#).unwrap();
        assert!(last.next_cursor.is_none());
    }
}
