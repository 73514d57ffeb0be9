use std::collections::HashMap;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{info_time, warn_time, Result};

/// One persisted session cookie. Fields the platform adds beyond the keyed
/// ones (expiry, flags, ...) pass through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The cookie file is usually a bare list, but older dumps wrap it in an
/// object with a `cookies` key. Accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CookieFile {
    List(Vec<Cookie>),
    Wrapped { cookies: Vec<Cookie> },
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<Cookie>> {
    let raw = std::fs::read_to_string(path)?;
    let file: CookieFile = serde_json::from_str(&raw)?;
    let cookies = match file {
        CookieFile::List(cookies) => cookies,
        CookieFile::Wrapped { cookies } => cookies,
    };
    Ok(cookies)
}

pub fn save(path: impl AsRef<Path>, cookies: &[Cookie]) -> Result<()> {
    let raw = serde_json::to_string(cookies)?;
    std::fs::write(path, raw)?;
    Ok(())
}

/// Drops duplicate cookies keyed by `(name, domain)`, keeping the later
/// entry, which the platform wrote last.
pub fn dedup(cookies: Vec<Cookie>) -> Vec<Cookie> {
    let mut unique: Vec<Cookie> = Vec::with_capacity(cookies.len());
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for cookie in cookies {
        let key = (cookie.name.clone(), cookie.domain.clone());
        match index.get(&key) {
            Some(&pos) => unique[pos] = cookie,
            None => {
                index.insert(key, unique.len());
                unique.push(cookie);
            }
        }
    }
    unique
}

/// Rewrites the cookie file with duplicates removed.
/// Returns `false` when the file is missing or can't be salvaged; an
/// unsalvageable file is deleted so the next attempt falls back to login.
pub fn repair(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if !path.exists() {
        return false;
    }
    match load(path).map(dedup).and_then(|unique| save(path, &unique)) {
        Ok(()) => {
            info_time!("Fixed cookie file {}", path.display());
            true
        }
        Err(e) => {
            warn_time!("Couldn't fix cookie file: {e}");
            if std::fs::remove_file(path).is_ok() {
                warn_time!("Removed corrupted cookie file {}", path.display());
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, domain: &str, value: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            domain: domain.to_string(),
            value: value.to_string(),
            extra: Map::new(),
        }
    }

    fn tmp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("momo-scrap-{tag}-{}.json", std::process::id()))
    }

    #[test]
    fn dedup_keeps_the_later_entry() {
        let cookies = vec![
            cookie("ct0", ".x.com", "stale"),
            cookie("auth_token", ".x.com", "tok"),
            cookie("ct0", ".x.com", "fresh"),
        ];
        let unique = dedup(cookies);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "ct0");
        assert_eq!(unique[0].value, "fresh");
        assert_eq!(unique[1].name, "auth_token");
    }

    #[test]
    fn same_name_different_domain_is_not_a_duplicate() {
        let cookies = vec![cookie("ct0", ".x.com", "a"), cookie("ct0", ".api.x.com", "b")];
        assert_eq!(dedup(cookies).len(), 2);
    }

    #[test]
    fn repair_rewrites_duplicates_in_place() {
        let path = tmp_path("repair");
        let raw = r#"[
            {"name": "ct0", "domain": ".x.com", "value": "stale", "secure": true},
            {"name": "ct0", "domain": ".x.com", "value": "fresh", "secure": true}
        ]"#;
        std::fs::write(&path, raw).unwrap();

        assert!(repair(&path));
        let fixed = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].value, "fresh");
        // passthrough field survives the rewrite
        assert_eq!(fixed[0].extra.get("secure"), Some(&Value::Bool(true)));
    }

    #[test]
    fn repair_accepts_the_wrapped_format() {
        let path = tmp_path("wrapped");
        let raw = r#"{"cookies": [{"name": "ct0", "domain": ".x.com", "value": "v"}]}"#;
        std::fs::write(&path, raw).unwrap();

        assert!(repair(&path));
        let fixed = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(fixed.len(), 1);
    }

    #[test]
    fn repair_deletes_garbage_and_reports_failure() {
        let path = tmp_path("garbage");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(!repair(&path));
        assert!(!path.exists());
    }

    #[test]
    fn repair_of_a_missing_file_is_a_no_op() {
        assert!(!repair(tmp_path("missing")));
    }
}
