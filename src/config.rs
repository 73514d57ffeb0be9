use chrono::NaiveDate;
use serde::Deserialize;

use crate::{Error, Result};

/// Run configuration, read from a JSON file.
/// The `x` section holds the platform login; everything else has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub x: Credentials,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            output: default_output(),
        }
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 31).unwrap()
}

fn default_output() -> String {
    "uganda_mobile_money_complaints.csv".to_string()
}

pub fn load(path: &str) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("couldn't read {path}: {e}")))?;
    let config: Config =
        serde_json::from_str(&raw).map_err(|e| Error::Config(format!("invalid {path}: {e}")))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let raw = r#"{
            "x": { "username": "ugwatch", "email": "ug@example.com", "password": "hunter2" },
            "search": { "start_date": "2024-03-01", "end_date": "2024-03-31", "output": "out.csv" }
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.x.username, "ugwatch");
        assert_eq!(
            config.search.start_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(config.search.output, "out.csv");
    }

    #[test]
    fn search_section_is_optional() {
        let raw = r#"{ "x": { "username": "u", "email": "e", "password": "p" } }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(
            config.search.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(config.search.output, "uganda_mobile_money_complaints.csv");
    }

    #[test]
    fn missing_credentials_section_fails() {
        let raw = r#"{ "search": {} }"#;
        assert!(serde_json::from_str::<Config>(raw).is_err());
    }
}
