//! Xueqiu status search (`statuses/search.json`).

use chrono::{DateTime, FixedOffset};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, REFERER};
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::http::fetch_text;
use crate::domain::error::StockevalError;
use crate::domain::news::NewsItem;
use crate::ports::news_port::NewsSource;

pub const NAME: &str = "xueqiu";
const URL: &str = "https://xueqiu.com/statuses/search.json";
const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    list: Option<Vec<Status>>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    created_at: Value,
    #[serde(default)]
    title: Option<String>,
}

/// Millisecond epoch as `YYYY-MM-DD HH:MM` Beijing time; anything else is
/// returned verbatim.
pub fn format_created_at(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) => {
            let formatted = n.as_i64().and_then(|ms| {
                let offset = FixedOffset::east_opt(BEIJING_OFFSET_SECS)?;
                let dt = DateTime::from_timestamp_millis(ms)?.with_timezone(&offset);
                Some(dt.format("%Y-%m-%d %H:%M").to_string())
            });
            Some(formatted.unwrap_or_else(|| n.to_string()))
        }
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn parse_statuses(body: &str) -> Result<Vec<NewsItem>, String> {
    let resp: SearchResponse = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let list = resp.list.ok_or_else(|| "payload has no list".to_string())?;
    Ok(list
        .into_iter()
        .filter_map(|s| {
            let title = s.title.filter(|t| !t.trim().is_empty())?;
            let date = format_created_at(&s.created_at)?;
            Some(NewsItem::new(date, title.trim(), NAME))
        })
        .collect())
}

pub struct XueqiuNews {
    client: Client,
}

impl XueqiuNews {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl NewsSource for XueqiuNews {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, StockevalError> {
        let request = self
            .client
            .get(URL)
            .header(REFERER, "https://xueqiu.com/")
            .header(ACCEPT, "application/json, text/plain, */*")
            .header("X-Requested-With", "XMLHttpRequest")
            .query(&[
                ("count", "20"),
                ("comment", "0"),
                ("source", "all"),
                ("sort", "time"),
                ("page", "1"),
                ("stock", symbol),
            ]);
        let body = fetch_text(NAME, request, None)?;
        parse_statuses(&body).map_err(|e| StockevalError::upstream(NAME, e))
    }
}
