//! Eastmoney company announcements (JSONP `getAnnouncementList`).

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::adapters::http::fetch_text;
use crate::domain::error::StockevalError;
use crate::domain::news::NewsItem;
use crate::ports::news_port::NewsSource;

pub const NAME: &str = "eastmoney";
const URL: &str = "http://np-anotice-stock.eastmoney.com/api/security/announcement/getAnnouncementList";
const CALLBACK: &str = "jQuery";
const PAGE_SIZE: &str = "20";

#[derive(Debug, Deserialize)]
struct AnnouncementResponse {
    data: Option<AnnouncementData>,
}

#[derive(Debug, Deserialize)]
struct AnnouncementData {
    list: Option<Vec<Announcement>>,
}

#[derive(Debug, Deserialize)]
struct Announcement {
    #[serde(default)]
    notice_date: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Strip a `jQuery(...)` JSONP wrapper if present.
pub fn unwrap_jsonp(body: &str) -> &str {
    let trimmed = body.trim().trim_end_matches(';');
    trimmed
        .strip_prefix(CALLBACK)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(trimmed)
}

/// Announcements in `body`, or `None` if the payload carries no `data.list`.
/// Entries missing a date or title are skipped.
pub fn parse_announcements(body: &str) -> Result<Option<Vec<NewsItem>>, String> {
    let resp: AnnouncementResponse =
        serde_json::from_str(unwrap_jsonp(body)).map_err(|e| e.to_string())?;
    let Some(list) = resp.data.and_then(|d| d.list) else {
        return Ok(None);
    };
    Ok(Some(
        list.into_iter()
            .filter_map(|a| {
                let date = a.notice_date.filter(|d| !d.trim().is_empty())?;
                let title = a.title.filter(|t| !t.trim().is_empty())?;
                Some(NewsItem::new(date, title.trim(), NAME))
            })
            .collect(),
    ))
}

/// Code spellings the endpoint has accepted over time: `sh603259`,
/// `603259`, and the market-digit form `0603259`/`1000651`.
pub fn code_variants(symbol: &str) -> Vec<String> {
    let digits = symbol.get(2..).unwrap_or(symbol);
    let market = if symbol.starts_with("sh") { '0' } else { '1' };
    vec![
        symbol.to_string(),
        digits.to_string(),
        format!("{}{}", market, digits),
    ]
}

pub struct EastmoneyNews {
    client: Client,
}

impl EastmoneyNews {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl NewsSource for EastmoneyNews {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, StockevalError> {
        let mut last_problem = String::from("no code variant returned an announcement list");
        for code in code_variants(symbol) {
            let request = self.client.get(URL).query(&[
                ("cb", CALLBACK),
                ("pageSize", PAGE_SIZE),
                ("pageIndex", "1"),
                ("stock", code.as_str()),
            ]);
            let body = match fetch_text(NAME, request, None) {
                Ok(body) => body,
                Err(StockevalError::Source { reason, .. }) if reason.starts_with("HTTP ") => {
                    last_problem = reason;
                    continue;
                }
                Err(e) => return Err(e),
            };
            match parse_announcements(&body) {
                Ok(Some(items)) => {
                    debug!(symbol, code = %code, count = items.len(), "eastmoney announcements");
                    return Ok(items);
                }
                Ok(None) => debug!(symbol, code = %code, "no announcement list"),
                Err(e) => last_problem = format!("unparseable payload: {}", e),
            }
        }
        Err(StockevalError::upstream(NAME, last_problem))
    }
}
