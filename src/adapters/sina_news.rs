//! Sina Finance stock news pages (`vCB_AllNewsStock.php`).
//!
//! The page is GBK-encoded HTML. Headlines sit inside `<div class="datelist">`
//! as `YYYY-MM-DD HH:MM <a ...>title</a>` runs.

use std::thread;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::adapters::http::fetch_text;
use crate::domain::error::StockevalError;
use crate::domain::news::NewsItem;
use crate::ports::news_port::NewsSource;

pub const NAME: &str = "sina";
const URL: &str = "https://vip.stock.finance.sina.com.cn/corp/view/vCB_AllNewsStock.php";

/// Compiled patterns for one news page.
pub struct SinaPageParser {
    block: Regex,
    item: Regex,
}

impl SinaPageParser {
    pub fn new() -> Result<Self, StockevalError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| StockevalError::upstream(NAME, e.to_string()))
        };
        Ok(Self {
            block: compile(r#"(?is)<div[^>]*class="datelist"[^>]*>(.*?)</div>"#)?,
            item: compile(r"(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2})\s+<a[^>]*>([^<]+)</a>")?,
        })
    }

    /// Headlines on one page, or `None` when the `datelist` block is missing.
    pub fn parse(&self, html: &str) -> Option<Vec<NewsItem>> {
        let block = self.block.captures(html)?.get(1)?.as_str().replace("&nbsp;", " ");
        let items = self
            .item
            .captures_iter(&block)
            .filter_map(|cap| {
                let title = cap[3].trim();
                if title.is_empty() {
                    return None;
                }
                Some(NewsItem::new(format!("{} {}", &cap[1], &cap[2]), title, NAME))
            })
            .collect();
        Some(items)
    }
}

pub struct SinaNews {
    client: Client,
    parser: SinaPageParser,
    pages: usize,
    delay: Duration,
}

impl SinaNews {
    pub fn new(client: Client, pages: usize, delay: Duration) -> Result<Self, StockevalError> {
        Ok(Self {
            client,
            parser: SinaPageParser::new()?,
            pages: pages.max(1),
            delay,
        })
    }

    fn fetch_page(&self, symbol: &str, page: usize) -> Result<Option<Vec<NewsItem>>, StockevalError> {
        let page = page.to_string();
        let request = self
            .client
            .get(URL)
            .query(&[("symbol", symbol), ("Page", page.as_str())]);
        let html = fetch_text(NAME, request, Some("gbk"))?;
        Ok(self.parser.parse(&html))
    }
}

impl NewsSource for SinaNews {
    fn name(&self) -> &str {
        NAME
    }

    /// Pages 1..=N. A failed or unparseable first page fails the source; any
    /// later failure or empty page ends paging with what was collected.
    fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, StockevalError> {
        let mut items = Vec::new();
        for page in 1..=self.pages {
            if page > 1 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            match self.fetch_page(symbol, page) {
                Ok(Some(page_items)) => {
                    debug!(symbol, page, count = page_items.len(), "sina page parsed");
                    if page_items.is_empty() {
                        break;
                    }
                    items.extend(page_items);
                }
                Ok(None) if page == 1 => {
                    return Err(StockevalError::upstream(NAME, "news list not found on page 1"));
                }
                Ok(None) => break,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    warn!(symbol, page, error = %e, "sina page failed, keeping earlier pages");
                    break;
                }
            }
        }
        Ok(items)
    }
}
