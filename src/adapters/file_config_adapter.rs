//! INI file configuration adapter.
//!
//! Keys are case-insensitive (configparser lowercases them); values keep
//! their case, so stock names survive intact. Blank values read as unset,
//! and lists accept both ASCII and full-width commas.

use std::path::Path;

use configparser::ini::Ini;

use crate::domain::error::StockevalError;
use crate::ports::config_port::ConfigPort;

const LIST_SEPARATORS: [char; 2] = [',', '，'];

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StockevalError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| StockevalError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, StockevalError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| StockevalError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { ini })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| Self::parse_bool(&v))
            .unwrap_or(default)
    }

    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(LIST_SEPARATORS)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[analysis]
stocks = sh603259:药明康德, sz000651:格力电器

[news]
sources = sina,eastmoney
sina_pages = 2

[report]
output_dir = reports
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("analysis", "stocks"),
            Some("sh603259:药明康德, sz000651:格力电器".to_string())
        );
        assert_eq!(
            adapter.get_string("report", "output_dir"),
            Some("reports".to_string())
        );
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Market]\nDays = 60\n").unwrap();
        assert_eq!(adapter.get_int("market", "days", 0), 60);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[market]\ndays = 100\n").unwrap();
        assert_eq!(adapter.get_string("market", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[news]\nsina_pages = 3\nrequest_delay_ms = abc\n")
                .unwrap();
        assert_eq!(adapter.get_int("news", "sina_pages", 0), 3);
        assert_eq!(adapter.get_int("news", "request_delay_ms", 1000), 1000);
        assert_eq!(adapter.get_int("news", "missing", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(
            "[scoring]\nsentiment_weight = 0.35\npositive_threshold = high\n",
        )
        .unwrap();
        assert_eq!(adapter.get_double("scoring", "sentiment_weight", 0.0), 0.35);
        assert_eq!(adapter.get_double("scoring", "positive_threshold", 0.7), 0.7);
        assert_eq!(adapter.get_double("scoring", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter =
            FileConfigAdapter::from_string("[report]\na = true\nb = yes\nc = 1\n").unwrap();
        assert!(adapter.get_bool("report", "a", false));
        assert!(adapter.get_bool("report", "b", false));
        assert!(adapter.get_bool("report", "c", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[notify]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("notify", "a", true));
        assert!(!adapter.get_bool("notify", "b", true));
        assert!(!adapter.get_bool("notify", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing_or_garbage() {
        let adapter = FileConfigAdapter::from_string("[report]\nchart = maybe\n").unwrap();
        assert!(adapter.get_bool("report", "chart", true));
        assert!(!adapter.get_bool("report", "missing", false));
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter =
            FileConfigAdapter::from_string("[news]\nsources = sina , eastmoney,,xueqiu\n").unwrap();
        assert_eq!(
            adapter.get_list("news", "sources"),
            Some(vec![
                "sina".to_string(),
                "eastmoney".to_string(),
                "xueqiu".to_string()
            ])
        );
        assert_eq!(adapter.get_list("news", "missing"), None);
    }

    #[test]
    fn get_list_accepts_full_width_commas() {
        let adapter = FileConfigAdapter::from_string(
            "[analysis]\nstocks = sh603259:药明康德，sz000651:格力电器, sh600519\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_list("analysis", "stocks"),
            Some(vec![
                "sh603259:药明康德".to_string(),
                "sz000651:格力电器".to_string(),
                "sh600519".to_string()
            ])
        );
    }

    #[test]
    fn blank_values_read_as_unset() {
        let adapter =
            FileConfigAdapter::from_string("[notify]\nserverchan_key =\n[market]\ndays =   \n")
                .unwrap();
        assert_eq!(adapter.get_string("notify", "serverchan_key"), None);
        assert_eq!(adapter.get_int("market", "days", 120), 120);
        assert_eq!(adapter.get_list("notify", "serverchan_key"), None);
    }

    #[test]
    fn get_bool_accepts_on_off() {
        let adapter =
            FileConfigAdapter::from_string("[report]\nchart = on\n[notify]\nenabled = OFF\n")
                .unwrap();
        assert!(adapter.get_bool("report", "chart", false));
        assert!(!adapter.get_bool("notify", "enabled", true));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[market]\ncsv_dir = /data/candles\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("market", "csv_dir"),
            Some("/data/candles".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        match result {
            Err(StockevalError::ConfigParse { file, .. }) => {
                assert_eq!(file, "/nonexistent/path/config.ini")
            }
            _ => panic!("expected ConfigParse"),
        }
    }
}
