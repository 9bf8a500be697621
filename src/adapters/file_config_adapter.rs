//! INI file configuration adapter.

use crate::domain::error::TrendstopError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendstopError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TrendstopError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TrendstopError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TrendstopError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
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
[feeds]
payload_dir = /var/lib/trendstop/payloads

[strategy]
atr_period = 14
week_multiplier = 3.0
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("feeds", "payload_dir"),
            Some("/var/lib/trendstop/payloads".to_string())
        );
        assert_eq!(adapter.get_int("strategy", "atr_period", 21), 14);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[strategy]\natr_period = 21\n").unwrap();
        assert_eq!(adapter.get_string("strategy", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[strategy]\natr_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "atr_period", 21), 21);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nmonth_multiplier = 2.5\n").unwrap();
        assert_eq!(adapter.get_double("strategy", "month_multiplier", 0.0), 2.5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nmonth_multiplier = lots\n").unwrap();
        assert_eq!(adapter.get_double("strategy", "month_multiplier", 2.5), 2.5);
    }

    #[test]
    fn require_string_rejects_blank() {
        let adapter = FileConfigAdapter::from_string("[feeds]\ncsv_dir =\n").unwrap();
        assert!(matches!(
            adapter.require_string("feeds", "csv_dir"),
            Err(TrendstopError::ConfigMissing { key, .. }) if key == "csv_dir"
        ));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[web]\nlisten = 0.0.0.0:9000\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("0.0.0.0:9000".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TrendstopError::ConfigParse { .. })));
    }
}
