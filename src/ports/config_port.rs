//! Configuration access port trait.

use crate::domain::error::TrendstopError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// A present, non-blank value or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, TrendstopError> {
        self.get_string(section, key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| TrendstopError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}
