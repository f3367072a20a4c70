use crate::config::types::FilterConfig;
use crate::record::LogRecord;

/// Level and content filters.
///
/// Empty level set and empty content filter both allow everything.
/// Comparisons are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilters {
    levels: Vec<String>,
    content: String,
}

impl LogFilters {
    pub fn new<I, S>(levels: I, content: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let levels = levels
            .into_iter()
            .map(|l| l.as_ref().trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();

        Self {
            levels,
            content: content.trim().to_lowercase(),
        }
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn is_allow_all(&self) -> bool {
        self.levels.is_empty() && self.content.is_empty()
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn allows_level(&self, severity: &str) -> bool {
        self.levels.is_empty() || self.levels.iter().any(|l| l.eq_ignore_ascii_case(severity))
    }

    pub fn matches_content(&self, text: &str) -> bool {
        self.content.is_empty() || text.to_lowercase().contains(&self.content)
    }

    /// Filter used at the sinks: the content filter is matched against the
    /// record's JSON form, so tags and attributes are searchable too.
    pub fn allows_record(&self, record: &LogRecord) -> bool {
        if !self.allows_level(&record.severity) {
            return false;
        }

        if self.content.is_empty() {
            return true;
        }

        match serde_json::to_string(record) {
            Ok(json) => self.matches_content(&json),
            Err(_) => self.matches_content(&record.message),
        }
    }
}

impl From<&FilterConfig> for LogFilters {
    fn from(config: &FilterConfig) -> Self {
        Self::new(&config.levels, &config.content)
    }
}
