/// Payload format announced to the stream load endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Csv,
    /// One JSON object per line.
    Json,
}

/// Per-request stream load options.
///
/// Every option maps onto one stream load header; unset options are not
/// sent and the server default applies.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    label: Option<String>,
    max_filter_ratio: Option<f64>,
    where_clause: Option<String>,
    partitions: Option<String>,
    columns: Option<String>,
    column_separator: Option<String>,
    exec_mem_limit: Option<u64>,
    strict_mode: Option<bool>,
    format: Option<Format>,
    headers: Vec<(String, String)>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label identifying the load job. Doris refuses a second job with the
    /// same label, which makes a retried commit idempotent.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Maximum tolerated ratio of filtered rows, within `0.0..=1.0`.
    pub fn max_filter_ratio(mut self, ratio: f64) -> Self {
        self.max_filter_ratio = Some(ratio.clamp(0.0, 1.0));
        self
    }

    pub fn where_clause(mut self, filter: impl Into<String>) -> Self {
        self.where_clause = Some(filter.into());
        self
    }

    pub fn partitions(mut self, partitions: impl Into<String>) -> Self {
        self.partitions = Some(partitions.into());
        self
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn column_separator(mut self, separator: impl Into<String>) -> Self {
        self.column_separator = Some(separator.into());
        self
    }

    pub fn exec_mem_limit(mut self, bytes: u64) -> Self {
        self.exec_mem_limit = Some(bytes);
        self
    }

    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = Some(strict);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Extra header sent verbatim with the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn get_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Header pairs for this request, in a stable order.
    pub fn to_headers(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();

        let mut push = |name: &str, value: String| out.push((name.to_string(), value));

        if let Some(label) = &self.label {
            push("label", label.clone());
        }
        if let Some(ratio) = self.max_filter_ratio {
            push("max_filter_ratio", ratio.to_string());
        }
        if let Some(filter) = &self.where_clause {
            push("where", filter.clone());
        }
        if let Some(partitions) = &self.partitions {
            push("partitions", partitions.clone());
        }
        if let Some(columns) = &self.columns {
            push("columns", columns.clone());
        }
        if let Some(separator) = &self.column_separator {
            push("column_separator", separator.clone());
        }
        if let Some(limit) = self.exec_mem_limit {
            push("exec_mem_limit", limit.to_string());
        }
        if let Some(strict) = self.strict_mode {
            push("strict_mode", strict.to_string());
        }
        match self.format {
            Some(Format::Json) => {
                push("format", "json".to_string());
                push("read_json_by_line", "true".to_string());
            }
            Some(Format::Csv) => push("format", "csv".to_string()),
            None => {}
        }

        out.extend(self.headers.iter().cloned());
        out
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
