pub const DATA_URL: &str = "https://microsoftedge.github.io/Demos/json-dummy-data/5MB.json";
pub const PAGE_SIZE: usize = 50;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub data_url: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            data_url: DATA_URL.to_string(),
            page_size: PAGE_SIZE,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl TableConfig {
    pub fn with_data_url(mut self, data_url: impl Into<String>) -> Self {
        self.data_url = data_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}
