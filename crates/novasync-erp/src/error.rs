use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErpError {
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("feed page from {url} has no recognizable record array")]
    MalformedPage { url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("pagination limit reached for {feed}: exceeded {max_pages} pages")]
    PaginationLimit { feed: &'static str, max_pages: u32 },
}
