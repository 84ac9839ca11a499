use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in the core crate.
///
/// `Transport` and `Status` both count as transport failures; the split
/// exists so callers can show the HTTP status when there is one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected payload from {url}: {message}")]
    Parse { url: String, message: String },

    #[error("geolocation unavailable: {0}")]
    Geolocation(String),

    #[error("{0}")]
    Config(String),

    #[error("store entry '{entry}': {message}")]
    Store { entry: String, message: String },
}

impl Error {
    pub(crate) fn store(entry: &str, message: impl std::fmt::Display) -> Self {
        Error::Store { entry: entry.to_string(), message: message.to_string() }
    }
}

/// Keep upstream error bodies readable in messages. The cut lands on a
/// char boundary, so multibyte bodies never panic the error path.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &body[..cut])
}
