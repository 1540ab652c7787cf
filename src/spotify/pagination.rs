use std::{fmt, time::Duration};

use indicatif::ProgressBar;
use reqwest::{Client, StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::types::Page;

/// Fixed self-imposed delay after every successful page fetch. Spacing out
/// page requests pre-empts rate limiting instead of merely reacting to it.
const PAGE_DELAY: Duration = Duration::from_millis(500);

/// Maximum consecutive rate-limit retries for a single page. The counter
/// resets after every successful page fetch.
const MAX_RETRIES: u32 = 10;

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Malformed {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
        source: serde_json::Error,
    },
    RetryCeiling {
        url: String,
        attempts: u32,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(e) => write!(f, "request failed: {}", e),
            FetchError::Malformed {
                status,
                headers,
                body,
                source,
            } => write!(
                f,
                "malformed page response ({source})\nstatus: {status}\nheaders: {headers:?}\nbody: {body}",
            ),
            FetchError::RetryCeiling { url, attempts } => write!(
                f,
                "gave up on {url} after {attempts} rate-limit retries"
            ),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(e) => Some(e),
            FetchError::Malformed { source, .. } => Some(source),
            FetchError::RetryCeiling { .. } => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err)
    }
}

/// Retrieves a complete collection from a cursor-paginated Spotify endpoint.
///
/// Follows the `next` cursor returned by each page until none remains and
/// accumulates the items into one ordered sequence whose final length equals
/// the collection's reported total.
///
/// # Rate limiting
///
/// A 429 response carries a `retry-after` header with the wait duration in
/// seconds. The function sleeps exactly that long and retries the *same*
/// page; an in-flight page is not considered consumed until it succeeds.
/// Retries are counted and capped at [`MAX_RETRIES`] consecutive attempts
/// per page, after which [`FetchError::RetryCeiling`] is returned. After
/// every successful page the function waits [`PAGE_DELAY`] before requesting
/// the next one.
///
/// # Failure
///
/// A body that does not deserialize into the expected page envelope aborts
/// the whole call with [`FetchError::Malformed`], carrying the response
/// status, headers and raw body for diagnosis. No partial result is
/// returned.
///
/// # Progress
///
/// When `progress` is given, the bar's length is set to the collection total
/// and its position to the number of items retrieved so far. This is purely
/// observational.
pub async fn fetch_all<T: DeserializeOwned>(
    token: &str,
    start_url: &str,
    progress: Option<&ProgressBar>,
) -> Result<Vec<T>, FetchError> {
    let client = Client::new();
    let mut items: Vec<T> = Vec::new();
    let mut url = start_url.to_string();
    let mut retries: u32 = 0;

    loop {
        let response = client.get(&url).bearer_auth(token).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            retries += 1;
            if retries > MAX_RETRIES {
                return Err(FetchError::RetryCeiling {
                    url,
                    attempts: retries,
                });
            }

            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(1);
            sleep(Duration::from_secs(retry_after)).await;
            continue; // same page again
        }

        let response = response.error_for_status()?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        let page: Page<T> =
            serde_json::from_str(&body).map_err(|source| FetchError::Malformed {
                status,
                headers,
                body,
                source,
            })?;

        retries = 0;
        items.extend(page.items);

        if let Some(pb) = progress {
            pb.set_length(page.total);
            pb.set_position(items.len() as u64);
        }

        match page.next {
            Some(next) => {
                url = next;
                sleep(PAGE_DELAY).await;
            }
            None => return Ok(items),
        }
    }
}
