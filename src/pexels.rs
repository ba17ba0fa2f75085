// ============================================================================
// Pexels API Integration
// ============================================================================
// Base URL: https://api.pexels.com/v1
// Rate Limit: 200 requests/hour, 20,000 requests/month
// API Key: REQUIRED (sent verbatim in the Authorization header)
// ============================================================================

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{Result, WallpoolError};

// ============================================================================
// API Response Structures
// ============================================================================
#[derive(Debug, Deserialize)]
pub struct PexelsResponse {
    #[serde(default)]
    pub photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
pub struct PexelsPhoto {
    pub src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
pub struct PexelsSrc {
    pub original: String,
}

// ============================================================================
// Default API Parameters
// ============================================================================
pub const DEFAULT_ENDPOINT: &str = "https://api.pexels.com/v1/search";
pub const DEFAULT_ORIENTATION: &str = "landscape";
pub const DEFAULT_SIZE: &str = "large"; // 24MP minimum filter
pub const PER_PAGE: u32 = 1;
pub const MAX_PAGE: u32 = 30;

// Compressed sRGB rendition, 1600px tall at 2x density
const DOWNLOAD_PARAMS: &str = "auto=compress&cs=tinysrgb&dpr=2&h=1600";

// ============================================================================
// Photo Source Seam
// ============================================================================

/// The remote search service as seen by a fetch worker.
pub trait PhotoSource: Sync {
    /// URL of the first photo on `page` of results for `query`, if any.
    fn search(&self, query: &str, page: u32) -> Result<Option<String>>;

    /// Raw bytes behind a URL returned by `search`.
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Build the search URL with proper parameters
pub fn build_search_url(endpoint: &str, query: &str, page: u32) -> String {
    format!(
        "{}?query={}&orientation={}&size={}&per_page={}&page={}",
        endpoint,
        urlencoding::encode(query),
        DEFAULT_ORIENTATION,
        DEFAULT_SIZE,
        PER_PAGE,
        page
    )
}

/// Append the fixed transformation parameters to a photo's source URL
pub fn build_download_url(original: &str) -> String {
    let sep = if original.contains('?') { '&' } else { '?' };
    format!("{}{}{}", original, sep, DOWNLOAD_PARAMS)
}

pub struct PexelsClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl PexelsClient {
    pub fn new(api_key: &str, endpoint: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(WallpoolError::Config("PEXELS_API_KEY is not set".into()));
        }

        // Requests run until the server answers or the transport gives up.
        let client = Client::builder()
            .user_agent(concat!("wallpool/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()?;

        Ok(PexelsClient {
            client,
            api_key: api_key.trim().to_string(),
            endpoint: endpoint.to_string(),
        })
    }
}

fn check_status(status: StatusCode, what: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED {
        Err(WallpoolError::Config("invalid Pexels API key".into()))
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Err(WallpoolError::Network(format!("{}: rate limit exceeded (200 req/hr)", what)))
    } else {
        Err(WallpoolError::Network(format!("{}: HTTP {}", what, status)))
    }
}

impl PhotoSource for PexelsClient {
    fn search(&self, query: &str, page: u32) -> Result<Option<String>> {
        let url = build_search_url(&self.endpoint, query, page);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()?;
        check_status(response.status(), "search")?;

        let body: PexelsResponse = response.json()?;
        Ok(body
            .photos
            .into_iter()
            .next()
            .map(|photo| build_download_url(&photo.src.original)))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;
        check_status(response.status(), "download")?;
        Ok(response.bytes()?.to_vec())
    }
}
