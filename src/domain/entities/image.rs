//! Upstream image search results.

/// One candidate returned by an image search.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCandidate {
    /// Provider-side identifier of the photo.
    pub id: String,
    pub download_url: String,
    pub width: u32,
    pub height: u32,
    pub photographer: Option<String>,
    pub description: Option<String>,
}

/// Raw bytes fetched for a candidate, with the declared content type.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}
