use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};

use crate::types::ApiResponse;

/// Raw bytes of a successful download plus what the server said about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl DownloadedFile {
    pub fn from_response(resp: ApiResponse) -> Self {
        let content_type = resp.header_str(CONTENT_TYPE.as_str()).map(str::to_string);
        let file_name = resp
            .header_str(CONTENT_DISPOSITION.as_str())
            .and_then(parse_content_disposition);
        Self {
            bytes: resp.body,
            content_type,
            file_name,
        }
    }
}

/// Extracts the file name from a `Content-Disposition` value, preferring the RFC 5987
/// `filename*` form over plain `filename`.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw
                    .trim()
                    .split_once("''")
                    .map_or(raw.trim(), |(_, name)| name);
                if let Ok(decoded) = urlencoding::decode(encoded.trim_matches('"'))
                    && !decoded.is_empty()
                {
                    return Some(decoded.into_owned());
                }
            }
            "filename" => {
                let name = raw.trim().trim_matches('"');
                if !name.is_empty() {
                    plain = Some(name.to_string());
                }
            }
            _ => {}
        }
    }
    plain
}
