//! Bounded response reading.

use crate::config::MAX_HEADER_COUNT;
use crate::config::MAX_HEADER_VALUE_LENGTH;
use crate::error_handling::FetchError;

/// Body bytes kept from a response.
#[derive(Debug, Default)]
pub(crate) struct BoundedBody {
    pub(crate) prefix: Vec<u8>,
    pub(crate) bytes_read: u64,
    pub(crate) truncated: bool,
}

/// Reads at most `max_body` bytes of `response`, keeping `max_prefix` of them.
///
/// A declared `Content-Length` above `max_body` fails before any body byte is
/// read. A body without a usable length is read until it passes `max_body`,
/// then dropped with `truncated` set; the connection closes with the response.
pub(crate) async fn read_bounded_body(
    mut response: reqwest::Response,
    max_body: usize,
    max_prefix: usize,
) -> Result<BoundedBody, FetchError> {
    if let Some(declared) = response.content_length() {
        if declared > max_body as u64 {
            return Err(FetchError::BodyTooLarge {
                declared,
                limit: max_body,
            });
        }
    }

    let mut body = BoundedBody {
        prefix: Vec::with_capacity(max_prefix.min(8 * 1024)),
        ..BoundedBody::default()
    };

    while let Some(chunk) = response.chunk().await? {
        let room = max_prefix.saturating_sub(body.prefix.len());
        if room > 0 {
            body.prefix
                .extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
        body.bytes_read += chunk.len() as u64;
        if body.bytes_read > max_body as u64 {
            log::debug!(
                "Body exceeded {} bytes after {} read, truncating",
                max_body,
                body.bytes_read
            );
            body.truncated = true;
            break;
        }
    }
    Ok(body)
}

/// Copies response headers into ordered `(name, value)` pairs.
///
/// At most [`MAX_HEADER_COUNT`] headers are kept and each value is cut to
/// [`MAX_HEADER_VALUE_LENGTH`] bytes on a character boundary. Non-UTF-8 bytes
/// are replaced.
///
/// The order is only close to the wire order: `HeaderMap` groups repeated
/// names at the position of their first occurrence, keeping the values of
/// one name in received order.
pub(crate) fn collect_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    let total = headers.len();
    if total > MAX_HEADER_COUNT {
        log::debug!("Response carried {total} headers, keeping {MAX_HEADER_COUNT}");
    }
    headers
        .iter()
        .take(MAX_HEADER_COUNT)
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes());
            (name.as_str().to_string(), truncate_value(&value))
        })
        .collect()
}

fn truncate_value(value: &str) -> String {
    if value.len() <= MAX_HEADER_VALUE_LENGTH {
        return value.to_string();
    }
    let mut end = MAX_HEADER_VALUE_LENGTH;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}
