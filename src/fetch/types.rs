//! Fetch result types.

/// What one bounded fetch observed.
///
/// Headers are kept in response order with duplicates preserved and names
/// lowercased. `body_prefix` holds at most the configured prefix length;
/// `bytes_read` counts every body byte received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body_prefix: Vec<u8>,
    pub final_url: String,
    pub bytes_read: u64,
    /// Set when the body stream passed the size ceiling and was cut off.
    pub truncated: bool,
    /// Every URL requested, in order, ending with `final_url`.
    pub redirect_chain: Vec<String>,
    pub elapsed_ms: u64,
}

impl FetchOutcome {
    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of header `name`, in order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn is_https(&self) -> bool {
        self.final_url
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(headers: &[(&str, &str)]) -> FetchOutcome {
        FetchOutcome {
            status_code: 200,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body_prefix: Vec::new(),
            final_url: "https://example.com/".to_string(),
            bytes_read: 0,
            truncated: false,
            redirect_chain: vec!["https://example.com/".to_string()],
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive_first_wins() {
        let o = outcome(&[("x-frame-options", "DENY"), ("X-Frame-Options", "SAMEORIGIN")]);
        assert_eq!(o.header("X-FRAME-OPTIONS"), Some("DENY"));
        assert_eq!(o.header_values("x-frame-options"), vec!["DENY", "SAMEORIGIN"]);
        assert_eq!(o.header("server"), None);
        assert!(o.is_https());
    }
}
