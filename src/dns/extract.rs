//! DNS record extraction utilities.
//!
//! Pulls SPF and DMARC records out of TXT record collections and picks the
//! domain those records are published under.

/// Extracts every SPF record from TXT records.
///
/// SPF records start with "v=spf1" (case-insensitive). More than one is a
/// permanent error for receivers, so callers need all of them, not the first.
pub fn extract_spf_records(txt_records: &[String]) -> Vec<String> {
    txt_records
        .iter()
        .map(|txt| txt.trim())
        .filter(|txt| {
            let lower = txt.to_ascii_lowercase();
            lower == "v=spf1" || lower.starts_with("v=spf1 ")
        })
        .map(str::to_string)
        .collect()
}

/// Extracts every DMARC record from TXT records published at `_dmarc.<domain>`.
///
/// DMARC records start with "v=DMARC1".
pub fn extract_dmarc_records(txt_records: &[String]) -> Vec<String> {
    txt_records
        .iter()
        .map(|txt| txt.trim())
        .filter(|txt| {
            let compact: String = txt.chars().filter(|c| !c.is_whitespace()).collect();
            compact.to_ascii_lowercase().starts_with("v=dmarc1")
        })
        .map(str::to_string)
        .collect()
}

/// Returns the `p=` policy tag of a DMARC record, lowercased.
pub fn dmarc_policy(record: &str) -> Option<String> {
    record
        .split(';')
        .map(str::trim)
        .find_map(|tag| {
            let (name, value) = tag.split_once('=')?;
            (name.trim().eq_ignore_ascii_case("p")).then(|| value.trim().to_ascii_lowercase())
        })
}

/// Domain under which mail authentication records are looked up.
///
/// A leading `www.` is dropped; everything else is used as-is.
pub fn email_domain(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Name of the DMARC record for `domain`.
pub fn dmarc_name(domain: &str) -> String {
    format!("_dmarc.{domain}")
}
