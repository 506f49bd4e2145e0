//! Utility functions for feed processing.

/// Helper function to validate a URL
pub fn is_valid_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        parsed.scheme() == "http" || parsed.scheme() == "https"
    } else {
        false
    }
}

/// Clean up malformed XML
pub fn cleanup_xml(xml: &str) -> String {
    let mut cleaned = xml.trim().trim_start_matches('\u{FEFF}').to_string();

    // Drop anything before the document actually starts
    if let Some(xml_start) = cleaned.find("<?xml") {
        cleaned = cleaned[xml_start..].to_string();
    } else if let Some(rss_start) = cleaned.find("<rss") {
        cleaned = cleaned[rss_start..].to_string();
    }

    // HTML entities that XML does not define
    cleaned = cleaned
        .replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&rsquo;", "&#8217;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rdquo;", "&#8221;")
        .replace("&ldquo;", "&#8220;")
        .replace("&deg;", "&#176;")
        .replace("&amp;amp;", "&amp;");

    cleaned = cleaned
        .chars()
        .filter(|&c| {
            matches!(c,
                '\u{0009}' | // tab
                '\u{000A}' | // newline
                '\u{000D}' | // carriage return
                '\u{0020}'..='\u{D7FF}' |
                '\u{E000}'..='\u{FFFD}' |
                '\u{10000}'..='\u{10FFFF}'
            )
        })
        .collect();

    if !cleaned.starts_with("<?xml") {
        cleaned = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", cleaned);
    }

    cleaned
}

/// First `limit` characters of `text`, or a marker for binary content.
pub fn preview(text: &str, limit: usize) -> String {
    if text
        .chars()
        .take(limit)
        .all(|c| !c.is_control() || c.is_whitespace())
    {
        text.chars().take(limit).collect()
    } else {
        "[binary data]".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_urls_are_valid() {
        assert!(is_valid_url("http://www.bom.gov.au/fwo/IDZ00059.warnings_vic.xml"));
        assert!(is_valid_url("https://example.test/feed"));
        assert!(!is_valid_url("ftp://example.test/feed"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn cleanup_strips_bom_and_leading_junk() {
        let cleaned = cleanup_xml("\u{FEFF}  garbage<rss><channel/></rss>");
        assert!(cleaned.starts_with("<?xml"));
        assert!(cleaned.contains("<rss><channel/></rss>"));
        assert!(!cleaned.contains("garbage"));
    }

    #[test]
    fn cleanup_replaces_html_entities() {
        let cleaned = cleanup_xml("<rss><title>Hot&nbsp;&ndash;&deg;C</title></rss>");
        assert!(cleaned.contains("Hot&#160;&#8211;&#176;C"));
    }

    #[test]
    fn cleanup_drops_invalid_characters() {
        let cleaned = cleanup_xml("<?xml version=\"1.0\"?><rss>a\u{0001}b</rss>");
        assert!(cleaned.contains("<rss>ab</rss>"));
    }

    #[test]
    fn preview_truncates() {
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("a\u{0000}b", 3), "[binary data]");
    }
}
