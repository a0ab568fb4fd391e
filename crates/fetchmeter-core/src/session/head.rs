//! Response header parsing shared by the HEAD probe and the GET transfer.

/// Metadata from a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadInfo {
    /// `Content-Length`, if present.
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    /// `Content-Disposition` value (file name hint).
    pub content_disposition: Option<String>,
    pub last_modified: Option<String>,
}

/// Value of header `name` if `line` is that header (case-insensitive name).
pub(crate) fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (n, v) = line.split_once(':')?;
    n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
}

/// True for a status line (`HTTP/1.1 200 OK`), which starts a new response
/// when redirects are followed.
pub(crate) fn is_status_line(line: &str) -> bool {
    line.starts_with("HTTP/")
}

/// Parse collected header lines. Only the last response counts.
pub(crate) fn parse_head(lines: &[String]) -> HeadInfo {
    let mut info = HeadInfo::default();
    for line in lines {
        let line = line.trim();
        if is_status_line(line) {
            info = HeadInfo::default();
        } else if let Some(v) = header_value(line, "content-length") {
            info.content_length = v.parse().ok();
        } else if let Some(v) = header_value(line, "content-type") {
            info.content_type = Some(v.to_string());
        } else if let Some(v) = header_value(line, "content-disposition") {
            info.content_disposition = Some(v.to_string());
        } else if let Some(v) = header_value(line, "last-modified") {
            info.last_modified = Some(v.to_string());
        }
    }
    info
}
