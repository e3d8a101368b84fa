use url::Url;

const TITLE_PREFIX: &str = "TITLE: ";
const SOURCE_PREFIX: &str = "SOURCE: ";
const SEPARATOR: &str = "==============================";

/// A saved article as recovered from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub title: String,
    pub source_url: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentParseError {
    #[error("missing {0} header line")]
    MissingHeader(&'static str),
    #[error("missing separator after header")]
    MissingSeparator,
}

/// Header lines, a separator, a blank line, then the body verbatim.
///
/// Header values are escaped so each stays on one line.
pub fn build_document(title: &str, source_url: &str, body: &str) -> String {
    format!(
        "{TITLE_PREFIX}{title}\n{SOURCE_PREFIX}{source_url}\n{SEPARATOR}\n\n{body}",
        title = escape_header(title),
        source_url = escape_header(source_url),
    )
}

/// Inverse of [`build_document`]. The body is everything after the header
/// block, so it may itself contain header-like lines.
pub fn parse_document(text: &str) -> Result<StoredDocument, DocumentParseError> {
    let (title_line, rest) = text
        .split_once('\n')
        .ok_or(DocumentParseError::MissingHeader("TITLE"))?;
    let title = title_line
        .strip_prefix(TITLE_PREFIX)
        .ok_or(DocumentParseError::MissingHeader("TITLE"))?;
    let (source_line, rest) = rest
        .split_once('\n')
        .ok_or(DocumentParseError::MissingHeader("SOURCE"))?;
    let source_url = source_line
        .strip_prefix(SOURCE_PREFIX)
        .ok_or(DocumentParseError::MissingHeader("SOURCE"))?;
    let body = rest
        .strip_prefix(SEPARATOR)
        .and_then(|rest| rest.strip_prefix("\n\n"))
        .ok_or(DocumentParseError::MissingSeparator)?;
    Ok(StoredDocument {
        title: unescape_header(title),
        source_url: unescape_header(source_url),
        body: body.to_string(),
    })
}

fn escape_header(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_header(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('\\') => unescaped.push('\\'),
            // Not written by `escape_header`; keep as-is.
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

/// Public page URL for `title` under `base` (e.g. `https://ru.wikipedia.org/wiki/`).
pub fn article_url(base: &Url, title: &str) -> String {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(&title.replace(' ', "_"));
    }
    url.to_string()
}
