use pretty_assertions::assert_eq;
use url::Url;
use wiki_engine::{article_url, build_document, parse_document, DocumentParseError, StoredDocument};

#[test]
fn parse_recovers_what_build_wrote() {
    let body = "Intro.\n\nTITLE: not a header\n==============================\n\ntrailing\n";
    let text = build_document("Париж", "https://ru.wikipedia.org/wiki/Париж", body);

    assert_eq!(
        parse_document(&text).unwrap(),
        StoredDocument {
            title: "Париж".to_string(),
            source_url: "https://ru.wikipedia.org/wiki/Париж".to_string(),
            body: body.to_string(),
        }
    );
}

#[test]
fn parse_rejects_text_without_header() {
    assert_eq!(
        parse_document("just text\nmore").unwrap_err(),
        DocumentParseError::MissingHeader("TITLE")
    );
    assert_eq!(
        parse_document("TITLE: x\nno source\n").unwrap_err(),
        DocumentParseError::MissingHeader("SOURCE")
    );
    assert_eq!(
        parse_document("TITLE: x\nSOURCE: y\nbody").unwrap_err(),
        DocumentParseError::MissingSeparator
    );
}

#[test]
fn article_url_uses_underscores_and_escapes_slashes() {
    let base = Url::parse("https://ru.wikipedia.org/wiki/").unwrap();
    assert_eq!(
        article_url(&base, "Hello World"),
        "https://ru.wikipedia.org/wiki/Hello_World"
    );
    assert_eq!(
        article_url(&base, "AC/DC"),
        "https://ru.wikipedia.org/wiki/AC%2FDC"
    );
}

#[test]
fn line_breaks_in_title_survive_round_trip() {
    let title = "A\nB\r\nC \\n literal";
    let text = build_document(title, "https://ru.wikipedia.org/wiki/A", "body\nlines");

    assert_eq!(text.lines().next(), Some("TITLE: A\\nB\\r\\nC \\\\n literal"));
    let doc = parse_document(&text).unwrap();
    assert_eq!(doc.title, title);
    assert_eq!(doc.body, "body\nlines");
}
