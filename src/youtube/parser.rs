use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::transcript::TranscriptSegment;

fn text_selector() -> &'static Selector {
    static TEXT_SELECTOR: OnceLock<Selector> = OnceLock::new();
    TEXT_SELECTOR.get_or_init(|| Selector::parse("text").expect("static selector"))
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Parse YouTube's timed-text XML into segments, in document order.
///
/// Each `<text start=".." dur="..">` becomes one segment. Element bodies are
/// escaped twice by YouTube, so they are decoded a second time and any markup
/// that surfaces is stripped. Elements without text are skipped.
pub fn parse_transcript_xml(raw: &str) -> Result<Vec<TranscriptSegment>, String> {
    let document = Html::parse_fragment(raw);
    let mut segments = Vec::new();

    for element in document.select(text_selector()) {
        let body: String = element.text().collect();
        if body.is_empty() {
            continue;
        }

        let attrs = element.value();
        let start = attrs
            .attr("start")
            .ok_or_else(|| "text element without start attribute".to_string())?;
        let start: f64 = start
            .parse()
            .map_err(|_| format!("invalid start attribute: {:?}", start))?;
        let duration: f64 = match attrs.attr("dur") {
            Some(dur) => dur
                .parse()
                .map_err(|_| format!("invalid dur attribute: {:?}", dur))?,
            None => 0.0,
        };

        segments.push(TranscriptSegment {
            text: strip_markup(&body),
            start,
            duration,
        });
    }

    Ok(segments)
}

/// Decode HTML entities, then drop complete `<...>` tags. A `<` with no
/// closing `>` is kept as text.
pub fn strip_markup(raw: &str) -> String {
    // Escape `<` first so the HTML parser only decodes entities.
    let escaped = raw.replace('<', "&lt;");
    let decoded: String = Html::parse_fragment(&escaped)
        .root_element()
        .text()
        .collect();
    tag_regex().replace_all(&decoded, "").into_owned()
}
