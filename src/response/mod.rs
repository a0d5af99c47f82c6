//! Splitting AI replies into code and an optional follow-up suggestion.
//!
//! Replies follow a plain-text contract:
//!
//! ```text
//! ---CODIGO---
//! <code>
//! ---SUGERENCIA---
//! <next change the assistant proposes>
//! ```
//!
//! Markdown fences are removed wherever they appear in the code section, so
//! generated code must not itself contain triple-backtick text.

use crate::errors::ShellError;

pub const CODE_MARKER: &str = "---CODIGO---";
pub const SUGGESTION_MARKER: &str = "---SUGERENCIA---";

/// Longest first: the bare fence must go last or it would eat the prefix of
/// the language-tagged ones.
const FENCES: [&str; 3] = ["```python", "```html", "```"];

const CHATTER_MARKERS: [&str; 7] =
    ["Notes:", "Summary:", "Note:", "Hope this", "Explanation:", "Done.", "Here is"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub code: String,
    pub suggestion: Option<String>,
}

pub fn parse(raw: &str) -> Result<ParsedResponse, ShellError> {
    if !raw.contains(CODE_MARKER) {
        return Err(ShellError::NoCodeBlock);
    }

    // Anything after a second suggestion marker is dropped.
    let mut segments = raw.split(SUGGESTION_MARKER);
    let code_part = segments.next().unwrap_or_default();
    let suggestion_part = segments.next();

    let code = strip_fences(&code_part.replace(CODE_MARKER, ""));
    let suggestion = suggestion_part
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ParsedResponse { code, suggestion })
}

pub fn strip_fences(code: &str) -> String {
    let mut out = code.trim().to_string();
    for fence in FENCES {
        out = out.replace(fence, "");
    }
    out.trim().to_string()
}

/// Body of the first block fenced as `lang`, else of the first fenced block,
/// else the whole text.
pub fn extract_fenced(text: &str, lang: &str) -> String {
    let tagged = format!("```{lang}");
    let start = text
        .match_indices(&tagged)
        .map(|(i, _)| i)
        .find(|&i| text[i + tagged.len()..].starts_with(['\n', '\r']))
        .or_else(|| text.find("```"));
    let Some(start) = start else {
        return text.trim().to_string();
    };
    let after_open = &text[start + 3..];
    // Drop the language tag on the opening fence line.
    let body = match after_open.find('\n') {
        Some(nl) if !after_open[..nl].contains("```") => &after_open[nl + 1..],
        _ => after_open,
    };
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim().to_string()
}

/// Cuts generated code at the first line where the model starts talking
/// instead of coding.
pub fn strip_chatter(code: &str) -> String {
    let mut kept = Vec::new();
    for line in code.lines() {
        let stripped = line.trim();
        if CHATTER_MARKERS.iter().any(|m| stripped.starts_with(m)) {
            break;
        }
        kept.push(line);
    }
    kept.join("\n").trim().to_string()
}
