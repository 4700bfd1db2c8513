//! Inline embed scanning.
//!
//! Message bodies encode mentions and links as compact JSON spans of the
//! shape `!{"type":"user","raw":"@kitsne","id":"..."}`. [`scan`] finds the
//! spans in one pass, decodes them, and rebuilds the plain text the author
//! typed.

use serde::Deserialize;

/// One decoded rich-text span.
///
/// `start`/`end` are half-open code-point offsets into the original text,
/// not the plain text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Embed {
    #[serde(rename = "type")]
    pub kind: String,
    pub raw: String,
    pub id: String,
    #[serde(skip)]
    pub start: usize,
    #[serde(skip)]
    pub end: usize,
}

/// Scan `text` for embed spans and strip them.
///
/// Returns the plain text with every span replaced by its `raw` field, and
/// the decoded embeds in left-to-right discovery order. A candidate span
/// that does not decode to the three required keys is left untouched as
/// literal text; scanning never fails, so on span-free input the plain text
/// equals the input.
pub fn scan(text: &str) -> (String, Vec<Embed>) {
    let chars: Vec<char> = text.chars().collect();
    let mut embeds = Vec::new();

    let mut in_embed = false;
    let mut start = 0;
    for i in 0..chars.len() {
        if in_embed {
            if chars[i] == '}' {
                in_embed = false;
                // `{` through this `}`, inclusive
                let body: String = chars[start + 1..=i].iter().collect();
                if let Ok(mut embed) = serde_json::from_str::<Embed>(&body) {
                    embed.start = start;
                    embed.end = i + 1;
                    embeds.push(embed);
                }
                // A failed candidate is literal text; the search resumes
                // after this `}`.
            }
        } else if chars[i] == '!' && chars.get(i + 1) == Some(&'{') {
            in_embed = true;
            start = i;
        }
    }

    // Substitute from the last span backwards so the earlier offsets,
    // computed once against the original text, stay valid.
    let mut plain = chars;
    for embed in embeds.iter().rev() {
        plain.splice(embed.start..embed.end, embed.raw.chars());
    }

    (plain.into_iter().collect(), embeds)
}
