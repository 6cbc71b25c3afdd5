// Text Processing Service
// Cleans raw input and splits it into sentences for analysis.

use crate::models::Document;
use regex::Regex;
use std::sync::OnceLock;

/// Sentences shorter than this (in whitespace words) are treated as noise.
pub const MIN_SENTENCE_WORDS: usize = 3;

/// Turns raw input into cleaned text plus an ordered sentence list in which
/// every sentence has at least three whitespace-delimited words.
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, raw_text: &str) -> Document;
}

/// Rule-based normalizer: whitespace and quote cleanup followed by
/// punctuation-driven sentence splitting.
#[derive(Debug, Clone, Default)]
pub struct RuleNormalizer;

impl TextNormalizer for RuleNormalizer {
    fn normalize(&self, raw_text: &str) -> Document {
        let cleaned = clean_text(raw_text);
        let sentences = split_sentences(&cleaned)
            .into_iter()
            .filter(|s| s.split_whitespace().count() >= MIN_SENTENCE_WORDS)
            .collect();
        Document::new(cleaned, sentences)
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Collapse all whitespace (including line breaks) to single spaces and
/// replace typographic quotes and dashes with ASCII.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{2014}', "-")
        .replace(['\u{3000}', '\u{00A0}'], " ");

    whitespace_re().replace_all(&s, " ").trim().to_string()
}

const ABBREVIATIONS: [&str; 12] = [
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e",
];

fn is_abbreviation(buffer: &str) -> bool {
    let last = buffer
        .trim_end_matches('.')
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '"', '\''])
        .to_lowercase();
    ABBREVIATIONS.contains(&last.as_str())
}

/// Split on sentence-ending punctuation, keeping quoted passages, decimal
/// numbers and common abbreviations intact. Quotes only hold a sentence
/// together when they pair up; a stray `"` (inch mark, missing close) is
/// treated as plain text.
pub fn split_sentences(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }

    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut buffer = String::new();
    let track_quotes = text.matches('"').count() % 2 == 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        buffer.push(ch);

        if ch == '"' && track_quotes {
            in_quote = !in_quote;
        }

        if ['.', '!', '?', '。', '！', '？'].contains(&ch) && !in_quote {
            let decimal = ch == '.'
                && i > 0
                && i + 1 < chars.len()
                && chars[i - 1].is_ascii_digit()
                && chars[i + 1].is_ascii_digit();
            let abbreviation = ch == '.' && is_abbreviation(&buffer);

            // Keep runs like "?!" or "..." together, and a closing quote or bracket.
            while i + 1 < chars.len() && matches!(chars[i + 1], '.' | '!' | '?' | '"' | ')' | '\'') {
                i += 1;
                buffer.push(chars[i]);
                if chars[i] == '"' && track_quotes {
                    in_quote = !in_quote;
                }
            }

            let at_boundary = i + 1 >= chars.len() || chars[i + 1].is_whitespace();
            if !decimal && !abbreviation && at_boundary {
                let sentence = buffer.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                buffer.clear();
            }
        }

        i += 1;
    }

    let remaining = buffer.trim();
    if !remaining.is_empty() {
        sentences.push(remaining.to_string());
    }

    sentences
}
