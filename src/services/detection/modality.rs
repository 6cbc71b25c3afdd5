// Modality Detection
// Separates natural-language prose from code and technical markup, which the
// prose-trained scorers handle poorly.

use crate::models::{Modality, ModalityReport};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const CODE_PATTERNS: [&str; 21] = [
    r"\bimport\b.*\bfrom\b",
    r"\bdef\b\s+\w+\s*\(",
    r"\bclass\b\s+\w+[:\(]",
    r"const\s+\w+\s*=",
    r"let\s+\w+\s*=",
    r"var\s+\w+\s*=",
    r"\bpublic\s+class\b",
    r"Console\.WriteLine",
    r"System\.out\.println",
    r"\s*=\s*\[.*\]",
    r"\s*=\s*\{.*\}",
    r"\bif\b\s*\(.*\)\s*\{",
    r"\bfunction\b\s*\w*\s*\(",
    r"#include\s+<.*>",
    r"<\?php",
    r"pip\s+install",
    r"npm\s+install",
    r"docker-compose",
    r"\.py$",
    r"\.js$",
    r"--\w+",
];

fn code_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        CODE_PATTERNS
            .iter()
            .map(|p| Regex::new(&format!("(?im){}", p)).expect("code pattern regex"))
            .collect()
    })
}

fn is_symbol(c: char) -> bool {
    matches!(c, '{' | '}' | '(' | ')' | '[' | ']' | '=' | '<' | '>' | ':' | ';')
}

pub fn detect_modality(text: &str) -> ModalityReport {
    let lines: Vec<&str> = text.split('\n').collect();
    let indent_count = lines
        .iter()
        .filter(|l| l.starts_with("    ") || l.starts_with('\t'))
        .count();
    let symbol_count = text.chars().filter(|c| is_symbol(*c)).count();
    let word_count = text.split_whitespace().count();
    let pattern_matches = code_patterns().iter().filter(|re| re.is_match(text)).count();

    let symbol_density = if word_count > 0 {
        symbol_count as f64 / word_count as f64
    } else {
        0.0
    };
    let indent_density = indent_count as f64 / lines.len() as f64;

    let is_technical = pattern_matches >= 2
        || (pattern_matches >= 1 && symbol_density > 0.3)
        || symbol_density > 0.5
        || (indent_density > 0.4 && symbol_density > 0.2);

    let (modality, confidence) = if is_technical {
        (
            Modality::Technical,
            (0.5 + pattern_matches as f64 * 0.1 + symbol_density * 0.2).min(1.0),
        )
    } else {
        (Modality::Prose, 1.0)
    };

    debug!(
        modality = modality.as_str(),
        pattern_matches, symbol_density, indent_density, "modality"
    );
    ModalityReport {
        modality,
        confidence,
        pattern_matches,
        symbol_density,
        indent_density,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prose() {
        let report = detect_modality(
            "The weather was lovely this morning. We walked along the river and talked about old friends.",
        );
        assert_eq!(report.modality, Modality::Prose);
        assert_eq!(report.confidence, 1.0);
        assert_eq!(report.pattern_matches, 0);
    }

    #[test]
    fn test_python_code() {
        let code = "import os\nfrom pathlib import Path\n\ndef main():\n    items = [1, 2, 3]\n    for i in items:\n        print(i)\n";
        let report = detect_modality(code);
        assert_eq!(report.modality, Modality::Technical);
        assert!(report.pattern_matches >= 2);
        assert!(report.confidence > 0.5 && report.confidence <= 1.0);
    }

    #[test]
    fn test_symbol_density_alone() {
        let report = detect_modality("x = {a: b}; y = (c[d]) <e>;");
        assert!(report.symbol_density > 0.5);
        assert_eq!(report.modality, Modality::Technical);
    }

    #[test]
    fn test_install_instructions() {
        let report = detect_modality("Run pip install requests and then npm install to set things up.");
        assert_eq!(report.pattern_matches, 2);
        assert_eq!(report.modality, Modality::Technical);
    }

    #[test]
    fn test_empty() {
        let report = detect_modality("");
        assert_eq!(report.modality, Modality::Prose);
        assert_eq!(report.confidence, 1.0);
        assert_eq!(report.pattern_matches, 0);
        assert_eq!(report.symbol_density, 0.0);
        assert_eq!(report.indent_density, 0.0);
    }
}
