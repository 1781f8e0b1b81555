//! Post-processing of recognized text into a dialable token

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Runs of characters a dial string may contain
static DIAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*#0-9]+").expect("dial run pattern is valid"));

/// Turns raw OCR output into the first dialable token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExtractor {
    min_len: usize,
    substitute_letter_o: bool,
}

impl TokenExtractor {
    pub fn new(min_len: usize, substitute_letter_o: bool) -> Self {
        Self {
            min_len: min_len.max(1),
            substitute_letter_o,
        }
    }

    /// Strip all whitespace, then optionally read `O`/`o` as `0`
    pub fn clean(&self, raw: &str) -> String {
        raw.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                'O' | 'o' if self.substitute_letter_o => '0',
                c => c,
            })
            .collect()
    }

    /// Leftmost maximal run of digits, `*` and `#` that is at least `min_len` long
    pub fn find_token<'a>(&self, cleaned: &'a str) -> Option<&'a str> {
        DIAL_RUN
            .find_iter(cleaned)
            .map(|m| m.as_str())
            .find(|run| run.len() >= self.min_len)
    }

    pub fn extract(&self, raw: &str) -> RecognitionResult {
        let cleaned = self.clean(raw);
        let token = self.find_token(&cleaned).map(str::to_string);
        log::debug!("Cleaned OCR text {:?}, token {:?}", cleaned, token);
        RecognitionResult {
            raw_text: raw.to_string(),
            cleaned_text: cleaned,
            token,
        }
    }
}

/// Text from one OCR run and what was made of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub raw_text: String,
    pub cleaned_text: String,
    /// `None` means no number was found, which is not an error
    pub token: Option<String>,
}

impl RecognitionResult {
    pub fn dial_uri(&self) -> Option<DialUri> {
        self.token.as_deref().map(DialUri::for_token)
    }
}

/// A `tel:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialUri(String);

impl DialUri {
    pub fn for_token(token: &str) -> Self {
        Self(format!("tel:{}", token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The dial string without the scheme
    pub fn number(&self) -> &str {
        self.0.strip_prefix("tel:").unwrap_or(&self.0)
    }
}

impl fmt::Display for DialUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_o_becomes_zero() {
        let extractor = TokenExtractor::new(5, true);
        let result = extractor.extract("O123456");
        assert_eq!(result.cleaned_text, "0123456");
        assert_eq!(result.token.as_deref(), Some("0123456"));
        assert_eq!(result.dial_uri().unwrap().as_str(), "tel:0123456");
    }

    #[test]
    fn test_short_run_is_no_number() {
        let extractor = TokenExtractor::new(5, true);
        let result = extractor.extract("ab12#3cd");
        assert_eq!(result.cleaned_text, "ab12#3cd");
        assert_eq!(result.token, None);
        assert!(result.dial_uri().is_none());
    }

    #[test]
    fn test_letters_and_whitespace_only() {
        let extractor = TokenExtractor::new(5, true);
        assert_eq!(extractor.extract("  hello \n world\t").token, None);
        assert_eq!(extractor.extract("").token, None);
    }

    #[test]
    fn test_whitespace_joins_digit_groups() {
        let extractor = TokenExtractor::new(5, false);
        let result = extractor.extract("Dial *123 *45 #\nnow");
        assert_eq!(result.token.as_deref(), Some("*123*45#"));
    }

    #[test]
    fn test_first_qualifying_run_wins() {
        let extractor = TokenExtractor::new(5, false);
        let result = extractor.extract("12x34567y8888888888");
        assert_eq!(result.token.as_deref(), Some("34567"));
    }

    #[test]
    fn test_substitution_is_optional() {
        let extractor = TokenExtractor::new(5, false);
        assert_eq!(extractor.extract("O123456").token.as_deref(), Some("123456"));
        assert_eq!(extractor.extract("12o34").token, None);

        let extractor = TokenExtractor::new(5, true);
        assert_eq!(extractor.extract("12o34").token.as_deref(), Some("12034"));
    }

    #[test]
    fn test_non_ascii_digits_are_ignored() {
        let extractor = TokenExtractor::new(5, false);
        assert_eq!(extractor.extract("١٢٣٤٥٦").token, None);
    }

    #[test]
    fn test_dial_uri_number() {
        let uri = DialUri::for_token("*100#");
        assert_eq!(uri.number(), "*100#");
        assert_eq!(uri.to_string(), "tel:*100#");
    }
}
