//! Best-effort markup stripping for request fields.
//!
//! Runs at the HTTP boundary before validation. This is a pre-filter, not a
//! security boundary: anything that survives is still rejected by the SSN
//! format check unless it is digits and dashes.
//!
//! Order:
//! 1. drop whole elements, `<tag ...>content</tag>`
//! 2. drop remaining tag-shaped spans (`<br>`, `</p>`, `<!-- -->`)
//! 3. drop stray `<` / `>`
//! 4. trim

use regex::Regex;

const ELEMENT_PATTERN: &str = r"(?is)<(?:[a-z][a-z0-9-]*)\b[^<>]*>.*?</[a-z][a-z0-9-]*\s*>";
const TAG_PATTERN: &str = r"(?s)<!--.*?-->|</?[A-Za-z][^<>]*>";

#[derive(Debug, Clone)]
pub struct Sanitizer {
    element: Regex,
    tag: Regex,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer {
    pub fn new() -> Self {
        Self {
            element: Regex::new(ELEMENT_PATTERN).expect("element pattern is a valid regex"),
            tag: Regex::new(TAG_PATTERN).expect("tag pattern is a valid regex"),
        }
    }

    pub fn clean(&self, input: &str) -> String {
        let without_elements = self.element.replace_all(input, "");
        let without_tags = self.tag.replace_all(&without_elements, "");
        without_tags
            .chars()
            .filter(|c| *c != '<' && *c != '>')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(input: &str) -> String {
        Sanitizer::new().clean(input)
    }

    #[test]
    fn test_plain_input_untouched() {
        assert_eq!(clean("123-45-6789"), "123-45-6789");
        assert_eq!(clean("  123-45-6789\t"), "123-45-6789");
    }

    #[test]
    fn test_strips_script_element() {
        assert_eq!(clean("123-45-6789<script>x</script>"), "123-45-6789");
        assert_eq!(clean("123-45-6789<script>alert('xss')</script>"), "123-45-6789");
        assert_eq!(clean("<SCRIPT type=\"text/javascript\">\nevil()\n</SCRIPT>123-45-6789"), "123-45-6789");
    }

    #[test]
    fn test_strips_formatting_element() {
        assert_eq!(clean("123-45-6789<b>test</b>"), "123-45-6789");
    }

    #[test]
    fn test_strips_lone_tags_and_comments() {
        assert_eq!(clean("123-45-<br/>6789"), "123-45-6789");
        assert_eq!(clean("123-45-6789<!-- hi -->"), "123-45-6789");
        assert_eq!(clean("<img src=x onerror=alert(1)>123-45-6789"), "123-45-6789");
    }

    #[test]
    fn test_strips_bare_brackets() {
        assert_eq!(clean("123<45>6789"), "123456789");
        assert_eq!(clean("<<123-45-6789>>"), "123-45-6789");
        assert_eq!(clean("1 < 2"), "1  2");
    }

    #[test]
    fn test_only_markup_becomes_empty() {
        assert_eq!(clean("<script>x</script>"), "");
        assert_eq!(clean("   <>  "), "");
    }

    #[test]
    fn test_entities_and_inner_spaces_kept() {
        assert_eq!(clean("&lt;123-45-6789&gt;"), "&lt;123-45-6789&gt;");
        assert_eq!(clean("123 -  45-6789"), "123 -  45-6789");
    }
}
