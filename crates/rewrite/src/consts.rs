use regex::Regex;
use std::sync::LazyLock;

// An attribute value: double quoted, single quoted, or bare.
const ATTR_VALUE: &str = r#"\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Opening tags that may load a subresource. `[^>]*` means a `>` inside an
// attribute value ends the match early; such tags are left alone.
regex!(TAG_REGEX, r"(?i)<(?:script|link)\b[^>]*>");
regex!(SRC_ATTR_REGEX, format!(r"(?i)\ssrc{ATTR_VALUE}").as_str());
regex!(HREF_ATTR_REGEX, format!(r"(?i)\shref{ATTR_VALUE}").as_str());
regex!(REL_ATTR_REGEX, format!(r"(?i)\srel{ATTR_VALUE}").as_str());
regex!(INTEGRITY_ATTR_REGEX, r"(?i)\sintegrity\s*=");
regex!(CROSSORIGIN_ATTR_REGEX, r"(?i)\scrossorigin(?:\s|=|/?>)");

/// Value of the first match of an attribute regex, whichever way it was
/// quoted.
pub(crate) fn attribute<'a>(regex: &Regex, tag: &'a str) -> Option<&'a str> {
    let captures = regex.captures(tag)?;
    (1..=3).find_map(|group| captures.get(group)).map(|value| value.as_str())
}
