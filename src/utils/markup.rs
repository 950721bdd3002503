//! VNDB markup to portable markdown.
//!
//! The conversion is a fixed sequence of stages. Order matters: links are
//! rewritten before spoilers so link labels inside spoilers survive, and
//! stray spoiler tags are only stripped after every balanced pair has been
//! converted.

use regex::Regex;
use std::sync::LazyLock;

static URL_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[url=([^\]]+?)\](.+?)\[/url\]").expect("Invalid URL_TAG regex")
});

static SPOILER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[spoiler\](.+?)\[/spoiler\]").expect("Invalid SPOILER_TAG regex")
});

static CHARACTER_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+?)\]\(/c(\d+)\)").expect("Invalid CHARACTER_LINK regex")
});

const VNDB_BASE: &str = "https://vndb.org";

/// `[url=TARGET]LABEL[/url]` → `[LABEL](TARGET)`
pub fn convert_url_tags(text: &str) -> String {
    URL_TAG.replace_all(text, "[${2}](${1})").into_owned()
}

/// `[spoiler]BODY[/spoiler]` → `||BODY||`, across lines
pub fn convert_spoilers(text: &str) -> String {
    SPOILER_TAG.replace_all(text, "||${1}||").into_owned()
}

/// Drop unpaired `[spoiler]` / `[/spoiler]` tokens
pub fn strip_stray_spoiler_tags(text: &str) -> String {
    text.replace("[spoiler]", "").replace("[/spoiler]", "")
}

/// `[LABEL](/cN)` → `[LABEL](https://vndb.org/cN)`
pub fn absolutize_character_links(text: &str) -> String {
    CHARACTER_LINK
        .replace_all(text, format!("[${{1}}]({}/c${{2}})", VNDB_BASE).as_str())
        .into_owned()
}

/// Convert VNDB markup to portable markdown.
///
/// Never fails; malformed tags other than spoiler tokens are left as text.
pub fn to_portable_markup(text: &str) -> String {
    let stages: [fn(&str) -> String; 4] = [
        convert_url_tags,
        convert_spoilers,
        strip_stray_spoiler_tags,
        absolutize_character_links,
    ];

    let converted = stages
        .iter()
        .fold(text.to_string(), |acc, stage| stage(&acc));
    converted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "See [url=https://example.com]here[/url] and [spoiler]secret[/spoiler] also [Rei](/c17)";

    #[test]
    fn test_full_conversion() {
        assert_eq!(
            to_portable_markup(SAMPLE),
            "See [here](https://example.com) and ||secret|| also [Rei](https://vndb.org/c17)"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            SAMPLE,
            "  [spoiler]line one\nline two[/spoiler]\n",
            "[url=/c5]Someone[/url] meets [Rei](/c17)",
            "plain text",
            "[spoiler]unterminated",
        ];
        for input in inputs {
            let once = to_portable_markup(input);
            assert_eq!(to_portable_markup(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_multiline_spoiler() {
        assert_eq!(convert_spoilers("[spoiler]a\nb[/spoiler]"), "||a\nb||");
    }

    #[test]
    fn test_stray_spoiler_tags_removed() {
        assert_eq!(to_portable_markup("[spoiler]open only"), "open only");
        assert_eq!(to_portable_markup("close only[/spoiler]"), "close only");
    }

    #[test]
    fn test_malformed_url_left_alone() {
        assert_eq!(
            to_portable_markup("[url=https://x.org]no end"),
            "[url=https://x.org]no end"
        );
    }

    #[test]
    fn test_internal_url_becomes_absolute_character_link() {
        assert_eq!(
            to_portable_markup("[url=/c5]Someone[/url]"),
            "[Someone](https://vndb.org/c5)"
        );
    }

    #[test]
    fn test_non_character_relative_links_untouched() {
        assert_eq!(absolutize_character_links("[VN](/v17)"), "[VN](/v17)");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(to_portable_markup("\n  text  \n"), "text");
    }
}
