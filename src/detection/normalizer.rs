//! Placeholder substitution for raw log messages
//!
//! Variable substrings (block ids, addresses, paths, hashes, counters) are
//! collapsed into fixed placeholders so that messages produced by the same
//! log statement map onto the same vocabulary terms.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Ordered `(pattern, replacement)` rules, applied to lowercased text.
///
/// Order matters:
/// - block ids come first so their digits never reach the number rule;
/// - dotted quads precede paths and numbers, which would otherwise split them;
/// - paths precede hex and numbers because path segments carry digits, and
///   a path segment may not start with `<` so earlier placeholders survive;
/// - hex runs precede plain numbers, which are the catch-all.
///
/// A path starts at the beginning of the text or after whitespace, `:`, `=`
/// or a placeholder.
pub const RULE_PATTERNS: [(&str, &str); 5] = [
    (r"blk_-?\d+", "<blk>"),
    (r"\b\d{1,3}(?:\.\d{1,3}){3}\b", "<ip>"),
    (r"(^|[\s:=>])(?:/[^\s/<>]+)+/?", "${1}<path>"),
    (r"\b(?:0x)?[0-9a-f]{6,}\b", "<hex>"),
    (r"\b\d+\b", "<num>"),
];

/// Index of the hex rule, whose matches must also contain a digit so that
/// words such as `deface` are left alone.
const HEX_RULE: usize = 3;

static RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    RULE_PATTERNS
        .iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("normalizer rule patterns are valid"),
                *replacement,
            )
        })
        .collect()
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Normalize one raw log message.
///
/// Total and deterministic; running it again on its own output returns the
/// same string.
pub fn normalize(message: &str) -> String {
    let mut text = message.to_lowercase();

    for (rule, (pattern, replacement)) in RULES.iter().enumerate() {
        text = if rule == HEX_RULE {
            pattern
                .replace_all(&text, |caps: &Captures| {
                    let run = &caps[0];
                    if run.bytes().any(|b| b.is_ascii_digit()) {
                        replacement.to_string()
                    } else {
                        run.to_string()
                    }
                })
                .into_owned()
        } else {
            pattern.replace_all(&text, *replacement).into_owned()
        };
    }

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_replaced() {
        let out = normalize("PacketResponder blk_-1608999687919862906 for block terminated");
        assert!(out.contains("<blk>"));
        assert!(!out.contains("blk_"));
        assert_eq!(out, "packetresponder <blk> for block terminated");
    }

    #[test]
    fn test_ip_and_port_replaced() {
        let out = normalize("Received block from 173.194.34.10 port 50010");
        assert_eq!(out, "received block from <ip> port <num>");
        assert!(!out.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_ip_with_port_after_slash() {
        let out = normalize("Receiving block src: /10.250.19.102:54106 dest: /10.250.19.102:50010");
        assert_eq!(out, "receiving block src: /<ip>:<num> dest: /<ip>:<num>");
    }

    #[test]
    fn test_path_replaced() {
        let out = normalize("Deleting block file /mnt/hadoop/dfs/data/current/subdir28/part-1");
        assert_eq!(out, "deleting block file <path>");

        // The block id is claimed first; the path stops at its placeholder.
        let out = normalize("Deleting /mnt/data/blk_38 now");
        assert_eq!(out, "deleting <path><blk> now");

        let out = normalize("/user/root/rand/_temporary/part-00001 created");
        assert_eq!(out, "<path> created");
    }

    #[test]
    fn test_relative_slash_not_a_path() {
        assert_eq!(normalize("read/write error"), "read/write error");
    }

    #[test]
    fn test_hex_replaced() {
        assert_eq!(normalize("checksum 0x7f3a2bc9 mismatch"), "checksum <hex> mismatch");
        assert_eq!(normalize("token deadbeef01"), "token <hex>");
        // Five hex digits are too short to count.
        assert_eq!(normalize("code abc12"), "code abc12");
    }

    #[test]
    fn test_hex_letters_alone_are_words() {
        assert_eq!(
            normalize("deface the facade 1234567"),
            "deface the facade <hex>"
        );
        assert_eq!(normalize("id 0xdeface"), "id <hex>");
        assert_eq!(normalize("id facade9"), "id <hex>");
    }

    #[test]
    fn test_path_after_separator() {
        assert_eq!(normalize("file:/user/root/x opened"), "file:<path> opened");
        assert_eq!(normalize("dir=/tmp/spill/0 full"), "dir=<path> full");
        assert_eq!(normalize("to /10.1.2.3/data/x"), "to /<ip><path>");
    }

    #[test]
    fn test_long_decimal_runs_count_as_hex() {
        assert_eq!(normalize("offset 1234567"), "offset <hex>");
        assert_eq!(normalize("offset 12345"), "offset <num>");
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(normalize("  Served \t block\n\n 42  "), "served block <num>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "PacketResponder blk_-1608999687919862906 for block terminated",
            "Received block from 173.194.34.10 port 50010",
            "src: /10.250.19.102:54106 dest: /10.250.19.102:50010",
            "Deleting /mnt/hadoop/dfs/data/blk_38 size 67108864 hash 0xdeadbeef",
            "Verification succeeded for blk_1 at   <num> 12 /tmp",
            "file:/user/root/x dir=/tmp/a /10.1.2.3/data deface",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_deterministic() {
        let msg = "Got exception while serving blk_7503483334202473044 to /10.251.203.80:";
        assert_eq!(normalize(msg), normalize(msg));
    }
}
