use std::sync::OnceLock;

use memchr::memchr;
use regex::Regex;

/// Drops the header line (`#document` / `#document-fragment`) of a tree dump.
///
/// A dump with no newline has nothing past its header and normalizes to "".
pub fn normalize_dump(dump: &str) -> String {
    match memchr(b'\n', dump.as_bytes()) {
        Some(pos) => dump[pos + 1..].to_string(),
        None => String::new(),
    }
}

fn bare_tag_line() -> &'static Regex {
    static BARE_TAG: OnceLock<Regex> = OnceLock::new();
    BARE_TAG.get_or_init(|| {
        Regex::new(r"(?m)^(\|?[ \t]*)<([^\s>]+)>").expect("bare tag pattern is valid")
    })
}

/// Rewrites expected dumps for a namespacing parser: the first bare tag of
/// each line, `<name>`, becomes `<html name>`.
pub fn rewrite_for_namespace(expected: &str) -> String {
    bare_tag_line()
        .replace_all(expected, "${1}<html ${2}>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_only_the_header() {
        assert_eq!(normalize_dump("#document\n| <html>\n|   <head>"), "| <html>\n|   <head>");
        assert_eq!(normalize_dump("#document\n| <p>\n"), "| <p>\n");
        assert_eq!(normalize_dump("#document"), "");
        assert_eq!(normalize_dump(""), "");
    }

    #[test]
    fn rewrites_bare_tags_only() {
        let expected = [
            "#document",
            "| <!DOCTYPE html>",
            "| <!-- c -->",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     <svg svg>",
            "|       viewBox=\"0 0 1 1\"",
            "|     \"<p>\"",
        ]
        .join("\n");
        let rewritten = rewrite_for_namespace(&expected);
        let lines: Vec<&str> = rewritten.lines().collect();
        assert_eq!(lines[0], "#document");
        assert_eq!(lines[1], "| <!DOCTYPE html>");
        assert_eq!(lines[2], "| <!-- c -->");
        assert_eq!(lines[3], "| <html html>");
        assert_eq!(lines[4], "|   <html head>");
        assert_eq!(lines[5], "|   <html body>");
        assert_eq!(lines[6], "|     <svg svg>");
        assert_eq!(lines[7], "|       viewBox=\"0 0 1 1\"");
        assert_eq!(lines[8], "|     \"<p>\"");
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = rewrite_for_namespace("| <html>\n|   <body>");
        assert_eq!(once, "| <html html>\n|   <html body>");
        assert_eq!(rewrite_for_namespace(&once), once);
    }

    #[test]
    fn rewrites_lines_without_dump_marker() {
        assert_eq!(rewrite_for_namespace("  <b>"), "  <html b>");
    }
}
