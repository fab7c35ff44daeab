//! Commit-message structural decomposition (spec.md §3, §4.6): splits a raw
//! message into title/type/scope/breaking/description/body/footers without
//! judging whether it's *good*, that's the validator's job.

use std::sync::LazyLock;

use regex::Regex;

/// `Revert "..."` commits (and `Revert '...'`) always parse as valid,
/// bypassing the conventional-commit grammar entirely (spec.md §4.6).
/// Bounded to 300 code points to stay clear of ReDoS on pathological input.
static REVERT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^Revert ["'].{1,300}["']$"#).unwrap());

/// `type(scope)!: description`. Type and scope are short identifiers;
/// description is bounded so a title of unreasonable length can't blow up
/// matching time.
static CONVENTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[a-zA-Z]{1,20})(\((?P<scope>[-_a-zA-Z0-9/]{1,60})\))?(?P<bang>!)?: (?P<desc>.{1,300})$")
        .unwrap()
});

/// `scope: description`, no type prefix — the "scope-only" grammar
/// (spec.md §4.6's `commit_style` alternative). Scope is restricted to
/// lowercase/numeric/path characters per the GLOSSARY definition.
pub static SCOPE_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<scope>[a-z0-9/_-]{1,60}): (?P<desc>.{1,300})$").unwrap()
});

/// A footer line: `Key: value` or `Key #value`, per git trailer
/// conventions. `BREAKING CHANGE` is the one two-word key we recognize.
static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>BREAKING CHANGE|BREAKING-CHANGE|[A-Za-z][A-Za-z0-9-]{0,40}): ?(?P<value>.{0,500})$")
        .unwrap()
});

/// Structural decomposition of a commit message. `valid` reflects only
/// whether the title matched a recognized grammar (conventional or revert);
/// it says nothing about policy (that's [`crate::validators::commit_message`]).
#[derive(Debug, Clone)]
pub struct ParsedCommit {
    pub raw: String,
    pub title: String,
    pub commit_type: Option<String>,
    pub scope: Option<String>,
    pub breaking: bool,
    pub description: String,
    pub body: String,
    pub footers: Vec<(String, String)>,
    pub is_revert: bool,
    pub valid: bool,
    pub parse_error: Option<String>,
}

impl ParsedCommit {
    pub fn title_len_chars(&self) -> usize {
        self.title.chars().count()
    }

    pub fn footer(&self, key: &str) -> Option<&str> {
        self.footers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_footer(&self, key: &str) -> bool {
        self.footer(key).is_some()
    }

    /// Re-serializes this commit back into a message string. Used by the
    /// round-trip property in spec.md §8: `parse(serialize(parse(m))) ==
    /// parse(m)` for any message produced by this grammar.
    pub fn serialize(&self) -> String {
        let mut out = self.title.clone();
        if !self.body.is_empty() {
            out.push_str("\n\n");
            out.push_str(&self.body);
        }
        if !self.footers.is_empty() {
            out.push_str("\n\n");
            let footer_lines: Vec<String> = self
                .footers
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect();
            out.push_str(&footer_lines.join("\n"));
        }
        out
    }
}

/// Splits `message` into title / body / footers and classifies the title.
/// Never fails: unparseable titles produce `valid: false` with
/// `parse_error` set, not an `Err`, since structural parse errors never
/// block (spec.md §7).
pub fn parse_commit_message(message: &str) -> ParsedCommit {
    let raw = message.to_string();
    let mut lines = message.lines();
    let title = lines.next().unwrap_or_default().to_string();

    let rest: Vec<&str> = lines.collect();
    let (body, footers) = split_body_and_footers(&rest);

    if REVERT_RE.is_match(&title) {
        return ParsedCommit {
            raw,
            title,
            commit_type: None,
            scope: None,
            breaking: false,
            description: String::new(),
            body,
            footers,
            is_revert: true,
            valid: true,
            parse_error: None,
        };
    }

    match CONVENTIONAL_RE.captures(&title) {
        Some(caps) => {
            let commit_type = caps.name("type").map(|m| m.as_str().to_lowercase());
            let scope = caps.name("scope").map(|m| m.as_str().to_string());
            let bang_breaking = caps.name("bang").is_some();
            let description = caps.name("desc").map(|m| m.as_str().to_string()).unwrap_or_default();
            let footer_breaking = footers
                .iter()
                .any(|(k, _)| k.eq_ignore_ascii_case("BREAKING CHANGE") || k.eq_ignore_ascii_case("BREAKING-CHANGE"));

            ParsedCommit {
                raw,
                title,
                commit_type,
                scope,
                breaking: bang_breaking || footer_breaking,
                description,
                body,
                footers,
                is_revert: false,
                valid: true,
                parse_error: None,
            }
        }
        None => ParsedCommit {
            raw,
            title,
            commit_type: None,
            scope: None,
            breaking: false,
            description: String::new(),
            body,
            footers,
            is_revert: false,
            valid: false,
            parse_error: Some("title does not match `type(scope)!: description`".to_string()),
        },
    }
}

/// Walks backward from the end collecting contiguous footer-shaped lines;
/// everything above that (minus the separating blank line) is the body.
fn split_body_and_footers(rest: &[&str]) -> (String, Vec<(String, String)>) {
    let mut footer_start = rest.len();
    let mut footers_rev = Vec::new();

    let mut i = rest.len();
    while i > 0 {
        let line = rest[i - 1];
        if line.trim().is_empty() {
            break;
        }
        match FOOTER_RE.captures(line) {
            Some(caps) => {
                let key = caps.name("key").map(|m| m.as_str().to_string()).unwrap_or_default();
                let value = caps.name("value").map(|m| m.as_str().to_string()).unwrap_or_default();
                footers_rev.push((key, value));
                footer_start = i - 1;
                i -= 1;
            }
            None => break,
        }
    }

    let footers: Vec<(String, String)> = footers_rev.into_iter().rev().collect();

    let body_lines = &rest[..footer_start];
    let body_lines = trim_blank_edges(body_lines);
    let body = body_lines.join("\n");

    (body, footers)
}

fn trim_blank_edges<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let mut start = 0;
    let mut end = lines.len();
    while start < end && lines[start].trim().is_empty() {
        start += 1;
    }
    while end > start && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    &lines[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conventional_commit_with_scope_and_body() {
        let commit = parse_commit_message(
            "feat(api): add endpoint\n\nAdds a new endpoint for widgets.\n\nCloses: #42",
        );
        assert!(commit.valid);
        assert_eq!(commit.commit_type.as_deref(), Some("feat"));
        assert_eq!(commit.scope.as_deref(), Some("api"));
        assert!(!commit.breaking);
        assert_eq!(commit.body, "Adds a new endpoint for widgets.");
        assert_eq!(commit.footer("Closes"), Some("#42"));
    }

    #[test]
    fn bang_marks_breaking_change() {
        let commit = parse_commit_message("feat!: drop legacy API");
        assert!(commit.breaking);
    }

    #[test]
    fn breaking_change_footer_marks_breaking() {
        let commit = parse_commit_message("fix: patch overflow\n\nBREAKING CHANGE: changes the ABI");
        assert!(commit.breaking);
        assert_eq!(commit.footer("BREAKING CHANGE"), Some("changes the ABI"));
    }

    #[test]
    fn revert_commit_always_valid() {
        let commit = parse_commit_message("Revert \"feat: add endpoint\"");
        assert!(commit.valid);
        assert!(commit.is_revert);
    }

    #[test]
    fn non_conventional_title_is_invalid_but_does_not_error() {
        let commit = parse_commit_message("fixed a bug");
        assert!(!commit.valid);
        assert!(commit.parse_error.is_some());
    }

    #[test]
    fn scopeless_type_is_valid() {
        let commit = parse_commit_message("chore: bump deps");
        assert!(commit.valid);
        assert_eq!(commit.scope, None);
    }

    #[test]
    fn scope_only_grammar_matches_lowercase_scope() {
        assert!(SCOPE_ONLY_RE.is_match("auth: handle expired tokens"));
        assert!(!SCOPE_ONLY_RE.is_match("Auth: handle expired tokens"));
    }

    #[test]
    fn round_trip_preserves_structure() {
        let original = "fix(api): patch overflow\n\nLine one.\nLine two.\n\nSigned-off-by: A <a@b.c>";
        let parsed = parse_commit_message(original);
        let reparsed = parse_commit_message(&parsed.serialize());
        assert_eq!(parsed.title, reparsed.title);
        assert_eq!(parsed.body, reparsed.body);
        assert_eq!(parsed.footers, reparsed.footers);
    }
}
