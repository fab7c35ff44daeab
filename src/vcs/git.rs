//! `git` sub-parser: global option extraction, flag lookup, and commit
//! message resolution (spec.md §4.2, §9's "heredoc-extraction is the sole
//! authority" note).

use crate::error::DispatchError;
use crate::shell::{Heredoc, SimpleCommand};

/// Flags that consume the following argument as their value, when not given
/// in `--flag=value` form. Limited to the ones our validators actually
/// inspect; anything else is left as a bare positional/flag token.
const VALUE_FLAGS: &[&str] = &[
    "-m", "--message", "-F", "--file", "-C", "-c", "--git-dir", "--work-tree", "-b", "-B", "-u",
    "--strategy", "-s", "-X", "--strategy-option",
];

/// A parsed `git <subcommand> ...` invocation. Global options (`-C`,
/// `--git-dir`, ...) are separated from the subcommand's own flags so
/// validators don't have to re-derive that split themselves.
#[derive(Debug, Clone)]
pub struct GitCommand {
    pub global_args: Vec<String>,
    pub subcommand: Option<String>,
    pub args: Vec<String>,
    pub heredocs: Vec<Heredoc>,
}

impl GitCommand {
    /// `true` if `flag` appears verbatim among this command's own args
    /// (subcommand args, not global args), or as part of a combined short
    /// flag group like `-sS` (spec.md §4.1: the tokenizer keeps these
    /// literal; decomposing them is left to callers that ask for a specific
    /// single-char flag).
    pub fn has_flag(&self, flag: &str) -> bool {
        if self.args.iter().any(|a| a == flag) {
            return true;
        }
        let Some(target) = short_flag_char(flag) else {
            return false;
        };
        self.args
            .iter()
            .any(|a| decompose_short_flags(a).is_some_and(|chars| chars.contains(&target)))
    }

    pub fn has_global_flag(&self, flag: &str) -> bool {
        self.global_args.iter().any(|a| a == flag)
    }

    /// Resolves `flag`'s value from either `--flag=value` or a following
    /// positional token, searching subcommand args only.
    pub fn flag_value(&self, flag: &str) -> Option<String> {
        flag_value_in(&self.args, flag)
    }

    /// The `-C <path>` / `-C<path>` global option, if present, honored the
    /// same as a preceding `cd <path> &&` (spec.md §8).
    pub fn working_directory_override(&self) -> Option<String> {
        for (i, arg) in self.global_args.iter().enumerate() {
            if arg == "-C" {
                return self.global_args.get(i + 1).cloned();
            }
            if let Some(rest) = arg.strip_prefix("-C") {
                if !rest.is_empty() {
                    return Some(rest.to_string());
                }
            }
        }
        None
    }

    /// Resolves the commit/merge message per the documented precedence:
    /// `-m`/`--message` wins, then `-F`/`--file` (read from disk; `-F -`
    /// can't be resolved from a static argv and is treated as unresolved),
    /// then the here-doc attached to this command, if any. The result has
    /// trailing whitespace/newlines trimmed; nothing else is rewritten.
    pub fn extract_message(&self) -> Result<Option<String>, DispatchError> {
        if let Some(msg) = self.flag_value("-m").or_else(|| self.flag_value("--message")) {
            return Ok(Some(trim_trailing(&msg)));
        }
        if let Some(path) = self.flag_value("-F").or_else(|| self.flag_value("--file")) {
            if path == "-" {
                return Ok(None);
            }
            let content = std::fs::read_to_string(&path)?;
            return Ok(Some(trim_trailing(&content)));
        }
        if let Some(heredoc) = self.heredocs.first() {
            return Ok(Some(trim_trailing(&heredoc.body)));
        }
        Ok(None)
    }
}

fn trim_trailing(s: &str) -> String {
    s.trim_end_matches(['\n', '\r', ' ', '\t']).to_string()
}

/// `flag` is a lone short flag like `-s`; returns its letter.
fn short_flag_char(flag: &str) -> Option<char> {
    let mut chars = flag.strip_prefix('-')?.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    c.is_ascii_alphabetic().then_some(c)
}

/// A combined short-flag token like `-sS`: one dash followed by two or more
/// letters. Returns the constituent flag letters.
fn decompose_short_flags(token: &str) -> Option<Vec<char>> {
    let rest = token.strip_prefix('-')?;
    if rest.starts_with('-') || rest.len() < 2 {
        return None;
    }
    rest.chars().all(|c| c.is_ascii_alphabetic()).then(|| rest.chars().collect())
}

fn flag_value_in(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (i, arg) in args.iter().enumerate() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            return Some(val.to_string());
        }
        if arg == flag && VALUE_FLAGS.contains(&flag) {
            return args.get(i + 1).cloned();
        }
    }
    None
}

/// `None` if `cmd` doesn't invoke `git` at all.
pub fn parse_git(cmd: &SimpleCommand) -> Option<GitCommand> {
    if cmd.program != "git" {
        return None;
    }

    let mut global_args = Vec::new();
    let mut i = 0usize;
    let mut subcommand = None;

    while i < cmd.args.len() {
        let tok = &cmd.args[i];
        if tok == "--" {
            break;
        }
        if !tok.starts_with('-') {
            subcommand = Some(tok.clone());
            i += 1;
            break;
        }
        if tok == "-C" || tok == "-c" {
            global_args.push(tok.clone());
            if let Some(val) = cmd.args.get(i + 1) {
                global_args.push(val.clone());
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }
        if tok.starts_with("-C") || tok.starts_with("-c") {
            global_args.push(tok.clone());
            i += 1;
            continue;
        }
        if matches!(
            tok.as_str(),
            "--no-pager" | "-p" | "--paginate" | "--bare" | "--no-replace-objects"
        ) || tok.starts_with("--git-dir")
            || tok.starts_with("--work-tree")
            || tok.starts_with("--namespace")
        {
            global_args.push(tok.clone());
            i += 1;
            continue;
        }
        // Unrecognized leading option: stop treating tokens as global and
        // let the rest fall through as subcommand args once we hit the
        // subcommand word (permissive, matches spec.md's "never crash on
        // unrecognized constructs" posture).
        break;
    }

    let args = cmd.args[i..].to_vec();

    Some(GitCommand {
        global_args,
        subcommand,
        args,
        heredocs: cmd.heredocs.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parse_pipeline;

    fn git_command(input: &str) -> GitCommand {
        let pipeline = parse_pipeline(input).unwrap();
        let simple = pipeline.simple_commands().into_iter().next().unwrap();
        parse_git(simple).unwrap()
    }

    #[test]
    fn non_git_command_is_none() {
        let pipeline = parse_pipeline("echo hi").unwrap();
        let simple = pipeline.simple_commands().into_iter().next().unwrap();
        assert!(parse_git(simple).is_none());
    }

    #[test]
    fn extracts_subcommand_and_global_c_flag() {
        let cmd = git_command("git -C ../other commit -m hi");
        assert_eq!(cmd.subcommand.as_deref(), Some("commit"));
        assert_eq!(cmd.working_directory_override().as_deref(), Some("../other"));
    }

    #[test]
    fn message_precedence_prefers_dash_m() {
        let cmd = git_command(r#"git commit -m "subject line" -F /tmp/ignored.txt"#);
        assert_eq!(cmd.extract_message().unwrap().as_deref(), Some("subject line"));
    }

    #[test]
    fn message_falls_back_to_heredoc() {
        let cmd = git_command("git commit -F- <<EOF\nfeat: add thing\nEOF");
        assert_eq!(
            cmd.extract_message().unwrap().as_deref(),
            Some("feat: add thing")
        );
    }

    #[test]
    fn no_message_source_returns_none() {
        let cmd = git_command("git commit --amend --no-edit");
        assert_eq!(cmd.extract_message().unwrap(), None);
    }

    #[test]
    fn sticky_short_c_flag_value() {
        let cmd = git_command("git -C/tmp/repo status");
        assert_eq!(cmd.working_directory_override().as_deref(), Some("/tmp/repo"));
    }

    #[test]
    fn combined_short_flags_are_decomposed() {
        let cmd = git_command(r#"git commit -sS -m "feat(api): add endpoint""#);
        assert!(cmd.has_flag("-s"));
        assert!(cmd.has_flag("-S"));
        assert!(!cmd.has_flag("-x"));
    }
}
