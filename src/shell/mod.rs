//! Shell Parser — turns a raw command string into a [`CommandPipeline`] with
//! fidelity sufficient for policy analysis, not for execution.
//!
//! This is intentionally permissive: constructs we don't recognize become a
//! [`ParseError`] that callers treat as a soft-skip (spec.md §4.1), never a
//! block.

mod lexer;
mod parser;

pub use parser::{parse_pipeline, ParseError};

/// How two adjacent [`SimpleCommand`]s in a pipeline are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Seq,
    Pipe,
}

/// A single redirection (`>`, `>>`, `<`, `2>`, ...). Only the operator and
/// target are kept; validators don't need fd-level detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub operator: String,
    pub target: String,
}

/// A here-document attached to the command that consumed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heredoc {
    pub delimiter: String,
    /// `true` for `<<'EOF'` (no expansion); kept for completeness even
    /// though this parser never expands variables either way.
    pub quoted: bool,
    pub body: String,
}

/// One program invocation: `program arg1 arg2 ...` plus any env assignments,
/// redirections, and here-docs attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env_assignments: Vec<(String, String)>,
    pub redirections: Vec<Redirection>,
    pub heredocs: Vec<Heredoc>,
    /// Byte offset range in the original string, for error messages.
    pub source_span: (usize, usize),
}

impl SimpleCommand {
    /// Returns `true` if `flag` appears verbatim among this command's
    /// arguments (not a value slot). Combined short flags like `-sS` are
    /// preserved literally by the tokenizer; sub-parsers that need to see
    /// `-s` and `-S` separately decompose them themselves.
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }
}

/// A node in a [`CommandPipeline`]: either a plain command or a parenthesized
/// subshell group, which itself contains a nested pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandNode {
    Simple(SimpleCommand),
    Subshell(CommandPipeline),
}

/// One entry in a pipeline: a node plus the operator joining it to the next
/// entry (`None` on the last entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineEntry {
    pub node: CommandNode,
    pub joiner: Option<Operator>,
}

/// The ordered, immutable product of shell parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandPipeline {
    pub entries: Vec<PipelineEntry>,
}

impl CommandPipeline {
    /// Iterate every [`SimpleCommand`] in the pipeline, descending into
    /// subshells. Validators that need "is there a `git add` anywhere in
    /// this pipeline" (spec.md §4.6) use this rather than walking `entries`
    /// by hand.
    pub fn simple_commands(&self) -> Vec<&SimpleCommand> {
        let mut out = Vec::new();
        collect_simple(&self.entries, &mut out);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_simple<'a>(entries: &'a [PipelineEntry], out: &mut Vec<&'a SimpleCommand>) {
    for entry in entries {
        match &entry.node {
            CommandNode::Simple(cmd) => out.push(cmd),
            CommandNode::Subshell(inner) => collect_simple(&inner.entries, out),
        }
    }
}
