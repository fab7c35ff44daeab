//! Assembles [`super::lexer`] tokens into a [`super::CommandPipeline`].

use super::lexer::{tokenize, Token};
use super::{CommandNode, CommandPipeline, Heredoc, Operator, PipelineEntry, Redirection, SimpleCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shell parse error: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

/// Parses a raw shell command string. Anything we don't recognize (unclosed
/// quote, unbalanced parens, unterminated here-doc) is a [`ParseError`]; the
/// caller treats that as a soft-skip, never a block (spec.md §4.1).
pub fn parse_pipeline(input: &str) -> Result<CommandPipeline, ParseError> {
    let tokens = tokenize(input).map_err(|e| ParseError(e.0))?;
    let mut pos = 0usize;
    let pipeline = parse_entries(&tokens, &mut pos, false)?;
    if pos != tokens.len() {
        return Err(ParseError(format!(
            "unexpected token at position {}",
            tokens[pos].1
        )));
    }
    Ok(pipeline)
}

fn parse_entries(
    tokens: &[(Token, usize)],
    pos: &mut usize,
    stop_at_rparen: bool,
) -> Result<CommandPipeline, ParseError> {
    let mut entries = Vec::new();

    loop {
        // Skip stray `;` separators (e.g. leading/blank statements).
        while matches!(tokens.get(*pos), Some((Token::Semi, _))) {
            *pos += 1;
        }
        if *pos >= tokens.len() {
            break;
        }
        if stop_at_rparen && matches!(tokens[*pos].0, Token::RParen) {
            break;
        }

        let node = parse_node(tokens, pos)?;

        let joiner = match tokens.get(*pos) {
            Some((Token::And, _)) => {
                *pos += 1;
                Some(Operator::And)
            }
            Some((Token::Or, _)) => {
                *pos += 1;
                Some(Operator::Or)
            }
            Some((Token::Pipe, _)) => {
                *pos += 1;
                Some(Operator::Pipe)
            }
            Some((Token::Semi, _)) => {
                *pos += 1;
                // Only keep this as an explicit joiner if another entry
                // follows; trailing `;` is just a terminator.
                if *pos < tokens.len() && !(stop_at_rparen && matches!(tokens[*pos].0, Token::RParen)) {
                    Some(Operator::Seq)
                } else {
                    None
                }
            }
            _ => None,
        };

        let has_more = joiner.is_some();
        entries.push(PipelineEntry { node, joiner });
        if !has_more {
            break;
        }
    }

    Ok(CommandPipeline { entries })
}

fn parse_node(tokens: &[(Token, usize)], pos: &mut usize) -> Result<CommandNode, ParseError> {
    if matches!(tokens.get(*pos), Some((Token::LParen, _))) {
        *pos += 1;
        let inner = parse_entries(tokens, pos, true)?;
        match tokens.get(*pos) {
            Some((Token::RParen, _)) => {
                *pos += 1;
                Ok(CommandNode::Subshell(inner))
            }
            _ => Err(ParseError("unbalanced parentheses".to_string())),
        }
    } else {
        parse_simple_command(tokens, pos).map(CommandNode::Simple)
    }
}

fn parse_simple_command(
    tokens: &[(Token, usize)],
    pos: &mut usize,
) -> Result<SimpleCommand, ParseError> {
    let start_span = tokens.get(*pos).map(|(_, span)| *span).unwrap_or(0);
    let mut env_assignments = Vec::new();
    let mut words: Vec<String> = Vec::new();
    let mut redirections = Vec::new();
    let mut heredocs = Vec::new();

    // Leading `KEY=VALUE` tokens (before the program name) are environment
    // assignments, not arguments.
    while let Some((Token::Word(w), _)) = tokens.get(*pos) {
        if words.is_empty() {
            if let Some((key, value)) = split_env_assignment(w) {
                env_assignments.push((key, value));
                *pos += 1;
                continue;
            }
        }
        break;
    }

    loop {
        match tokens.get(*pos) {
            Some((Token::Word(w), _)) => {
                words.push(w.clone());
                *pos += 1;
            }
            Some((Token::Redirect { operator, target }, _)) => {
                redirections.push(Redirection {
                    operator: operator.clone(),
                    target: target.clone(),
                });
                *pos += 1;
            }
            Some((Token::Heredoc { delimiter, quoted, body }, _)) => {
                heredocs.push(Heredoc {
                    delimiter: delimiter.clone(),
                    quoted: *quoted,
                    body: body.clone(),
                });
                *pos += 1;
            }
            _ => break,
        }
    }

    if words.is_empty() {
        return Err(ParseError(format!(
            "expected a command at position {start_span}"
        )));
    }

    let end_span = tokens
        .get(pos.saturating_sub(1))
        .map(|(_, span)| *span)
        .unwrap_or(start_span);

    let program = words.remove(0);
    Ok(SimpleCommand {
        program,
        args: words,
        env_assignments,
        redirections,
        heredocs,
        source_span: (start_span, end_span),
    })
}

/// Recognizes `KEY=VALUE` where `KEY` looks like a shell identifier
/// (`[A-Za-z_][A-Za-z0-9_]*`). Used only to strip leading env-assignment
/// prefixes from a simple command; it does not attempt full shell word
/// splitting.
fn split_env_assignment(word: &str) -> Option<(String, String)> {
    let eq = word.find('=')?;
    let (key, rest) = word.split_at(eq);
    if key.is_empty() {
        return None;
    }
    let mut chars = key.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key.to_string(), rest[1..].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_chain() {
        let pipeline = parse_pipeline("git add . && git commit -m x").unwrap();
        let cmds = pipeline.simple_commands();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].program, "git");
        assert_eq!(cmds[0].args, vec!["add", "."]);
        assert_eq!(pipeline.entries[0].joiner, Some(Operator::And));
    }

    #[test]
    fn parses_pipe() {
        let pipeline = parse_pipeline("git log | head").unwrap();
        assert_eq!(pipeline.entries[0].joiner, Some(Operator::Pipe));
    }

    #[test]
    fn parses_subshell() {
        let pipeline = parse_pipeline("(cd /tmp && ls)").unwrap();
        assert_eq!(pipeline.entries.len(), 1);
        match &pipeline.entries[0].node {
            CommandNode::Subshell(inner) => assert_eq!(inner.entries.len(), 2),
            _ => panic!("expected subshell"),
        }
    }

    #[test]
    fn env_assignment_prefix_is_not_an_argument() {
        let pipeline = parse_pipeline("GIT_AUTHOR_NAME=bot git commit -m x").unwrap();
        let cmd = &pipeline.simple_commands()[0];
        assert_eq!(cmd.program, "git");
        assert_eq!(cmd.env_assignments, vec![("GIT_AUTHOR_NAME".to_string(), "bot".to_string())]);
    }

    #[test]
    fn commit_message_heredoc_attaches_to_command() {
        let pipeline =
            parse_pipeline("git commit -F- <<EOF\nfeat: add thing\nEOF").unwrap();
        let cmd = &pipeline.simple_commands()[0];
        assert_eq!(cmd.heredocs.len(), 1);
        assert_eq!(cmd.heredocs[0].body, "feat: add thing");
    }

    #[test]
    fn unbalanced_parens_is_a_parse_error() {
        assert!(parse_pipeline("(git add .").is_err());
    }

    #[test]
    fn dash_dash_flag_value_with_equals_is_not_env_assignment() {
        let pipeline = parse_pipeline("git commit --message=hi").unwrap();
        let cmd = &pipeline.simple_commands()[0];
        assert!(cmd.env_assignments.is_empty());
        assert_eq!(cmd.args, vec!["--message=hi"]);
    }
}
