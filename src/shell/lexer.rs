//! Character-level tokenizer. Produces a flat token stream; [`super::parser`]
//! assembles tokens into the [`super::CommandPipeline`] tree.
//!
//! Handles: single/double quoting, `$(...)` command substitution (captured
//! opaque, with the one documented exception for a heredoc-in-substitution
//! used as a message value — see [`Token::Word`] construction below),
//! here-documents (`<<EOF`, `<<'EOF'`, `<<-EOF`), and the chaining operators.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    Word(String),
    And,
    Or,
    Semi,
    Pipe,
    LParen,
    RParen,
    Redirect { operator: String, target: String },
    Heredoc { delimiter: String, quoted: bool, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError(pub String);

pub(super) fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, LexError> {
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0usize;
    let mut out = Vec::new();

    while i < chars.len() {
        let start = i;
        let c = chars[i];

        if c.is_whitespace() && c != '\n' {
            i += 1;
            continue;
        }
        if c == '\n' {
            // A bare newline not consumed as part of a heredoc body acts
            // like `;` for our purposes — most inputs are single-line.
            out.push((Token::Semi, start));
            i += 1;
            continue;
        }
        if c == '#' {
            // Comment to end of line.
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '(' {
            out.push((Token::LParen, start));
            i += 1;
            continue;
        }
        if c == ')' {
            out.push((Token::RParen, start));
            i += 1;
            continue;
        }
        if c == '&' && chars.get(i + 1) == Some(&'&') {
            out.push((Token::And, start));
            i += 2;
            continue;
        }
        if c == '|' && chars.get(i + 1) == Some(&'|') {
            out.push((Token::Or, start));
            i += 2;
            continue;
        }
        if c == '|' {
            out.push((Token::Pipe, start));
            i += 1;
            continue;
        }
        if c == ';' {
            out.push((Token::Semi, start));
            i += 1;
            continue;
        }
        if c == '<' && chars.get(i + 1) == Some(&'<') {
            let (delimiter, quoted, consumed) = read_heredoc_delimiter(&chars, i + 2)?;
            i = consumed;
            // Collect the rest of the current line as further tokens before
            // the body; the body itself begins at the next newline.
            // We do this by recursively scanning forward to find the line
            // end, then slurping the heredoc body from there.
            let line_end = find_line_end(&chars, i);
            let body_start = line_end + 1; // skip the newline
            let (body, after_body) = read_heredoc_body(&chars, body_start, &delimiter)?;
            out.push((
                Token::Heredoc {
                    delimiter,
                    quoted,
                    body,
                },
                start,
            ));
            // Continue lexing the remainder of the original line (between
            // `i` and `line_end`), then skip past the consumed body.
            let mut rest = tokenize(&chars[i..line_end].iter().collect::<String>())
                .map_err(|e| LexError(e.0))?;
            out.append(&mut rest);
            i = after_body;
            continue;
        }
        if c == '>' || c == '<' {
            let mut op = String::from(c);
            let mut j = i + 1;
            if chars.get(j) == Some(&'>') {
                op.push('>');
                j += 1;
            }
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let (target, after) = read_word(&chars, j)?;
            out.push((
                Token::Redirect {
                    operator: op,
                    target,
                },
                start,
            ));
            i = after;
            continue;
        }
        if c == '$' && chars.get(i + 1) == Some(&'(') {
            let (text, after) = read_command_substitution(&chars, i)?;
            out.push((Token::Word(text), start));
            i = after;
            continue;
        }
        if c == '\'' || c == '"' {
            let (word, after) = read_quoted_word(&chars, i)?;
            out.push((Token::Word(word), start));
            i = after;
            continue;
        }

        let (word, after) = read_word(&chars, i)?;
        out.push((Token::Word(word), start));
        i = after;
    }

    Ok(out)
}

/// Reads a bareword/quoted/mixed token starting at `i`, stopping at
/// whitespace or a metacharacter, honoring embedded quotes so a token like
/// `foo"bar baz"qux` stays one logical word.
fn read_word(chars: &[char], mut i: usize) -> Result<(String, usize), LexError> {
    let mut word = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() || matches!(c, '&' | '|' | ';' | '(' | ')' | '<' | '>') {
            break;
        }
        if c == '\'' || c == '"' {
            let (segment, after) = read_quoted_segment(chars, i)?;
            word.push_str(&segment);
            i = after;
            continue;
        }
        if c == '$' && chars.get(i + 1) == Some(&'(') {
            let (segment, after) = read_command_substitution(chars, i)?;
            word.push_str(&segment);
            i = after;
            continue;
        }
        if c == '\\' && i + 1 < chars.len() {
            word.push(chars[i + 1]);
            i += 2;
            continue;
        }
        word.push(c);
        i += 1;
    }
    if word.is_empty() {
        return Err(LexError(format!("expected a word at position {i}")));
    }
    Ok((word, i))
}

/// Like `read_word` but the whole token is a single quoted string (used when
/// the token *starts* with a quote character).
fn read_quoted_word(chars: &[char], i: usize) -> Result<(String, usize), LexError> {
    read_word(chars, i)
}

/// Reads one quoted segment (single or double quoted) and returns its
/// unescaped contents plus the index just past the closing quote.
fn read_quoted_segment(chars: &[char], i: usize) -> Result<(String, usize), LexError> {
    let quote = chars[i];
    let mut j = i + 1;
    let mut out = String::new();
    loop {
        if j >= chars.len() {
            return Err(LexError("unclosed quote".to_string()));
        }
        let c = chars[j];
        if c == quote {
            j += 1;
            break;
        }
        if quote == '"' && c == '\\' && j + 1 < chars.len() {
            // Standard double-quote escape semantics: only a handful of
            // characters are special; everything else keeps the backslash.
            let next = chars[j + 1];
            if matches!(next, '"' | '\\' | '$' | '`' | '\n') {
                out.push(next);
                j += 2;
                continue;
            }
            out.push(c);
            j += 1;
            continue;
        }
        // Single quotes: no expansion, no escapes, verbatim until the
        // matching quote.
        out.push(c);
        j += 1;
    }
    Ok((out, j))
}

/// Reads `$( ... )`, tracking nested parens and quotes so the outer `)` is
/// found correctly. Returns the raw opaque text including the `$(` `)`
/// delimiters, UNLESS the contents are exactly a heredoc fed to `cat`
/// (`cat <<'DELIM' ... DELIM`), in which case the heredoc body itself is
/// returned as the effective value (spec.md §4.1's one documented exception
/// to "command substitution is opaque").
fn read_command_substitution(chars: &[char], i: usize) -> Result<(String, usize), LexError> {
    debug_assert_eq!(chars[i], '$');
    debug_assert_eq!(chars[i + 1], '(');
    let mut depth = 1usize;
    let mut j = i + 2;
    let inner_start = j;
    while j < chars.len() && depth > 0 {
        match chars[j] {
            '(' => depth += 1,
            ')' => depth -= 1,
            '\'' | '"' => {
                let (_, after) = read_quoted_segment(chars, j)?;
                j = after;
                continue;
            }
            _ => {}
        }
        j += 1;
    }
    if depth != 0 {
        return Err(LexError("unclosed command substitution".to_string()));
    }
    let inner_end = j - 1; // index of the closing ')'
    let inner: String = chars[inner_start..inner_end].iter().collect();

    if let Some(body) = extract_cat_heredoc_body(&inner) {
        return Ok((body, j));
    }

    let raw: String = chars[i..j].iter().collect();
    Ok((raw, j))
}

/// Recognizes `cat <<'DELIM'\n...\nDELIM` (optionally `<<DELIM` unquoted,
/// optionally trailing whitespace/newlines) and returns the heredoc body.
fn extract_cat_heredoc_body(inner: &str) -> Option<String> {
    let trimmed = inner.trim_start();
    let rest = trimmed.strip_prefix("cat ")?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix("<<")?;
    let chars: Vec<char> = rest.chars().collect();
    let (delimiter, quoted, after) = read_heredoc_delimiter(&chars, 0).ok()?;
    let body_start = if chars.get(after) == Some(&'\n') {
        after + 1
    } else {
        after
    };
    let (body, _after_body) = read_heredoc_body(&chars, body_start, &delimiter).ok()?;
    let _ = quoted;
    Some(body)
}

/// Reads the delimiter word following `<<`/`<<-`, which may be bare,
/// single-quoted, or double-quoted. Returns (delimiter, quoted, next index).
fn read_heredoc_delimiter(
    chars: &[char],
    mut i: usize,
) -> Result<(String, bool, usize), LexError> {
    if chars.get(i) == Some(&'-') {
        i += 1; // `<<-DELIM`: strip-tabs variant, we don't distinguish further
    }
    while chars.get(i).is_some_and(|c| c.is_whitespace() && *c != '\n') {
        i += 1;
    }
    match chars.get(i) {
        Some('\'') | Some('"') => {
            let (delim, after) = read_quoted_segment(chars, i)?;
            Ok((delim, true, after))
        }
        _ => {
            let mut delim = String::new();
            while i < chars.len() && !chars[i].is_whitespace() {
                delim.push(chars[i]);
                i += 1;
            }
            if delim.is_empty() {
                return Err(LexError("expected heredoc delimiter".to_string()));
            }
            Ok((delim, false, i))
        }
    }
}

/// Finds the index of the next `\n` at or after `i` (or `chars.len()` if none).
fn find_line_end(chars: &[char], i: usize) -> usize {
    let mut j = i;
    while j < chars.len() && chars[j] != '\n' {
        j += 1;
    }
    j
}

/// Reads heredoc body lines starting at `start` until a line that is
/// exactly `delimiter` (trimmed). Returns (body-without-terminator, index
/// just past the terminator line's newline, or end of input).
fn read_heredoc_body(
    chars: &[char],
    start: usize,
    delimiter: &str,
) -> Result<(String, usize), LexError> {
    let mut i = start;
    let mut body = String::new();
    loop {
        let line_end = find_line_end(chars, i);
        let line: String = chars[i..line_end].iter().collect();
        if line.trim_end() == delimiter {
            let after = if line_end < chars.len() {
                line_end + 1
            } else {
                line_end
            };
            return Ok((body, after));
        }
        if i >= chars.len() {
            return Err(LexError(format!(
                "unterminated here-doc (missing `{delimiter}`)"
            )));
        }
        body.push_str(&line);
        if line_end < chars.len() {
            body.push('\n');
            i = line_end + 1;
        } else {
            return Err(LexError(format!(
                "unterminated here-doc (missing `{delimiter}`)"
            )));
        }
    }
}
