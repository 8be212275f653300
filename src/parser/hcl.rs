//! Tolerant tokenizer for the HCL block grammar.
//!
//! Recognizes `kind "label" ... { name = expression ... }` with nested blocks,
//! quoted strings (including `${...}` interpolation and embedded newlines),
//! heredocs and all three comment styles. Expressions are kept as raw source
//! text; nothing is evaluated.
//!
//! Anything the grammar does not cover is recorded as [`Unresolved`] with its
//! line so the fallback path can have a go at it. Only structure that can never
//! be recovered is an error: a block, string, heredoc or bracket that never
//! closes.

/// A parsed file: top-level blocks plus constructs the tokenizer could not resolve.
#[derive(Debug, Default)]
pub struct File {
    pub blocks: Vec<Block>,
    pub unresolved: Vec<Unresolved>,
}

#[derive(Debug)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
    pub line: usize,
}

#[derive(Debug, Default)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
    pub unresolved: Vec<Unresolved>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Raw expression text, trimmed, without a trailing comment.
    pub expr: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl Body {
    /// First attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Nested blocks of the given kind, in declaration order.
    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }
}

/// Tokenize a whole file.
pub fn parse(src: &str) -> Result<File, SyntaxError> {
    let mut scanner = Scanner::new(src);
    let body = scanner.body(None)?;
    Ok(File {
        blocks: body.blocks,
        unresolved: body
            .unresolved
            .into_iter()
            .chain(body.attributes.into_iter().map(|a| Unresolved {
                text: format!("{} = {}", a.name, a.expr),
                line: a.line,
            }))
            .collect(),
    })
}

// -- Scanner ------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Frame {
    Bracket(u8),
    Str,
    Interp,
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line_starts: Vec<usize>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line_starts,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Advance past one whole character.
    fn bump(&mut self) {
        let len = self.src[self.pos..].chars().next().map_or(0, char::len_utf8);
        self.pos += len;
    }

    fn line_of(&self, pos: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= pos)
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line_of(pos),
            message: message.into(),
        }
    }

    /// Skip whitespace and comments. Newlines only when `newlines` is set.
    fn skip_trivia(&mut self, newlines: bool) -> Result<(), SyntaxError> {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' if newlines => self.pos += 1,
                b'#' => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'*') => self.skip_block_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        self.pos = self.src[self.pos..]
            .find('\n')
            .map_or(self.src.len(), |i| self.pos + i);
    }

    fn skip_block_comment(&mut self) -> Result<(), SyntaxError> {
        match self.src[self.pos + 2..].find("*/") {
            Some(i) => {
                self.pos += 2 + i + 2;
                Ok(())
            }
            None => Err(self.error(self.pos, "unterminated `/*` comment")),
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    /// Parse block contents. `open` is the line of the enclosing `{`, or
    /// `None` at the top level.
    fn body(&mut self, open: Option<usize>) -> Result<Body, SyntaxError> {
        let mut body = Body::default();
        loop {
            self.skip_trivia(true)?;
            let start = self.pos;
            let line = self.line_of(start);
            match self.peek() {
                None => {
                    return match open {
                        Some(open_line) => Err(SyntaxError {
                            line: open_line,
                            message: "`{` is never closed".to_string(),
                        }),
                        None => Ok(body),
                    };
                }
                Some(b'}') => {
                    self.pos += 1;
                    if open.is_some() {
                        return Ok(body);
                    }
                    body.unresolved.push(Unresolved {
                        text: "}".to_string(),
                        line,
                    });
                }
                Some(c) if is_ident_start(c) => {
                    let name = self.ident();
                    self.skip_trivia(false)?;
                    if self.peek() == Some(b'=') && self.peek_at(1) != Some(b'=') {
                        self.pos += 1;
                        let expr = self.expression()?;
                        body.attributes.push(Attribute { name, expr, line });
                        continue;
                    }
                    let labels = self.labels()?;
                    if self.peek() == Some(b'{') {
                        self.pos += 1;
                        let inner = self.body(Some(line))?;
                        body.blocks.push(Block {
                            kind: name,
                            labels,
                            body: inner,
                            line,
                        });
                    } else {
                        self.pos = start;
                        let text = self.skip_construct()?;
                        body.unresolved.push(Unresolved { text, line });
                    }
                }
                Some(_) => {
                    let text = self.skip_construct()?;
                    body.unresolved.push(Unresolved { text, line });
                }
            }
        }
    }

    fn labels(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut labels = Vec::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    let start = self.pos;
                    self.pos += 1;
                    while let Some(c) = self.peek() {
                        match c {
                            b'\\' => {
                                self.bump();
                                self.bump();
                            }
                            b'"' => break,
                            b'\n' => return Err(self.error(start, "unterminated block label")),
                            _ => self.bump(),
                        }
                    }
                    if self.peek().is_none() {
                        return Err(self.error(start, "unterminated block label"));
                    }
                    self.pos += 1;
                    let raw = &self.src[start..self.pos];
                    labels.push(string_literal(raw).unwrap_or_else(|| raw.to_string()));
                }
                Some(c) if is_ident_start(c) => labels.push(self.ident()),
                _ => break,
            }
            self.skip_trivia(false)?;
        }
        Ok(labels)
    }

    fn expression(&mut self) -> Result<String, SyntaxError> {
        self.scan()
    }

    /// Consume a construct the grammar does not recognize, keeping brackets,
    /// strings and heredocs balanced so the next construct starts cleanly.
    fn skip_construct(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        let text = self.scan()?;
        if self.pos == start {
            self.bump();
            return Ok(self.src[start..self.pos].to_string());
        }
        Ok(text)
    }

    /// Scan an expression up to the end of its line (or an enclosing `}`),
    /// continuing across newlines while inside brackets, strings or heredocs.
    fn scan(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        let mut end = start;
        let mut stack: Vec<(Frame, usize)> = Vec::new();

        while let Some(c) = self.peek() {
            if matches!(stack.last(), Some((Frame::Str, _))) {
                match c {
                    b'\\' => {
                        self.bump();
                        self.bump();
                    }
                    b'"' => {
                        stack.pop();
                        self.pos += 1;
                    }
                    // `$${` and `%%{` are escaped, not template openers.
                    b'$' | b'%' if self.peek_at(1) == Some(c) => self.pos += 2,
                    b'$' | b'%' if self.peek_at(1) == Some(b'{') => {
                        stack.push((Frame::Interp, self.pos));
                        self.pos += 2;
                    }
                    _ => self.bump(),
                }
                end = self.pos;
                continue;
            }

            match c {
                b'\n' if stack.is_empty() => break,
                b'#' => {
                    self.skip_line_comment();
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_line_comment();
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.skip_block_comment()?;
                    continue;
                }
                b'"' => {
                    stack.push((Frame::Str, self.pos));
                    self.pos += 1;
                }
                b'<' if self.heredoc_header().is_some() => self.heredoc()?,
                b'{' | b'[' | b'(' => {
                    stack.push((Frame::Bracket(c), self.pos));
                    self.pos += 1;
                }
                b'}' | b']' | b')' => match stack.last().map(|(frame, _)| *frame) {
                    None if c == b'}' => break,
                    None => self.pos += 1,
                    Some(Frame::Interp) if c == b'}' => {
                        stack.pop();
                        self.pos += 1;
                    }
                    Some(Frame::Bracket(open)) if closes(open, c) => {
                        stack.pop();
                        self.pos += 1;
                    }
                    Some(_) => {
                        return Err(self.error(self.pos, format!("unmatched `{}`", c as char)));
                    }
                },
                _ => self.bump(),
            }
            end = self.pos;
        }

        if let Some((frame, at)) = stack.last() {
            let message = match frame {
                Frame::Str => "string is never closed".to_string(),
                Frame::Interp => "`${` interpolation is never closed".to_string(),
                Frame::Bracket(open) => format!("`{}` is never closed", *open as char),
            };
            return Err(self.error(*at, message));
        }

        Ok(self.src[start..end].trim().to_string())
    }

    /// Length of a `<<EOF` / `<<-EOF` header including its newline, and the
    /// terminator word.
    fn heredoc_header(&self) -> Option<(usize, &'a str)> {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let after = rest.strip_prefix("<<")?;
        let after = after.strip_prefix('-').unwrap_or(after);
        let word_len = after
            .bytes()
            .take_while(|&b| is_ident_char(b) && b != b'-')
            .count();
        if word_len == 0 || !is_ident_start(after.as_bytes()[0]) {
            return None;
        }
        let word = &after[..word_len];
        let tail = after[word_len..].trim_start_matches([' ', '\t', '\r']);
        if !tail.starts_with('\n') {
            return None;
        }
        let header_len = rest.len() - tail.len() + 1;
        Some((header_len, word))
    }

    fn heredoc(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos;
        let Some((header_len, word)) = self.heredoc_header() else {
            return Ok(());
        };
        self.pos += header_len;
        loop {
            if self.pos >= self.src.len() {
                return Err(self.error(start, format!("heredoc `{word}` is never terminated")));
            }
            let line_end = self.src[self.pos..]
                .find('\n')
                .map_or(self.src.len(), |i| self.pos + i);
            let line = &self.src[self.pos..line_end];
            if line.trim() == word {
                self.pos = line_end;
                return Ok(());
            }
            self.pos = (line_end + 1).min(self.src.len());
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

fn closes(open: u8, close: u8) -> bool {
    matches!((open, close), (b'{', b'}') | (b'[', b']') | (b'(', b')'))
}

// -- Literal decoding ---------------------------------------------------------

/// Decode `expr` if it is exactly one quoted string literal without interpolation.
pub fn string_literal(expr: &str) -> Option<String> {
    let inner = expr.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            // An unescaped quote means this is more than one literal.
            '"' => return None,
            '$' | '%' if chars.peek() == Some(&'{') => return None,
            '$' | '%' if chars.peek() == Some(&c) => {
                // `$${` and `%%{` are escaped template sequences.
                chars.next();
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Some(out)
}

/// Decode `expr` if it is a heredoc. `<<-` bodies have their common
/// indentation removed.
pub fn heredoc_literal(expr: &str) -> Option<String> {
    let rest = expr.strip_prefix("<<")?;
    let (indented, rest) = match rest.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let (header, body) = rest.split_once('\n')?;
    let word = header.trim();
    let mut lines: Vec<&str> = body.lines().collect();
    if lines.last().map(|l| l.trim()) != Some(word) {
        return None;
    }
    lines.pop();

    if !indented {
        return Some(lines.join("\n"));
    }
    let min_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    Some(
        lines
            .iter()
            .map(|l| l.get(min_indent..).unwrap_or_else(|| l.trim_start()))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Text of a literal expression, or the raw expression when it is not a literal.
pub fn literal_text(expr: &str) -> String {
    string_literal(expr)
        .or_else(|| heredoc_literal(expr))
        .unwrap_or_else(|| expr.to_string())
}
