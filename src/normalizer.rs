//! SQL normalization and digesting.
//!
//! The reporter only needs a deterministic `sql -> digest` function. It is
//! modelled as the [`SqlNormalizer`] trait so callers can plug in the digest
//! algorithm their producer uses; [`DefaultNormalizer`] is a self-contained
//! implementation good enough for tests.

use sha2::{Digest, Sha256};

use crate::digest::{PlanDigest, SqlDigest};

/// Pure `sql text -> (normalized text, digest)` function.
pub trait SqlNormalizer: Send + Sync {
    fn normalize_digest(&self, sql: &str) -> (String, SqlDigest);

    fn digest(&self, sql: &str) -> SqlDigest {
        self.normalize_digest(sql).1
    }
}

/// Literal-stripping normalizer hashing the normalized text with SHA-256.
///
/// ```rust
/// use topsql_mock::{DefaultNormalizer, SqlNormalizer};
///
/// let normalizer = DefaultNormalizer;
/// let (text, a) = normalizer.normalize_digest("SELECT * FROM t WHERE id = 42");
/// let (_, b) = normalizer.normalize_digest("select *   from T where ID = 7;");
/// assert_eq!(text, "select * from t where id = ?");
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNormalizer;

impl SqlNormalizer for DefaultNormalizer {
    fn normalize_digest(&self, sql: &str) -> (String, SqlDigest) {
        let normalized = normalize_sql(sql);
        let digest = SqlDigest::new(sha256(normalized.as_bytes()));
        (normalized, digest)
    }
}

/// Digest `sql` with [`DefaultNormalizer`].
pub fn gen_sql_digest(sql: &str) -> SqlDigest {
    DefaultNormalizer.digest(sql)
}

/// Digest an already-normalized plan rendering.
pub fn plan_digest(normalized_plan: &str) -> PlanDigest {
    PlanDigest::new(sha256(normalized_plan.trim().as_bytes()))
}

fn sha256(bytes: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().to_vec()
}

const TWO_CHAR_OPERATORS: [&str; 8] = [">=", "<=", "<>", "!=", ":=", "||", "&&", "<<"];

/// Canonical form of `sql`: comments dropped, literals replaced by `?`,
/// words lowercased, tokens separated by single spaces.
pub fn normalize_sql(sql: &str) -> String {
    let tokens = collapse_in_lists(tokenize(sql));
    tokens.join(" ")
}

fn tokenize(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
        } else if (c == '-' && next == Some('-')) || c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && next == Some('*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
        } else if c == '\'' || c == '"' {
            i = skip_quoted(&chars, i, c);
            tokens.push("?".to_string());
        } else if c == '`' {
            let start = i + 1;
            let end = skip_quoted(&chars, i, '`');
            let inner: String = chars[start..end.saturating_sub(1).max(start)].iter().collect();
            tokens.push(format!("`{}`", inner.to_lowercase()));
            i = end;
        } else if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            i = skip_number(&chars, i);
            tokens.push("?".to_string());
        } else if is_word_char(c) {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(word.to_lowercase());
        } else {
            let pair: String = [c, next.unwrap_or(' ')].iter().collect();
            if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                tokens.push(pair);
                i += 2;
            } else {
                tokens.push(c.to_string());
                i += 1;
            }
        }
    }

    while tokens.last().is_some_and(|t| t == ";") {
        tokens.pop();
    }
    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Index just past the closing `quote`; doubled quotes and backslashes escape.
fn skip_quoted(chars: &[char], open: usize, quote: char) -> usize {
    let mut i = open + 1;
    while i < chars.len() {
        if chars[i] == '\\' && quote != '`' {
            i += 2;
            continue;
        }
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn skip_number(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        let exponent_sign =
            (c == '+' || c == '-') && i > start && matches!(chars[i - 1], 'e' | 'E');
        if c.is_ascii_alphanumeric() || c == '.' || exponent_sign {
            i += 1;
        } else {
            break;
        }
    }
    i
}

/// `in ( ? , ? , ? )` becomes `in ( ... )` so list length does not change the digest.
fn collapse_in_lists(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == "in"
            && tokens.get(i + 1).is_some_and(|t| t == "(")
            && let Some(close) = literal_list_end(&tokens, i + 2)
        {
            out.extend(["in", "(", "...", ")"].map(String::from));
            i = close + 1;
            continue;
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn literal_list_end(tokens: &[String], start: usize) -> Option<usize> {
    let mut i = start;
    let mut expect_literal = true;
    while let Some(token) = tokens.get(i) {
        match (expect_literal, token.as_str()) {
            (true, "?") => expect_literal = false,
            (false, ",") => expect_literal = true,
            (false, ")") => return Some(i),
            _ => return None,
        }
        i += 1;
    }
    None
}
