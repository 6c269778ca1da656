//! Valve key-value (VDF) parser
//!
//! Steam stores configuration in a simple text format of quoted key/value
//! pairs and nested `{}` blocks:
//!
//! ```text
//! "libraryfolders"
//! {
//!     "0"
//!     {
//!         "path"      "C:\\Program Files (x86)\\Steam"
//!         "mounted"   "1"
//!     }
//! }
//! ```
//!
//! The same grammar covers `libraryfolders.vdf` and per-app `*.acf`
//! manifests. This is a real recursive parser with defined error cases
//! rather than line splitting: quoted strings support `\\`, `\"`, `\n`
//! and `\t` escapes, bare (unquoted) tokens are accepted as keys and
//! values, and `//` line comments are skipped.

use thiserror::Error;

/// Errors produced while parsing a VDF document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VdfError {
    /// Input ended inside a block or quoted string
    #[error("unexpected end of input at line {line}")]
    UnexpectedEof {
        /// Line where input ran out
        line: usize,
    },
    /// A token appeared where a key or value was not allowed
    #[error("unexpected token {token:?} at line {line}")]
    UnexpectedToken {
        /// The offending token text
        token: String,
        /// Line of the offending token
        line: usize,
    },
    /// A `}` with no matching `{`
    #[error("unbalanced closing brace at line {line}")]
    UnbalancedBrace {
        /// Line of the stray brace
        line: usize,
    },
}

/// A parsed VDF value: either a leaf string or a nested block.
///
/// Blocks keep their pairs in document order; VDF allows duplicate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VdfValue {
    /// Leaf string value
    String(String),
    /// Nested `{}` block of key/value pairs in document order
    Object(Vec<(String, VdfValue)>),
}

impl VdfValue {
    /// Look up the first pair with the given key (ASCII case-insensitive,
    /// matching Steam's own handling). Returns `None` on leaf values.
    pub fn get(&self, key: &str) -> Option<&VdfValue> {
        match self {
            VdfValue::String(_) => None,
            VdfValue::Object(pairs) => pairs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v),
        }
    }

    /// Leaf string contents, or `None` for blocks.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VdfValue::String(s) => Some(s),
            VdfValue::Object(_) => None,
        }
    }

    /// Pairs of a block, or `None` for leaves.
    pub fn as_object(&self) -> Option<&[(String, VdfValue)]> {
        match self {
            VdfValue::String(_) => None,
            VdfValue::Object(pairs) => Some(pairs),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    /// Next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<(Token, usize)>, VdfError> {
        loop {
            // Skip whitespace
            while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
                self.bump();
            }
            // Skip // comments to end of line
            if self.chars.peek() == Some(&'/') {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if lookahead.peek() == Some(&'/') {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                    continue;
                }
            }
            break;
        }

        let line = self.line;
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        match c {
            '{' => {
                self.bump();
                Ok(Some((Token::Open, line)))
            }
            '}' => {
                self.bump();
                Ok(Some((Token::Close, line)))
            }
            '"' => {
                self.bump();
                let mut text = String::new();
                loop {
                    match self.bump() {
                        None => return Err(VdfError::UnexpectedEof { line: self.line }),
                        Some('"') => break,
                        Some('\\') => match self.bump() {
                            None => return Err(VdfError::UnexpectedEof { line: self.line }),
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(other) => text.push(other),
                        },
                        Some(other) => text.push(other),
                    }
                }
                Ok(Some((Token::Text(text), line)))
            }
            _ => {
                // Bare token: runs until whitespace or a structural character
                let mut text = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }
                Ok(Some((Token::Text(text), line)))
            }
        }
    }
}

/// Parse a VDF document into its root block.
///
/// The returned object holds the top-level pairs; for Steam files this is
/// typically a single pair like `("libraryfolders", Object(..))`.
pub fn parse(input: &str) -> Result<VdfValue, VdfError> {
    let mut lexer = Lexer::new(input);
    let pairs = parse_pairs(&mut lexer, false)?;
    Ok(VdfValue::Object(pairs))
}

/// Parse pairs until end of input (top level) or a closing brace (nested).
fn parse_pairs(lexer: &mut Lexer<'_>, nested: bool) -> Result<Vec<(String, VdfValue)>, VdfError> {
    let mut pairs = Vec::new();

    loop {
        let key = match lexer.next_token()? {
            None if nested => return Err(VdfError::UnexpectedEof { line: lexer.line }),
            None => return Ok(pairs),
            Some((Token::Close, line)) => {
                if nested {
                    return Ok(pairs);
                }
                return Err(VdfError::UnbalancedBrace { line });
            }
            Some((Token::Open, line)) => {
                return Err(VdfError::UnexpectedToken {
                    token: "{".to_string(),
                    line,
                });
            }
            Some((Token::Text(text), _)) => text,
        };

        let value = match lexer.next_token()? {
            None => return Err(VdfError::UnexpectedEof { line: lexer.line }),
            Some((Token::Close, line)) => return Err(VdfError::UnbalancedBrace { line }),
            Some((Token::Open, _)) => VdfValue::Object(parse_pairs(lexer, true)?),
            Some((Token::Text(text), _)) => VdfValue::String(text),
        };

        pairs.push((key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_pairs() {
        let doc = parse("\"appid\" \"620\"\n\"name\" \"Portal 2\"").unwrap();
        assert_eq!(doc.get("appid").and_then(VdfValue::as_str), Some("620"));
        assert_eq!(doc.get("name").and_then(VdfValue::as_str), Some("Portal 2"));
    }

    #[test]
    fn test_parse_nested_block() {
        let input = r#"
"libraryfolders"
{
    "0"
    {
        "path"      "C:\\SteamLibrary"
        "mounted"   "1"
    }
}
"#;
        let doc = parse(input).unwrap();
        let root = doc.get("libraryfolders").unwrap();
        let slot = root.get("0").unwrap();
        assert_eq!(
            slot.get("path").and_then(VdfValue::as_str),
            Some("C:\\SteamLibrary")
        );
        assert_eq!(slot.get("mounted").and_then(VdfValue::as_str), Some("1"));
    }

    #[test]
    fn test_key_lookup_is_case_insensitive() {
        let doc = parse("\"AppState\" { \"appid\" \"620\" }").unwrap();
        assert!(doc.get("appstate").is_some());
        assert!(doc.get("APPSTATE").is_some());
    }

    #[test]
    fn test_escapes_in_strings() {
        let doc = parse(r#""path" "C:\\Games\\My \"Quoted\" Dir""#).unwrap();
        assert_eq!(
            doc.get("path").and_then(VdfValue::as_str),
            Some(r#"C:\Games\My "Quoted" Dir"#)
        );
    }

    #[test]
    fn test_bare_tokens_accepted() {
        let doc = parse("key value").unwrap();
        assert_eq!(doc.get("key").and_then(VdfValue::as_str), Some("value"));
    }

    #[test]
    fn test_comments_skipped() {
        let doc = parse("// header comment\n\"a\" \"1\" // trailing\n\"b\" \"2\"").unwrap();
        assert_eq!(doc.get("a").and_then(VdfValue::as_str), Some("1"));
        assert_eq!(doc.get("b").and_then(VdfValue::as_str), Some("2"));
    }

    #[test]
    fn test_duplicate_keys_first_wins_on_get() {
        let doc = parse("\"k\" \"first\"\n\"k\" \"second\"").unwrap();
        assert_eq!(doc.get("k").and_then(VdfValue::as_str), Some("first"));
        assert_eq!(doc.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_error_unterminated_string() {
        let err = parse("\"key\" \"unterminated").unwrap_err();
        assert!(matches!(err, VdfError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_error_missing_close_brace() {
        let err = parse("\"root\" { \"a\" \"1\"").unwrap_err();
        assert!(matches!(err, VdfError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_error_stray_close_brace() {
        let err = parse("\"a\" \"1\" }").unwrap_err();
        assert!(matches!(err, VdfError::UnbalancedBrace { line: 1 }));
    }

    #[test]
    fn test_error_key_missing_value() {
        let err = parse("\"lonely\"").unwrap_err();
        assert!(matches!(err, VdfError::UnexpectedEof { .. }));
    }

    // Property-based tests using proptest
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Round-trip: any set of simple pairs parses back to itself
            #[test]
            fn simple_pairs_roundtrip(pairs in prop::collection::vec(("[a-zA-Z0-9_]+", "[a-zA-Z0-9 _.-]*"), 1..8)) {
                let mut doc = String::new();
                for (k, v) in &pairs {
                    doc.push_str(&format!("\"{k}\"\t\"{v}\"\n"));
                }
                let parsed = parse(&doc).unwrap();
                let object = parsed.as_object().unwrap();
                prop_assert_eq!(object.len(), pairs.len());
                for ((k, v), (pk, pv)) in pairs.iter().zip(object.iter()) {
                    prop_assert_eq!(k, pk);
                    prop_assert_eq!(Some(v.as_str()), pv.as_str());
                }
            }

            /// Parsing never panics on arbitrary input
            #[test]
            fn parse_never_panics(input in ".*") {
                let _ = parse(&input);
            }
        }
    }
}
