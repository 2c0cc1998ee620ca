//! XML lexer: tokenizes markup and character data.

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LexError {
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unterminated comment")]
    UnterminatedComment,
    #[error("Unterminated declaration")]
    UnterminatedDeclaration,
    #[error("Unexpected character: {0:?}")]
    UnexpectedChar(char),
    #[error("Unknown entity reference: &{0};")]
    UnknownEntity(String),
}

/// XML token types. `Text` carries character data between tags.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Lt,      // <
    LtSlash, // </
    Gt,      // >
    SlashGt, // />
    Eq,      // = (inside a tag)
    Ident(String),
    Str(String),
    Text(String),
    Eof,
}

/// XML lexer. Switches between content mode (character data) and markup
/// mode (inside a tag) on `<` and `>` boundaries.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current: Option<char>,
    in_tag: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current = chars.next();
        Self {
            chars,
            current,
            in_tag: false,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn advance(&mut self) {
        self.current = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        if self.in_tag {
            self.markup_token()
        } else {
            self.content_token()
        }
    }

    fn content_token(&mut self) -> Result<Token, LexError> {
        loop {
            match self.current {
                None => return Ok(Token::Eof),
                Some('<') => match self.peek() {
                    // Comments, <!DOCTYPE ...> and friends
                    Some(&'!') => self.skip_declaration()?,
                    // XML prolog / processing instructions
                    Some(&'?') => self.skip_processing_instruction()?,
                    Some(&'/') => {
                        self.advance();
                        self.advance();
                        self.in_tag = true;
                        return Ok(Token::LtSlash);
                    }
                    _ => {
                        self.advance();
                        self.in_tag = true;
                        return Ok(Token::Lt);
                    }
                },
                Some(_) => {
                    let text = self.read_text();
                    if !text.trim().is_empty() {
                        return Ok(Token::Text(text));
                    }
                }
            }
        }
    }

    fn markup_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        match self.current {
            None => Ok(Token::Eof),
            Some('>') => {
                self.advance();
                self.in_tag = false;
                Ok(Token::Gt)
            }
            Some('/') => {
                self.advance();
                if self.current == Some('>') {
                    self.advance();
                    self.in_tag = false;
                    Ok(Token::SlashGt)
                } else {
                    Err(LexError::UnexpectedChar('/'))
                }
            }
            Some('=') => {
                self.advance();
                Ok(Token::Eq)
            }
            Some(q) if q == '"' || q == '\'' => self.read_string(q),
            Some(c) if is_name_start(c) => Ok(Token::Ident(self.read_name())),
            Some(c) => Err(LexError::UnexpectedChar(c)),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Character data up to the next tag. Entity references are left as-is;
    /// character data carries no mapping information downstream.
    fn read_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.current {
            if c == '<' {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.current {
            if is_name_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn read_string(&mut self, quote: char) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.current {
                None => return Err(LexError::UnterminatedString),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(Token::Str(value));
                }
                Some('&') => value.push(self.read_entity_reference()?),
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_entity_reference(&mut self) -> Result<char, LexError> {
        self.advance(); // &
        let mut name = String::new();
        loop {
            match self.current {
                Some(';') => {
                    self.advance();
                    break;
                }
                Some(c) if c.is_alphanumeric() || c == '#' || c == 'x' => {
                    name.push(c);
                    self.advance();
                }
                _ => return Err(LexError::UnknownEntity(name)),
            }
        }
        match name.as_str() {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            _ => {
                // Numeric character references: &#38; and &#x26;
                let code = if let Some(hex) = name.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or(LexError::UnknownEntity(name))
            }
        }
    }

    /// Skips `<!-- ... -->` comments and `<!DOCTYPE ...>` declarations.
    fn skip_declaration(&mut self) -> Result<(), LexError> {
        self.advance(); // <
        self.advance(); // !
        if self.current == Some('-') && self.peek() == Some(&'-') {
            self.advance();
            self.advance();
            return self.skip_comment_body();
        }
        // DOCTYPE may carry an internal subset in brackets
        let mut depth = 0usize;
        while let Some(c) = self.current {
            self.advance();
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(LexError::UnterminatedDeclaration)
    }

    fn skip_comment_body(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.current {
            if c == '-' && self.peek() == Some(&'-') {
                self.advance();
                self.advance();
                if self.current == Some('>') {
                    self.advance();
                    return Ok(());
                }
            } else {
                self.advance();
            }
        }
        Err(LexError::UnterminatedComment)
    }

    fn skip_processing_instruction(&mut self) -> Result<(), LexError> {
        self.advance(); // <
        self.advance(); // ?
        while let Some(c) = self.current {
            if c == '?' && self.peek() == Some(&'>') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }
        Err(LexError::UnterminatedDeclaration)
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == ':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_simple_tag() {
        let tokens = Lexer::new(r#"<class name="User"/>"#).tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Lt,
                Token::Ident("class".into()),
                Token::Ident("name".into()),
                Token::Eq,
                Token::Str("User".into()),
                Token::SlashGt,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_skips_prolog_and_comments() {
        let input = r#"<?xml version="1.0"?>
            <!-- mapping for users -->
            <class></class>"#;
        let tokens = Lexer::new(input).tokenize().unwrap();
        assert_eq!(tokens[0], Token::Lt);
        assert_eq!(tokens[1], Token::Ident("class".into()));
    }

    #[test]
    fn test_lex_entity_references() {
        let tokens = Lexer::new(r#"<a v="a &amp; b &#33;"/>"#).tokenize().unwrap();
        assert!(tokens.contains(&Token::Str("a & b !".into())));
    }

    #[test]
    fn test_lex_single_quoted_attribute() {
        let tokens = Lexer::new("<a v='x'/>").tokenize().unwrap();
        assert!(tokens.contains(&Token::Str("x".into())));
    }

    #[test]
    fn test_lex_unterminated_string() {
        let result = Lexer::new(r#"<a v="x"#).tokenize();
        assert!(matches!(result, Err(LexError::UnterminatedString)));
    }

    #[test]
    fn test_lex_hyphenated_names() {
        let tokens = Lexer::new("<many-to-one/>").tokenize().unwrap();
        assert_eq!(tokens[1], Token::Ident("many-to-one".into()));
    }
}
