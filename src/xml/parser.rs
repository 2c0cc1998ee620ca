//! XML parser producing an element tree.

use super::lexer::{LexError, Lexer, Token};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token: {0:?}, expected {1}")]
    Unexpected(Token, &'static str),
    #[error("Mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedTag { expected: String, found: String },
    #[error("Unexpected end of document")]
    UnexpectedEof,
    #[error("Document has no root element")]
    NoRoot,
}

/// One XML element: name, attributes in document order, child elements.
/// Character data is discarded; descriptors carry everything in attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parse an XML document to its root element.
pub fn parse_document(input: &str) -> Result<Element, XmlError> {
    let tokens = Lexer::new(input).tokenize()?;
    Parser { tokens, pos: 0 }.parse_root()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        token
    }

    fn expect_ident(&mut self) -> Result<String, XmlError> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            Token::Eof => Err(XmlError::UnexpectedEof),
            token => Err(XmlError::Unexpected(token, "name")),
        }
    }

    fn parse_root(&mut self) -> Result<Element, XmlError> {
        while matches!(self.peek(), Token::Text(_)) {
            self.advance();
        }
        match self.advance() {
            Token::Lt => self.parse_element(),
            Token::Eof => Err(XmlError::NoRoot),
            token => Err(XmlError::Unexpected(token, "element")),
        }
    }

    /// Parses one element; the opening `<` is already consumed.
    fn parse_element(&mut self) -> Result<Element, XmlError> {
        let name = self.expect_ident()?;
        let mut attributes = Vec::new();

        loop {
            match self.advance() {
                Token::Ident(key) => {
                    match self.advance() {
                        Token::Eq => {}
                        token => return Err(XmlError::Unexpected(token, "=")),
                    }
                    match self.advance() {
                        Token::Str(value) => attributes.push((key, value)),
                        token => return Err(XmlError::Unexpected(token, "attribute value")),
                    }
                }
                Token::SlashGt => {
                    return Ok(Element {
                        name,
                        attributes,
                        children: Vec::new(),
                    });
                }
                Token::Gt => break,
                Token::Eof => return Err(XmlError::UnexpectedEof),
                token => return Err(XmlError::Unexpected(token, "attribute, `>` or `/>`")),
            }
        }

        let mut children = Vec::new();
        loop {
            match self.advance() {
                Token::Text(_) => {}
                Token::Lt => children.push(self.parse_element()?),
                Token::LtSlash => {
                    let closing = self.expect_ident()?;
                    if closing != name {
                        return Err(XmlError::MismatchedTag {
                            expected: name,
                            found: closing,
                        });
                    }
                    return match self.advance() {
                        Token::Gt => Ok(Element {
                            name,
                            attributes,
                            children,
                        }),
                        token => Err(XmlError::Unexpected(token, ">")),
                    };
                }
                Token::Eof => return Err(XmlError::UnexpectedEof),
                token => {
                    return Err(XmlError::Unexpected(token, "child element or closing tag"));
                }
            }
        }
    }
}
