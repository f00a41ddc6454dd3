use super::SignatureParams;
use crate::component::SignatureComponent;
use logos::{Logos, Span, SpannedIter};
use miette::{Diagnostic, SourceSpan};
use std::iter::Peekable;
use thiserror::Error;

#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
enum TokenTy {
    #[regex(r"[a-z*][a-z0-9_\-.*]*")]
    Key,

    #[token("=")]
    Equals,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[regex(r#""[^"]*""#)]
    String,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r":[A-Za-z0-9+/=_\-]*:")]
    ByteSequence,
}

/// What went wrong while parsing
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Label appears twice in the dictionary
    #[error("Duplicate label")]
    DuplicateLabel,

    /// Parameter appears twice
    #[error("Duplicate parameter")]
    DuplicateParameter,

    /// Component identifier isn't supported
    #[error("Invalid component identifier")]
    InvalidComponent,

    /// `created` isn't a valid timestamp
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// `created` parameter is missing
    #[error("Missing \"created\" parameter")]
    MissingCreated,

    /// Input ended early
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    /// Token isn't allowed at this position
    #[error("Unexpected token")]
    UnexpectedToken,

    /// Parameter isn't supported
    #[error("Unknown parameter")]
    UnknownParameter,
}

/// Signature header parsing failure
#[derive(Debug, Diagnostic, Error)]
#[error("Malformed signature header: {kind}")]
#[diagnostic(code(http_message_signatures::rfc9421::parse))]
pub struct ParseError {
    /// Kind of the error
    pub kind: ParseErrorKind,

    /// Location of the error inside the header
    #[label("{kind}")]
    pub span: SourceSpan,
}

impl ParseError {
    fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: span.into(),
        }
    }
}

struct Parser<'a> {
    /// Reference to the original input that was fed to the lexer
    input: &'a str,

    /// Stream of tokens and their locations
    tokens: Peekable<SpannedIter<'a, TokenTy>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: TokenTy::lexer(input).spanned().peekable(),
        }
    }

    fn next(&mut self) -> Result<(TokenTy, Span), ParseError> {
        match self.tokens.next() {
            Some((Ok(ty), span)) => Ok((ty, span)),
            Some((Err(()), span)) => Err(ParseError::new(ParseErrorKind::UnexpectedToken, span)),
            None => Err(ParseError::new(
                ParseErrorKind::UnexpectedEnd,
                self.input.len()..self.input.len(),
            )),
        }
    }

    fn expect(&mut self, expected: &TokenTy) -> Result<Span, ParseError> {
        let (ty, span) = self.next()?;
        if ty != *expected {
            return Err(ParseError::new(ParseErrorKind::UnexpectedToken, span));
        }

        Ok(span)
    }

    fn peek_is(&mut self, expected: &TokenTy) -> bool {
        matches!(self.tokens.peek(), Some((Ok(ty), _)) if ty == expected)
    }

    fn slice(&self, span: Span) -> &'a str {
        let input = self.input;
        &input[span]
    }

    /// Parse a structured field dictionary, delegating the member values to the closure
    fn dictionary<T, F>(&mut self, mut member: F) -> Result<Vec<(&'a str, T)>, ParseError>
    where
        F: FnMut(&mut Self) -> Result<T, ParseError>,
    {
        let mut members: Vec<(&'a str, T)> = Vec::new();

        loop {
            let label_span = self.expect(&TokenTy::Key)?;
            let label = self.slice(label_span.clone());
            if members.iter().any(|(existing, _)| *existing == label) {
                return Err(ParseError::new(ParseErrorKind::DuplicateLabel, label_span));
            }

            self.expect(&TokenTy::Equals)?;
            members.push((label, member(self)?));

            if self.tokens.peek().is_none() {
                break;
            }
            self.expect(&TokenTy::Comma)?;
        }

        Ok(members)
    }

    fn inner_list(&mut self) -> Result<Vec<SignatureComponent>, ParseError> {
        self.expect(&TokenTy::OpenParen)?;

        let mut components = Vec::new();
        loop {
            let (ty, span) = self.next()?;
            match ty {
                TokenTy::CloseParen => break,
                TokenTy::String => {
                    let identifier = self.slice(span.clone()).trim_matches('"');
                    let component = identifier
                        .parse()
                        .map_err(|_| ParseError::new(ParseErrorKind::InvalidComponent, span))?;

                    components.push(component);
                }
                _ => return Err(ParseError::new(ParseErrorKind::UnexpectedToken, span)),
            }
        }

        Ok(components)
    }

    fn created_param(&mut self, list_span_end: usize) -> Result<u64, ParseError> {
        let mut created = None;

        while self.peek_is(&TokenTy::Semicolon) {
            self.next()?;

            let key_span = self.expect(&TokenTy::Key)?;
            if self.slice(key_span.clone()) != "created" {
                return Err(ParseError::new(ParseErrorKind::UnknownParameter, key_span));
            }
            if created.is_some() {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateParameter,
                    key_span,
                ));
            }

            self.expect(&TokenTy::Equals)?;
            let value_span = self.expect(&TokenTy::Integer)?;
            let value = self
                .slice(value_span.clone())
                .parse::<u64>()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidTimestamp, value_span))?;

            created = Some(value);
        }

        created.ok_or_else(|| {
            ParseError::new(ParseErrorKind::MissingCreated, list_span_end..list_span_end)
        })
    }
}

/// Parse a `Signature-Input` header into the parameters of each signature it lists
#[inline]
pub fn parse_signature_input(input: &str) -> Result<Vec<SignatureParams>, ParseError> {
    let mut parser = Parser::new(input);
    let members = parser.dictionary(|parser| {
        let components = parser.inner_list()?;
        let list_end = parser
            .tokens
            .peek()
            .map_or(parser.input.len(), |(_, span)| span.start);
        let created = parser.created_param(list_end)?;

        Ok((components, created))
    })?;

    Ok(members
        .into_iter()
        .map(|(label, (components, created))| SignatureParams::new(label, components, created))
        .collect())
}

/// Parse a `Signature` header into pairs of labels and encoded signatures
#[inline]
pub fn parse_signature(input: &str) -> Result<Vec<(&str, &str)>, ParseError> {
    let mut parser = Parser::new(input);
    parser.dictionary(|parser| {
        let span = parser.expect(&TokenTy::ByteSequence)?;
        Ok(parser.slice(span).trim_matches(':'))
    })
}
