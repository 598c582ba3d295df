//! Recursive descent parser for path expressions.
//!
//! Consumes the token stream produced by [`super::lexer::Lexer`] and builds
//! a [`PathExpression`]. One method per grammar production:
//!
//! ```text
//! Path      := ("/"|"//")? Step ( ("/"|"//") Step )*
//! Step      := Axis? NodeTest Predicate*
//! Axis      := Identifier "::"
//! NodeTest  := Identifier | WildcardPattern
//! Predicate := "[" OrExpr "]"
//! OrExpr    := AndExpr ("or" AndExpr)*
//! AndExpr   := UnaryExpr ("and" UnaryExpr)*
//! UnaryExpr := "not" "(" OrExpr ")" | Atom
//! Atom      := AttributeTest | ContainsTest | PositionTest
//!            | FunctionCall | NestedPathTest | NameTest | "(" OrExpr ")"
//! ```
//!
//! Nested-path atoms are not parsed here: the parser captures their raw
//! source text (bracket- and paren-depth aware) and defers parsing to first
//! evaluation, where the result is cached per distinct sub-string.

use crate::path::ast::{
    Anchor, AttrTest, Axis, Comparator, LiteralValue, NamePattern, NodeTest, PathExpression,
    Predicate, PositionSpec, Step,
};
use crate::path::errors::ParseError;
use crate::path::lexer::{Lexer, Token, TokenKind};

/// Parses a path string into a [`PathExpression`].
///
/// # Errors
///
/// Returns [`ParseError`] on any lexical or grammatical violation; there is
/// no partial result.
pub fn parse(input: &str) -> Result<PathExpression, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_path()?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            position: token.offset,
            expected: "end of path".to_string(),
            found: token.kind.to_string(),
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    /// Original input, for slicing nested-path raw text by token offset.
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{kind}'")))
        }
    }

    /// Offset just past the end of the input, for errors at end-of-path.
    fn end_offset(&self) -> usize {
        self.input.len()
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                position: token.offset,
                expected: expected.to_string(),
                found: format!("'{}'", token.kind),
            },
            None => ParseError::UnexpectedToken {
                position: self.end_offset(),
                expected: expected.to_string(),
                found: "end of path".to_string(),
            },
        }
    }

    // -----------------------------------------------------------------
    // Path / Step
    // -----------------------------------------------------------------

    fn parse_path(&mut self) -> Result<PathExpression, ParseError> {
        let (anchor, mut implicit_axis) = match self.peek_kind() {
            Some(TokenKind::Slash) => {
                self.advance();
                (Anchor::Root, Axis::Child)
            }
            Some(TokenKind::DoubleSlash) => {
                self.advance();
                (Anchor::Start, Axis::DescendantOrSelf)
            }
            _ => (Anchor::Start, Axis::Child),
        };

        // A bare `/` selects the root itself.
        if anchor == Anchor::Root && self.peek().is_none() {
            return Ok(PathExpression {
                anchor,
                steps: Vec::new(),
            });
        }

        let mut steps = vec![self.parse_step(implicit_axis)?];
        loop {
            implicit_axis = match self.peek_kind() {
                Some(TokenKind::Slash) => Axis::Child,
                Some(TokenKind::DoubleSlash) => Axis::DescendantOrSelf,
                _ => break,
            };
            self.advance();
            steps.push(self.parse_step(implicit_axis)?);
        }

        Ok(PathExpression { anchor, steps })
    }

    fn parse_step(&mut self, implicit_axis: Axis) -> Result<Step, ParseError> {
        // Explicit `axis::` overrides the separator-implied axis.
        let axis = if let (Some(TokenKind::Name(name)), Some(TokenKind::ColonColon)) =
            (self.peek_kind(), self.peek_kind_at(1))
        {
            let name = name.clone();
            let position = self.peek().unwrap().offset;
            let axis = Axis::parse(&name).ok_or(ParseError::UnknownAxis { position, name })?;
            self.advance();
            self.advance();
            axis
        } else {
            implicit_axis
        };

        let test = match self.peek_kind() {
            Some(TokenKind::Dot) => {
                self.advance();
                // `.` selects the context node itself.
                return Ok(Step {
                    axis: Axis::SelfAxis,
                    test: NodeTest::Pattern(NamePattern::new("*")),
                    predicates: self.parse_predicates()?,
                });
            }
            Some(TokenKind::Name(name)) => {
                let test = NodeTest::Kind(name.clone());
                self.advance();
                test
            }
            Some(TokenKind::Pattern(pattern)) => {
                let test = NodeTest::Pattern(NamePattern::new(pattern.clone()));
                self.advance();
                test
            }
            _ => return Err(self.unexpected("a node test")),
        };

        Ok(Step {
            axis,
            test,
            predicates: self.parse_predicates()?,
        })
    }

    fn parse_predicates(&mut self) -> Result<Vec<Predicate>, ParseError> {
        let mut predicates = Vec::new();
        while self.eat(&TokenKind::LBracket) {
            predicates.push(self.parse_or()?);
            self.expect(&TokenKind::RBracket)?;
        }
        Ok(predicates)
    }

    // -----------------------------------------------------------------
    // Predicate expressions
    // -----------------------------------------------------------------

    fn parse_or(&mut self) -> Result<Predicate, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Predicate::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Predicate, ParseError> {
        let mut left = self.parse_unary()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_unary()?;
            left = Predicate::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Predicate, ParseError> {
        if self.eat(&TokenKind::Not) {
            self.expect(&TokenKind::LParen)?;
            let inner = self.parse_or()?;
            self.expect(&TokenKind::RParen)?;
            return Ok(Predicate::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Predicate, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::At) => self.parse_attribute(),
            Some(TokenKind::Number(n)) => {
                let n = *n;
                if n.fract() != 0.0 {
                    return Err(self.unexpected("an integer position"));
                }
                self.advance();
                Ok(Predicate::Position(PositionSpec::Index(n as usize)))
            }
            Some(TokenKind::Pattern(pattern)) => {
                let pattern = pattern.clone();
                self.advance();
                Ok(Predicate::Name(NamePattern::new(pattern)))
            }
            Some(TokenKind::Name(_)) if self.peek_kind_at(1) == Some(&TokenKind::LParen) => {
                self.parse_function_call()
            }
            Some(TokenKind::Name(name)) => {
                let name = name.clone();
                self.advance();
                Ok(Predicate::Name(NamePattern::new(name)))
            }
            Some(TokenKind::Dot | TokenKind::Slash | TokenKind::DoubleSlash) => {
                self.capture_nested_path()
            }
            _ => Err(self.unexpected("a predicate")),
        }
    }

    fn parse_attribute(&mut self) -> Result<Predicate, ParseError> {
        self.expect(&TokenKind::At)?;
        let key = match self.peek_kind() {
            Some(TokenKind::Name(name)) => {
                let name = name.clone();
                self.advance();
                name
            }
            _ => return Err(self.unexpected("an attribute name")),
        };

        let comparator = match self.peek_kind() {
            Some(TokenKind::Eq) => Comparator::Eq,
            Some(TokenKind::NotEq) => Comparator::NotEq,
            Some(TokenKind::TokenEq) => Comparator::TokenContains,
            _ => {
                return Ok(Predicate::Attribute {
                    key,
                    test: AttrTest::Present,
                })
            }
        };
        self.advance();

        let value = match self.peek_kind() {
            Some(TokenKind::Literal(s)) => {
                let s = s.clone();
                self.advance();
                LiteralValue::Str(s)
            }
            Some(TokenKind::Number(n)) => {
                let n = *n;
                self.advance();
                LiteralValue::Num(n)
            }
            _ => return Err(self.unexpected("a string or number literal")),
        };

        // `@name` and `@contains` are surface sugar for the dedicated
        // predicate forms; normalizing here keeps one evaluator semantics.
        if let LiteralValue::Str(s) = &value {
            match (key.as_str(), comparator) {
                ("name", Comparator::Eq) => {
                    return Ok(Predicate::Name(NamePattern::new(s.clone())))
                }
                ("name", Comparator::NotEq) => {
                    return Ok(Predicate::Not(Box::new(Predicate::Name(NamePattern::new(
                        s.clone(),
                    )))))
                }
                ("contains", Comparator::Eq) => return Ok(Predicate::Contains(s.clone())),
                ("contains", Comparator::NotEq) => {
                    return Ok(Predicate::Not(Box::new(Predicate::Contains(s.clone()))))
                }
                _ => {}
            }
        }

        Ok(Predicate::Attribute {
            key,
            test: AttrTest::Cmp(comparator, value),
        })
    }

    fn parse_function_call(&mut self) -> Result<Predicate, ParseError> {
        let (name, position) = match self.peek() {
            Some(Token {
                kind: TokenKind::Name(name),
                offset,
            }) => (name.clone(), *offset),
            _ => unreachable!("caller checked for a Name token"),
        };
        self.advance();

        match name.as_str() {
            "last" => {
                self.expect(&TokenKind::LParen)?;
                self.expect(&TokenKind::RParen)?;
                if self.eat(&TokenKind::Minus) {
                    let n = match self.peek_kind() {
                        Some(TokenKind::Number(n)) if n.fract() == 0.0 => *n,
                        Some(TokenKind::Number(_)) => {
                            return Err(self.unexpected("an integer after 'last()-'"))
                        }
                        _ => return Err(self.unexpected("a number after 'last()-'")),
                    };
                    self.advance();
                    Ok(Predicate::Position(PositionSpec::LastMinus(n as usize)))
                } else {
                    Ok(Predicate::Position(PositionSpec::Last))
                }
            }
            "contains" => {
                self.expect(&TokenKind::LParen)?;
                let substring = match self.peek_kind() {
                    Some(TokenKind::Literal(s)) => s.clone(),
                    _ => return Err(self.unexpected("a string literal")),
                };
                self.advance();
                self.expect(&TokenKind::RParen)?;
                Ok(Predicate::Contains(substring))
            }
            _ => Err(ParseError::UnknownFunction { position, name }),
        }
    }

    /// Captures a nested-path atom as raw text without parsing it.
    ///
    /// Scans forward from the current token, tracking bracket and paren
    /// depth, and stops before a token that ends the atom at depth zero:
    /// `]`, `)`, `and`, or `or`. The raw text is the input slice between
    /// the first token's offset and the stop token's offset.
    fn capture_nested_path(&mut self) -> Result<Predicate, ParseError> {
        let start_offset = self.peek().expect("caller checked current token").offset;
        let mut bracket_depth = 0usize;
        let mut paren_depth = 0usize;

        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::LBracket => bracket_depth += 1,
                TokenKind::RBracket => {
                    if bracket_depth == 0 {
                        break;
                    }
                    bracket_depth -= 1;
                }
                TokenKind::LParen => paren_depth += 1,
                TokenKind::RParen => {
                    if paren_depth == 0 {
                        break;
                    }
                    paren_depth -= 1;
                }
                TokenKind::And | TokenKind::Or if bracket_depth == 0 && paren_depth == 0 => {
                    break;
                }
                _ => {}
            }
            self.advance();
        }

        let end_offset = self
            .peek()
            .map_or_else(|| self.end_offset(), |token| token.offset);
        let raw = self.input[start_offset..end_offset].trim().to_string();
        if raw.is_empty() {
            return Err(self.unexpected("a nested path"));
        }
        Ok(Predicate::NestedPath(raw))
    }
}
