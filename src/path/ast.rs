//! Parsed representation of a path expression.
//!
//! A [`PathExpression`] is an ordered list of [`Step`]s plus an anchor.
//! Expressions are immutable once parsed and carry no tree reference, so a
//! parsed expression is reusable across trees and start nodes and safe to
//! share through [`crate::cache::PathCache`].

use std::fmt;

/// Where evaluation of a path begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Leading `/`: anchored at the tree root.
    Root,
    /// No leading `/` (or a leading `//`): anchored at the start node.
    Start,
}

/// A parsed path expression.
///
/// A bare `/` parses to `Anchor::Root` with no steps and evaluates to the
/// root node itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    pub anchor: Anchor,
    pub steps: Vec<Step>,
}

/// One step of a path: axis, node-test, and predicates.
///
/// Multiple predicates on one step are an implicit conjunction:
/// `method[@async][@public]` behaves like `method[@async and @public]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

/// Direction of candidate expansion from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    SelfAxis,
}

impl Axis {
    /// The axis name as written in path syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::DescendantOrSelf => "descendant-or-self",
            Self::Parent => "parent",
            Self::Ancestor => "ancestor",
            Self::AncestorOrSelf => "ancestor-or-self",
            Self::FollowingSibling => "following-sibling",
            Self::PrecedingSibling => "preceding-sibling",
            Self::SelfAxis => "self",
        }
    }

    /// Parses an axis name; `None` for unrecognized names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "descendant-or-self" => Some(Self::DescendantOrSelf),
            "parent" => Some(Self::Parent),
            "ancestor" => Some(Self::Ancestor),
            "ancestor-or-self" => Some(Self::AncestorOrSelf),
            "following-sibling" => Some(Self::FollowingSibling),
            "preceding-sibling" => Some(Self::PrecedingSibling),
            "self" => Some(Self::SelfAxis),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind filter portion of a step, independent of predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// A literal kind name (`method`, `if-statement`).
    Kind(String),
    /// A wildcard pattern; `*` alone matches every kind, including any
    /// synthetic root wrapper.
    Pattern(NamePattern),
}

impl NodeTest {
    pub fn matches(&self, kind: &str) -> bool {
        match self {
            NodeTest::Kind(k) => k == kind,
            NodeTest::Pattern(p) => p.matches(kind),
        }
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Kind(k) => f.write_str(k),
            NodeTest::Pattern(p) => f.write_str(p.as_str()),
        }
    }
}

/// A `*`-glob over names or kinds (`Get*`, `*User`, `Get*User`, `*`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePattern {
    raw: String,
}

impl NamePattern {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Glob match with `*` as the only metacharacter. Case-sensitive.
    pub fn matches(&self, text: &str) -> bool {
        glob_match(&self.raw, text)
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = parts.split_first().unwrap();
    let (last, middle) = rest.split_last().unwrap();

    if !text.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    for part in middle {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    text.len() >= pos + last.len() && text.ends_with(last)
}

/// Positional filter resolved against the step's matched-candidate count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSpec {
    /// `[N]`: 1-based ordinal among this step's node-test survivors.
    Index(usize),
    /// `[last()]`.
    Last,
    /// `[last()-N]`.
    LastMinus(usize),
}

impl fmt::Display for PositionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSpec::Index(n) => write!(f, "{n}"),
            PositionSpec::Last => f.write_str("last()"),
            PositionSpec::LastMinus(n) => write!(f, "last()-{n}"),
        }
    }
}

/// Comparator in an attribute predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `~=`: space-delimited token-set membership, for modifier lists.
    TokenContains,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparator::Eq => "=",
            Comparator::NotEq => "!=",
            Comparator::TokenContains => "~=",
        })
    }
}

/// Right-hand side of an attribute comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Num(f64),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Str(s) => write!(f, "'{s}'"),
            LiteralValue::Num(n) => write!(f, "{n}"),
        }
    }
}

/// What an attribute predicate asserts about an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrTest {
    /// `[@async]`: attribute present and truthy.
    Present,
    /// `[@key = 'v']` and friends.
    Cmp(Comparator, LiteralValue),
}

/// A predicate expression tree, evaluated per candidate node.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Declared-name match, exact or glob (`[foo]`, `[Get*]`).
    Name(NamePattern),
    /// Attribute presence or comparison (`[@async]`, `[@operator='==']`).
    Attribute { key: String, test: AttrTest },
    /// Case-sensitive substring of the node's raw text.
    Contains(String),
    /// Positional filter.
    Position(PositionSpec),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    /// A nested sub-path (`[.//throw-statement]`), kept as the raw source
    /// text. Parsing is deferred to first evaluation and cached per
    /// distinct string, so parse-time recursion is bounded.
    NestedPath(String),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Name(p) => f.write_str(p.as_str()),
            Predicate::Attribute { key, test } => match test {
                AttrTest::Present => write!(f, "@{key}"),
                AttrTest::Cmp(cmp, value) => write!(f, "@{key} {cmp} {value}"),
            },
            Predicate::Contains(s) => write!(f, "contains('{s}')"),
            Predicate::Position(p) => write!(f, "{p}"),
            Predicate::And(l, r) => {
                fmt_operand(f, l)?;
                f.write_str(" and ")?;
                fmt_operand(f, r)
            }
            Predicate::Or(l, r) => write!(f, "{l} or {r}"),
            Predicate::Not(inner) => write!(f, "not({inner})"),
            Predicate::NestedPath(raw) => f.write_str(raw),
        }
    }
}

/// Parenthesizes `or` operands under an `and`, preserving precedence in
/// the rendered form.
fn fmt_operand(f: &mut fmt::Formatter<'_>, p: &Predicate) -> fmt::Result {
    if matches!(p, Predicate::Or(..)) {
        write!(f, "({p})")
    } else {
        write!(f, "{p}")
    }
}

impl Step {
    /// Renders with the axis spelled out, predicates included.
    fn fmt_explicit_axis(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.axis, self.test)?;
        for predicate in &self.predicates {
            write!(f, "[{predicate}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.axis {
            // Child and descendant-or-self are carried by the `/` / `//`
            // separators; everything else is spelled out.
            Axis::Child | Axis::DescendantOrSelf => {
                write!(f, "{}", self.test)?;
                for predicate in &self.predicates {
                    write!(f, "[{predicate}]")?;
                }
                Ok(())
            }
            _ => self.fmt_explicit_axis(f),
        }
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return match self.anchor {
                Anchor::Root => f.write_str("/"),
                Anchor::Start => f.write_str("."),
            };
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i == 0 {
                match (self.anchor, step.axis) {
                    // A leading `//` re-parses as a start-anchored path, so
                    // a root anchor spells the axis out instead.
                    (Anchor::Root, Axis::DescendantOrSelf) => {
                        f.write_str("/")?;
                        step.fmt_explicit_axis(f)?;
                        continue;
                    }
                    (Anchor::Root, _) => f.write_str("/")?,
                    (Anchor::Start, Axis::DescendantOrSelf) => f.write_str("//")?,
                    (Anchor::Start, _) => {}
                }
            } else if step.axis == Axis::DescendantOrSelf {
                f.write_str("//")?;
            } else {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
