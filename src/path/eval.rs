//! Evaluation driver and predicate evaluator.
//!
//! [`Evaluator::evaluate`] applies a parsed [`PathExpression`] to a start
//! node: steps run left to right, each expanding every current candidate
//! along its axis, deduplicating by node identity, ordering by document
//! position, filtering by node-test, then filtering by the step's
//! predicate conjunction. Nested-path predicates re-enter the driver with
//! the candidate as sole start node, through the shared expression cache.
//!
//! Evaluation is bounded: a node-visit counter and a nested-path recursion
//! depth are threaded through every step, and exceeding either aborts the
//! whole query with a dedicated error instead of hanging on pathological
//! input. No partial result set is ever returned.

use crate::cache::PathCache;
use crate::node::{AttrValue, SyntaxNode};
use crate::path::ast::{
    Anchor, AttrTest, Comparator, LiteralValue, PathExpression, PositionSpec, Predicate, Step,
};
use crate::path::axis::expand;
use crate::path::errors::{EvalError, QueryError};

/// Resource limits for one evaluation call.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Maximum nested-path re-entry depth.
    pub max_depth: usize,
    /// Maximum number of candidate nodes examined across the whole query,
    /// nested sub-paths included.
    pub max_visits: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_visits: 100_000,
        }
    }
}

/// Per-candidate context handed to positional predicates.
///
/// `ordinal` is the candidate's 1-based position among the nodes that
/// passed this step's node-test; `total` is the count of those nodes.
/// Reconstructed fresh for every step.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    pub ordinal: usize,
    pub total: usize,
}

/// Mutable per-call budget; exceeding a limit aborts the query.
struct Budget {
    options: EvalOptions,
    depth: usize,
    visits: usize,
}

impl Budget {
    fn new(options: EvalOptions) -> Self {
        Self {
            options,
            depth: 0,
            visits: 0,
        }
    }

    fn visit(&mut self) -> Result<(), EvalError> {
        self.visits += 1;
        if self.visits > self.options.max_visits {
            return Err(EvalError::VisitBudget {
                limit: self.options.max_visits,
            });
        }
        Ok(())
    }

    fn enter_nested(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(EvalError::RecursionLimit {
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn exit_nested(&mut self) {
        self.depth -= 1;
    }
}

/// Path query evaluator.
///
/// Holds the expression cache used for nested sub-paths and the evaluation
/// budget; per-call state never outlives a call.
pub struct Evaluator<'c> {
    cache: &'c PathCache,
    options: EvalOptions,
}

impl<'c> Evaluator<'c> {
    pub fn new(cache: &'c PathCache) -> Self {
        Self {
            cache,
            options: EvalOptions::default(),
        }
    }

    pub fn with_options(cache: &'c PathCache, options: EvalOptions) -> Self {
        Self { cache, options }
    }

    /// Parses `path` through the cache and evaluates it from `start`.
    pub fn query<N: SyntaxNode>(&self, path: &str, start: &N) -> Result<Vec<N>, QueryError> {
        let expr = self.cache.get_or_parse(path)?;
        Ok(self.evaluate(&expr, start)?)
    }

    /// Evaluates a parsed expression from `start`.
    ///
    /// Results are in document order and deduplicated by node identity,
    /// even when overlapping expansions reach the same node through
    /// multiple routes.
    pub fn evaluate<N: SyntaxNode>(
        &self,
        expr: &PathExpression,
        start: &N,
    ) -> Result<Vec<N>, EvalError> {
        let mut budget = Budget::new(self.options);
        self.eval_expr(expr, start, &mut budget)
    }

    fn eval_expr<N: SyntaxNode>(
        &self,
        expr: &PathExpression,
        start: &N,
        budget: &mut Budget,
    ) -> Result<Vec<N>, EvalError> {
        let mut candidates = match expr.anchor {
            Anchor::Root => vec![start.root()],
            Anchor::Start => vec![start.clone()],
        };

        for step in &expr.steps {
            candidates = self.eval_step(step, &candidates, budget)?;
            if candidates.is_empty() {
                break;
            }
        }
        Ok(candidates)
    }

    fn eval_step<N: SyntaxNode>(
        &self,
        step: &Step,
        current: &[N],
        budget: &mut Budget,
    ) -> Result<Vec<N>, EvalError> {
        // Union of expansions over all current candidates.
        let mut merged: Vec<N> = Vec::new();
        for node in current {
            for candidate in expand(node, step.axis) {
                budget.visit()?;
                merged.push(candidate);
            }
        }

        // Document order and identity dedup; ids are pre-order by contract.
        merged.sort_by_key(SyntaxNode::id);
        merged.dedup_by_key(|n| n.id());

        let survivors: Vec<N> = merged
            .into_iter()
            .filter(|node| step.test.matches(node.kind()))
            .collect();

        let total = survivors.len();
        let mut out = Vec::new();
        'candidates: for (index, node) in survivors.iter().enumerate() {
            let ctx = EvalContext {
                ordinal: index + 1,
                total,
            };
            for predicate in &step.predicates {
                if !self.eval_predicate(predicate, node, ctx, budget)? {
                    continue 'candidates;
                }
            }
            out.push(node.clone());
        }
        Ok(out)
    }

    fn eval_predicate<N: SyntaxNode>(
        &self,
        predicate: &Predicate,
        node: &N,
        ctx: EvalContext,
        budget: &mut Budget,
    ) -> Result<bool, EvalError> {
        match predicate {
            Predicate::Name(pattern) => Ok(node.name().is_some_and(|name| pattern.matches(name))),

            Predicate::Attribute { key, test } => Ok(eval_attribute(node, key, test)),

            Predicate::Contains(substring) => Ok(node.text().contains(substring)),

            Predicate::Position(spec) => Ok(match *spec {
                PositionSpec::Index(n) => ctx.ordinal == n,
                PositionSpec::Last => ctx.ordinal == ctx.total,
                PositionSpec::LastMinus(k) => ctx.total > k && ctx.ordinal == ctx.total - k,
            }),

            Predicate::And(left, right) => {
                if !self.eval_predicate(left, node, ctx, budget)? {
                    return Ok(false);
                }
                self.eval_predicate(right, node, ctx, budget)
            }

            Predicate::Or(left, right) => {
                if self.eval_predicate(left, node, ctx, budget)? {
                    return Ok(true);
                }
                self.eval_predicate(right, node, ctx, budget)
            }

            Predicate::Not(inner) => Ok(!self.eval_predicate(inner, node, ctx, budget)?),

            Predicate::NestedPath(raw) => {
                let expr = self
                    .cache
                    .get_or_parse(raw)
                    .map_err(|source| EvalError::NestedPath {
                        path: raw.clone(),
                        source: Box::new(source),
                    })?;
                budget.enter_nested()?;
                // Anchored at the candidate, never the original root, which
                // bounds what a nested path can re-walk.
                let matched = self.eval_expr(&expr, node, budget)?;
                budget.exit_nested();
                Ok(!matched.is_empty())
            }
        }
    }
}

/// Attribute predicate semantics.
///
/// The `name` key falls back to the node's declared name when the provider
/// exposes no attribute of that key. A missing attribute fails every test,
/// including `!=`; mismatched value types also fail rather than erroring.
fn eval_attribute<N: SyntaxNode>(node: &N, key: &str, test: &AttrTest) -> bool {
    let value = node.attr(key).or_else(|| {
        (key == "name").then(|| node.name().map(AttrValue::from)).flatten()
    });
    let Some(value) = value else {
        return false;
    };

    match test {
        AttrTest::Present => value.is_truthy(),
        AttrTest::Cmp(comparator, literal) => match (comparator, &value, literal) {
            (Comparator::Eq, AttrValue::Str(s), LiteralValue::Str(l)) => s == l,
            (Comparator::NotEq, AttrValue::Str(s), LiteralValue::Str(l)) => s != l,
            (Comparator::Eq, AttrValue::Num(n), LiteralValue::Num(l)) => n == l,
            (Comparator::NotEq, AttrValue::Num(n), LiteralValue::Num(l)) => n != l,
            (Comparator::Eq, AttrValue::Bool(b), LiteralValue::Str(l)) => {
                *b == (l == "true") && (l == "true" || l == "false")
            }
            (Comparator::NotEq, AttrValue::Bool(b), LiteralValue::Str(l)) => {
                (l == "true" || l == "false") && *b != (l == "true")
            }
            (Comparator::TokenContains, AttrValue::Str(s), LiteralValue::Str(l)) => {
                s.split_ascii_whitespace().any(|token| token == l)
            }
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse;
    use crate::tree::{SyntaxTree, TreeBuilder};

    fn eval<'t>(tree: &'t SyntaxTree, path: &str) -> Vec<crate::tree::NodeRef<'t>> {
        let cache = PathCache::default();
        let evaluator = Evaluator::new(&cache);
        evaluator.query(path, &tree.root()).unwrap()
    }

    fn names(nodes: &[crate::tree::NodeRef<'_>]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.name().unwrap_or("<unnamed>").to_string())
            .collect()
    }

    /// One class with four methods carrying modifier attributes, plus a
    /// nested class with one more method.
    fn service_tree() -> SyntaxTree {
        let mut b = TreeBuilder::new("source-file");
        b.open("class").name("UserService");
        b.leaf("method")
            .name("GetUser")
            .flag("async")
            .flag("public")
            .attr("modifiers", "async public");
        b.leaf("method")
            .name("GetUserById")
            .flag("async")
            .flag("private")
            .attr("modifiers", "async private");
        b.leaf("method")
            .name("SetUser")
            .flag("public")
            .attr("modifiers", "public");
        b.leaf("method")
            .name("DeleteUser")
            .flag("async")
            .flag("static")
            .attr("modifiers", "async static");
        b.open("class").name("Inner");
        b.leaf("method").name("Helper");
        b.close();
        b.close();
        b.build()
    }

    #[test]
    fn child_steps_navigate_structure() {
        let tree = service_tree();
        let matches = eval(&tree, "/class/method");
        assert_eq!(names(&matches), ["GetUser", "GetUserById", "SetUser", "DeleteUser"]);
    }

    #[test]
    fn descendant_step_reaches_nested_nodes() {
        let tree = service_tree();
        let matches = eval(&tree, "//method");
        assert_eq!(matches.len(), 5);
    }

    #[test]
    fn wildcard_node_test_matches_every_kind() {
        let tree = service_tree();
        let matches = eval(&tree, "//*");
        // Every node including the root wrapper.
        assert_eq!(matches.len(), tree.len());
    }

    #[test]
    fn name_predicates_with_wildcards() {
        let tree = service_tree();
        assert_eq!(names(&eval(&tree, "//method[Get*]")), ["GetUser", "GetUserById"]);
        assert_eq!(
            names(&eval(&tree, "//method[*User]")),
            ["GetUser", "SetUser", "DeleteUser"]
        );
        assert_eq!(names(&eval(&tree, "//method[GetUser]")), ["GetUser"]);
    }

    #[test]
    fn attribute_name_sugar_matches_methods_and_fields() {
        let mut b = TreeBuilder::new("source-file");
        b.open("class").name("T");
        b.leaf("method").name("foo");
        b.leaf("method").name("bar");
        b.leaf("field").name("foo");
        b.close();
        let tree = b.build();

        let matches = eval(&tree, "//*[@name='foo']");
        assert_eq!(matches.len(), 2);
        let kinds: Vec<_> = matches.iter().map(|n| n.kind().to_string()).collect();
        assert_eq!(kinds, ["method", "field"]);
    }

    #[test]
    fn boolean_combinators_short_circuit_semantics() {
        let tree = service_tree();
        assert_eq!(names(&eval(&tree, "//method[@async and @public]")), ["GetUser"]);
        assert_eq!(
            names(&eval(&tree, "//method[@public or @private]")),
            ["GetUser", "GetUserById", "SetUser"]
        );
        assert_eq!(
            names(&eval(&tree, "//method[not(@static)]")),
            ["GetUser", "GetUserById", "SetUser", "Helper"]
        );
    }

    #[test]
    fn stacked_brackets_equal_and() {
        let tree = service_tree();
        assert_eq!(
            eval(&tree, "//method[@async][@public]"),
            eval(&tree, "//method[@async and @public]")
        );
    }

    #[test]
    fn token_set_comparator() {
        let tree = service_tree();
        assert_eq!(
            names(&eval(&tree, "//method[@modifiers ~= 'async']")),
            ["GetUser", "GetUserById", "DeleteUser"]
        );
        // No substring false positives: 'a' is not a token.
        assert!(eval(&tree, "//method[@modifiers ~= 'a']").is_empty());
    }

    #[test]
    fn attribute_comparisons() {
        let mut b = TreeBuilder::new("source-file");
        b.open("method").name("m");
        b.leaf("binary-expression")
            .attr("operator", "==")
            .attr("right-text", "null");
        b.leaf("binary-expression").attr("operator", "!=");
        b.leaf("binary-expression").attr("operator", "+");
        b.close();
        let tree = b.build();

        assert_eq!(eval(&tree, "//binary-expression[@operator='==']").len(), 1);
        assert_eq!(eval(&tree, "//binary-expression[@operator!='==']").len(), 2);
        assert_eq!(
            eval(&tree, "//binary-expression[@operator='==' and @right-text='null']").len(),
            1
        );
    }

    #[test]
    fn missing_attribute_is_a_non_match_even_for_noteq() {
        let mut b = TreeBuilder::new("source-file");
        b.leaf("method").name("m");
        let tree = b.build();

        assert!(eval(&tree, "//method[@operator='x']").is_empty());
        assert!(eval(&tree, "//method[@operator!='x']").is_empty());
        assert!(eval(&tree, "//method[@async]").is_empty());
    }

    #[test]
    fn contains_predicate_is_case_sensitive() {
        let mut b = TreeBuilder::new("source-file");
        b.open("block");
        b.leaf("statement").text("Console.WriteLine(\"hi\");");
        b.leaf("statement").text("System.Console.WriteLine(\"yo\");");
        b.leaf("statement").text("Debug.WriteLine(\"dbg\");");
        b.close();
        let tree = b.build();

        assert_eq!(eval(&tree, "//statement[@contains='Console.WriteLine']").len(), 2);
        assert_eq!(eval(&tree, "//statement[contains('WriteLine')]").len(), 3);
        assert!(eval(&tree, "//statement[contains('console')]").is_empty());
    }

    fn block_of_four() -> SyntaxTree {
        let mut b = TreeBuilder::new("source-file");
        b.open("block");
        for text in ["a", "b", "c", "d"] {
            b.leaf("statement").text(text);
        }
        b.close();
        b.build()
    }

    #[test]
    fn position_predicates() {
        let tree = block_of_four();
        let texts = |path: &str| -> Vec<String> {
            eval(&tree, path).iter().map(|n| n.text().to_string()).collect()
        };
        assert_eq!(texts("/block/statement[1]"), ["a"]);
        assert_eq!(texts("/block/statement[last()]"), ["d"]);
        assert_eq!(texts("/block/statement[last()-1]"), ["c"]);
        assert!(texts("/block/statement[5]").is_empty());
        assert!(texts("/block/statement[0]").is_empty());
        assert!(texts("/block/statement[last()-4]").is_empty());
    }

    #[test]
    fn position_counts_node_test_survivors_not_raw_siblings() {
        let mut b = TreeBuilder::new("source-file");
        b.open("block");
        b.leaf("comment");
        b.leaf("statement").text("first");
        b.leaf("comment");
        b.leaf("statement").text("second");
        b.close();
        let tree = b.build();

        let matches = eval(&tree, "/block/statement[1]");
        assert_eq!(matches[0].text(), "first");
        let matches = eval(&tree, "/block/statement[2]");
        assert_eq!(matches[0].text(), "second");
    }

    #[test]
    fn nested_path_predicate() {
        let mut b = TreeBuilder::new("source-file");
        b.open("method").name("Method1");
        b.open("if-statement");
        b.open("block");
        b.leaf("throw-statement");
        b.close();
        b.close();
        b.close();
        b.open("method").name("Method2");
        b.open("if-statement");
        b.open("block");
        b.leaf("return-statement");
        b.close();
        b.close();
        b.close();
        let tree = b.build();

        let matches = eval(&tree, "//if-statement[.//throw-statement]");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].parent().unwrap().name(), Some("Method1"));

        let matches = eval(&tree, "//method[not(.//throw-statement)]");
        assert_eq!(names(&matches), ["Method2"]);
    }

    #[test]
    fn nested_path_is_rooted_at_the_candidate() {
        // The throw lives in a sibling method; `.//` from the if-statement
        // must not see it.
        let mut b = TreeBuilder::new("source-file");
        b.open("method").name("A");
        b.leaf("throw-statement");
        b.close();
        b.open("method").name("B");
        b.open("if-statement");
        b.leaf("block");
        b.close();
        b.close();
        let tree = b.build();

        assert!(eval(&tree, "//if-statement[.//throw-statement]").is_empty());
    }

    #[test]
    fn parent_and_ancestor_axes() {
        let tree = service_tree();
        let matches = eval(&tree, "//method[Helper]/parent::class");
        assert_eq!(names(&matches), ["Inner"]);

        let matches = eval(&tree, "//method[Helper]/ancestor::class");
        assert_eq!(names(&matches), ["UserService", "Inner"]);
    }

    #[test]
    fn overlapping_expansions_dedup() {
        // `//class//method`: the outer class reaches Helper both directly
        // (descendant) and through the inner class's own expansion.
        let tree = service_tree();
        let matches = eval(&tree, "//class//method");
        assert_eq!(matches.len(), 5);
        let mut ids: Vec<_> = matches.iter().map(|n| n.id()).collect();
        let before = ids.clone();
        ids.sort();
        ids.dedup();
        assert_eq!(ids, before, "results must be sorted and unique");
    }

    #[test]
    fn evaluation_is_idempotent() {
        let tree = service_tree();
        let cache = PathCache::default();
        let evaluator = Evaluator::new(&cache);
        let expr = parse("//method[@async]").unwrap();
        let first = evaluator.evaluate(&expr, &tree.root()).unwrap();
        let second = evaluator.evaluate(&expr, &tree.root()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn absolute_path_from_deep_start_node() {
        let tree = service_tree();
        let helper = eval(&tree, "//method[Helper]")[0];
        let cache = PathCache::default();
        let evaluator = Evaluator::new(&cache);

        // Anchored at the root even though evaluation starts at a leaf.
        let matches = evaluator.query("/class", &helper).unwrap();
        assert_eq!(names(&matches), ["UserService"]);

        // Bare `/` selects the root itself.
        let matches = evaluator.query("/", &helper).unwrap();
        assert_eq!(matches[0].id(), tree.root().id());
    }

    #[test]
    fn visit_budget_aborts_instead_of_hanging() {
        let tree = service_tree();
        let cache = PathCache::default();
        let evaluator = Evaluator::with_options(
            &cache,
            EvalOptions {
                max_depth: 32,
                max_visits: 3,
            },
        );
        let err = evaluator.query("//method", &tree.root()).unwrap_err();
        assert_eq!(err, QueryError::Eval(EvalError::VisitBudget { limit: 3 }));
    }

    #[test]
    fn recursion_limit_applies_to_nested_paths() {
        let mut b = TreeBuilder::new("source-file");
        b.open("if-statement");
        b.leaf("throw-statement");
        b.close();
        let tree = b.build();

        let cache = PathCache::default();
        let evaluator = Evaluator::with_options(
            &cache,
            EvalOptions {
                max_depth: 0,
                max_visits: 100_000,
            },
        );
        let err = evaluator
            .query("//if-statement[.//throw-statement]", &tree.root())
            .unwrap_err();
        assert_eq!(err, QueryError::Eval(EvalError::RecursionLimit { limit: 0 }));
    }

    #[test]
    fn malformed_nested_path_is_reported_at_first_use() {
        let mut b = TreeBuilder::new("source-file");
        b.leaf("if-statement");
        let tree = b.build();

        let cache = PathCache::default();
        let evaluator = Evaluator::new(&cache);
        let err = evaluator
            .query("//if-statement[.//cousin::x]", &tree.root())
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Eval(EvalError::NestedPath { .. })
        ));
    }

    #[test]
    fn nested_path_expressions_are_cached_by_string() {
        let tree = service_tree();
        let cache = PathCache::default();
        let evaluator = Evaluator::new(&cache);
        evaluator
            .query("//class[.//method[@async]]", &tree.root())
            .unwrap();
        // Outer path plus the nested sub-path.
        assert_eq!(cache.len(), 2);
    }
}
