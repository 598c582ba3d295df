//! End-to-end engine scenarios on hand-built trees.
//!
//! These mirror the behaviors a caller relies on when embedding the
//! engine: structural navigation, wildcard names, boolean and positional
//! predicates, nested sub-paths, and result ordering guarantees.

use astpath::{
    EvalOptions, Evaluator, NodeRef, PathCache, QueryError, SyntaxNode, SyntaxTree, TreeBuilder,
};

fn eval<'t>(tree: &'t SyntaxTree, path: &str) -> Vec<NodeRef<'t>> {
    let cache = PathCache::default();
    Evaluator::new(&cache)
        .query(path, &tree.root())
        .unwrap_or_else(|e| panic!("query '{path}' failed: {e}"))
}

fn names(nodes: &[NodeRef<'_>]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| n.name().unwrap_or("<unnamed>").to_string())
        .collect()
}

/// namespace > class > nested class, methods at several depths.
fn nested_tree() -> SyntaxTree {
    let mut b = TreeBuilder::new("source-file");
    b.open("namespace").name("NS");
    b.open("class").name("Outer");
    b.open("class").name("Inner");
    b.leaf("method").name("Method1");
    b.leaf("method").name("Method2");
    b.close();
    b.leaf("method").name("Method3");
    b.close();
    b.close();
    b.build()
}

#[test]
fn basic_child_navigation() {
    let mut b = TreeBuilder::new("source-file");
    b.open("namespace").name("TestNS");
    b.open("class").name("TestClass");
    b.leaf("method").name("TestMethod");
    b.close();
    b.close();
    let tree = b.build();

    let matches = eval(&tree, "/namespace/class/method");
    assert_eq!(names(&matches), ["TestMethod"]);
}

#[test]
fn descendant_navigation_reaches_all_depths() {
    let tree = nested_tree();
    let matches = eval(&tree, "//method");
    assert_eq!(names(&matches), ["Method1", "Method2", "Method3"]);
}

#[test]
fn wildcard_kind_with_name_predicate() {
    // A method and a field share the name `foo`; `//*[@name='foo']` must
    // find both regardless of kind.
    let mut b = TreeBuilder::new("source-file");
    b.open("class").name("TestClass");
    b.leaf("method").name("foo");
    b.leaf("method").name("bar");
    b.leaf("field").name("foo");
    b.close();
    let tree = b.build();

    let matches = eval(&tree, "//*[@name='foo']");
    assert_eq!(matches.len(), 2);
}

#[test]
fn kind_pattern_node_tests() {
    let mut b = TreeBuilder::new("source-file");
    b.open("block");
    b.leaf("if-statement");
    b.leaf("while-statement");
    b.leaf("for-statement");
    b.leaf("expression");
    b.close();
    let tree = b.build();

    assert_eq!(eval(&tree, "//if-statement").len(), 1);
    assert_eq!(eval(&tree, "//*-statement").len(), 3);
}

#[test]
fn position_predicates_over_statements() {
    let mut b = TreeBuilder::new("source-file");
    b.open("block");
    for text in ["var a = 1;", "var b = 2;", "var c = 3;", "var d = 4;"] {
        b.leaf("statement").text(text);
    }
    b.close();
    let tree = b.build();

    assert_eq!(eval(&tree, "//block/statement[1]")[0].text(), "var a = 1;");
    assert_eq!(eval(&tree, "//block/statement[last()]")[0].text(), "var d = 4;");
    assert_eq!(eval(&tree, "//block/statement[last()-1]")[0].text(), "var c = 3;");
}

#[test]
fn operator_attribute_comparison() {
    let mut b = TreeBuilder::new("source-file");
    b.open("method").name("Method");
    b.leaf("binary-expression")
        .attr("operator", "==")
        .attr("left-text", "x")
        .attr("right-text", "null");
    b.leaf("binary-expression")
        .attr("operator", "!=")
        .attr("left-text", "y")
        .attr("right-text", "null");
    b.leaf("binary-expression")
        .attr("operator", "+")
        .attr("left-text", "1")
        .attr("right-text", "2");
    b.close();
    let tree = b.build();

    assert_eq!(eval(&tree, "//binary-expression[@operator='==']").len(), 1);
    assert_eq!(
        eval(&tree, "//binary-expression[@operator='==' and @right-text='null']").len(),
        1
    );
}

#[test]
fn contains_predicate_over_statement_text() {
    let mut b = TreeBuilder::new("source-file");
    b.open("method").name("Method");
    b.leaf("statement").text("Console.WriteLine(\"Hello\");");
    b.leaf("statement").text("System.Console.WriteLine(\"World\");");
    b.leaf("statement").text("Debug.WriteLine(\"Debug\");");
    b.close();
    let tree = b.build();

    assert_eq!(eval(&tree, "//statement[@contains='Console.WriteLine']").len(), 2);
}

fn modifier_tree() -> SyntaxTree {
    let mut b = TreeBuilder::new("source-file");
    b.open("class").name("Test");
    b.leaf("method").name("Method1").flag("async").flag("public");
    b.leaf("method").name("Method2").flag("async").flag("private");
    b.leaf("method").name("Method3").flag("public");
    b.leaf("method").name("Method4").flag("async").flag("static");
    b.close();
    b.build()
}

#[test]
fn boolean_predicate_combinations() {
    let tree = modifier_tree();

    assert_eq!(
        names(&eval(&tree, "//method[@async]")),
        ["Method1", "Method2", "Method4"]
    );
    assert_eq!(names(&eval(&tree, "//method[@async and @public]")), ["Method1"]);
    assert_eq!(
        names(&eval(&tree, "//method[@public or @private]")),
        ["Method1", "Method2", "Method3"]
    );
    assert_eq!(
        names(&eval(&tree, "//method[not(@static)]")),
        ["Method1", "Method2", "Method3"]
    );
    assert_eq!(
        names(&eval(&tree, "//method[@async and (@static or @public)]")),
        ["Method1", "Method4"]
    );
}

#[test]
fn wildcard_name_predicates() {
    let mut b = TreeBuilder::new("source-file");
    b.open("class").name("Test");
    for name in ["GetUser", "GetUserById", "SetUser", "DeleteUser"] {
        b.leaf("method").name(name);
    }
    b.close();
    let tree = b.build();

    assert_eq!(names(&eval(&tree, "//method[Get*]")), ["GetUser", "GetUserById"]);
    assert_eq!(
        names(&eval(&tree, "//method[*User]")),
        ["GetUser", "SetUser", "DeleteUser"]
    );
    assert_eq!(names(&eval(&tree, "//method[Get*User]")), ["GetUser"]);
    assert_eq!(names(&eval(&tree, "//method[*User*]")).len(), 4);
}

#[test]
fn nested_path_predicate_selects_containing_statement() {
    let mut b = TreeBuilder::new("source-file");
    b.open("method").name("Method1");
    b.open("if-statement");
    b.open("block");
    b.leaf("throw-statement").text("throw new ArgumentNullException();");
    b.close();
    b.close();
    b.close();
    b.open("method").name("Method2");
    b.open("if-statement");
    b.open("block");
    b.leaf("return-statement").text("return;");
    b.close();
    b.close();
    b.close();
    let tree = b.build();

    let matches = eval(&tree, "//if-statement[.//throw-statement]");
    assert_eq!(matches.len(), 1);
    let owner = matches[0].parent().unwrap();
    assert_eq!(owner.name(), Some("Method1"));
}

#[test]
fn sibling_axes() {
    let mut b = TreeBuilder::new("source-file");
    b.open("block");
    b.leaf("statement").text("a");
    b.leaf("statement").text("b");
    b.leaf("statement").text("c");
    b.close();
    let tree = b.build();

    let second = eval(&tree, "//statement[2]");
    assert_eq!(second[0].text(), "b");

    let following = eval(&tree, "//statement[2]/following-sibling::statement");
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].text(), "c");

    let preceding = eval(&tree, "//statement[2]/preceding-sibling::statement");
    assert_eq!(preceding.len(), 1);
    assert_eq!(preceding[0].text(), "a");
}

#[test]
fn ancestor_navigation_from_leaf() {
    let tree = nested_tree();
    let matches = eval(&tree, "//method[Method1]/ancestor::class");
    assert_eq!(names(&matches), ["Outer", "Inner"]);

    let matches = eval(&tree, "//method[Method1]/ancestor-or-self::*");
    assert_eq!(matches.len(), 5);
}

#[test]
fn results_are_deduplicated_and_ordered() {
    let tree = nested_tree();
    // Both class steps expand overlapping descendant sets.
    let matches = eval(&tree, "//class//method");
    assert_eq!(names(&matches), ["Method1", "Method2", "Method3"]);

    // Stable across repeated calls.
    assert_eq!(eval(&tree, "//class//method"), matches);
}

#[test]
fn relative_queries_from_a_mid_tree_start() {
    let tree = nested_tree();
    let outer = eval(&tree, "//class[Outer]")[0];

    let cache = PathCache::default();
    let evaluator = Evaluator::new(&cache);

    let direct = evaluator.query("class/method", &outer).unwrap();
    assert_eq!(names(&direct), ["Method1", "Method2"]);

    let own = evaluator.query("method", &outer).unwrap();
    assert_eq!(names(&own), ["Method3"]);

    let all = evaluator.query(".//method", &outer).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn errors_carry_positions_and_kinds() {
    let tree = nested_tree();
    let cache = PathCache::default();
    let evaluator = Evaluator::new(&cache);

    let err = evaluator.query("//method[", &tree.root()).unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));

    let tight = Evaluator::with_options(
        &cache,
        EvalOptions {
            max_depth: 32,
            max_visits: 2,
        },
    );
    let err = tight.query("//method", &tree.root()).unwrap_err();
    assert!(matches!(err, QueryError::Eval(_)));
}

#[test]
fn roundtrip_for_every_node() {
    let tree = nested_tree();
    let cache = PathCache::default();
    let evaluator = Evaluator::new(&cache);

    for node in evaluator.query("//*", &tree.root()).unwrap() {
        let path = astpath::to_path_string(&node);
        let resolved = evaluator.query(&path, &tree.root()).unwrap();
        assert_eq!(resolved.len(), 1, "path '{path}'");
        assert_eq!(resolved[0].id(), node.id(), "path '{path}'");
    }
}
