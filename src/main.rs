use anyhow::{Context, Result};
use astpath::{parse_rust, to_path_string, Evaluator, PathCache, Span, SyntaxNode, SyntaxTree};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "astpath")]
#[command(about = "XPath-like structural queries over Rust syntax trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a path query against a Rust source file
    Query {
        /// Source file to query
        file: PathBuf,

        /// Path expression, e.g. //function-item[@async]
        path: String,

        /// Emit matches as JSON records
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical path of the innermost node at a position
    PathOf {
        /// Source file to inspect
        file: PathBuf,

        /// 1-based line number
        line: usize,

        /// 1-based column number
        #[arg(default_value_t = 1)]
        column: usize,
    },
}

/// One query match, as reported to the user.
#[derive(Serialize)]
struct MatchRecord {
    kind: String,
    name: Option<String>,
    span: Span,
    line: usize,
    preview: String,
    path: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { file, path, json } => cmd_query(&file, &path, json),
        Commands::PathOf { file, line, column } => cmd_path_of(&file, line, column),
    }
}

fn load_tree(file: &PathBuf) -> Result<(String, SyntaxTree)> {
    let source =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let tree = parse_rust(&source).with_context(|| format!("parsing {}", file.display()))?;
    Ok((source, tree))
}

fn cmd_query(file: &PathBuf, path: &str, json: bool) -> Result<()> {
    let (source, tree) = load_tree(file)?;

    let cache = PathCache::default();
    let evaluator = Evaluator::new(&cache);
    let matches = evaluator
        .query(path, &tree.root())
        .with_context(|| format!("query '{path}'"))?;

    let records: Vec<MatchRecord> = matches
        .iter()
        .map(|node| MatchRecord {
            kind: node.kind().to_string(),
            name: node.name().map(String::from),
            span: node.span(),
            line: line_of_offset(&source, node.span().start),
            preview: preview(node.text()),
            path: to_path_string(node),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "no matches".yellow());
        return Ok(());
    }

    for record in &records {
        let name = record.name.as_deref().unwrap_or("");
        println!(
            "{}:{} {} {} {}",
            file.display(),
            record.line,
            record.kind.cyan(),
            name.bold(),
            record.preview.dimmed()
        );
        println!("  {}", record.path.green());
    }
    println!("{} match(es)", records.len());
    Ok(())
}

fn cmd_path_of(file: &PathBuf, line: usize, column: usize) -> Result<()> {
    let (source, tree) = load_tree(file)?;
    let offset = offset_of_position(&source, line, column)
        .with_context(|| format!("position {line}:{column} is outside {}", file.display()))?;

    let node = tree.node_at_offset(offset);
    println!("{}", to_path_string(&node).green());
    Ok(())
}

/// 1-based line number of a byte offset.
fn line_of_offset(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Byte offset of a 1-based line/column position.
fn offset_of_position(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }
    let line_start = if line == 1 {
        0
    } else {
        source
            .match_indices('\n')
            .nth(line - 2)
            .map(|(i, _)| i + 1)?
    };
    let offset = line_start + (column - 1);
    (offset <= source.len()).then_some(offset)
}

/// First line of the node's text, truncated for terminal display.
fn preview(text: &str) -> String {
    const MAX: usize = 80;
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.len() > MAX {
        let mut end = MAX;
        while !first_line.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &first_line[..end])
    } else {
        first_line.to_string()
    }
}
