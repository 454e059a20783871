//! Command-line driver for the record tree.
//!
//! Inserts the given integers one by one, printing the tree after each step,
//! optionally looks up keys read from stdin, then removes the integers again.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use avl_records::{AvlTree, PodOrder, PodPrinter, TreeError};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

type IntTree = AvlTree<PodOrder<i32>>;

/// Drive an AVL tree of integers through inserts, lookups and removals
#[derive(Parser, Debug)]
#[command(name = "avl-driver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Integers to insert, then remove, in the given order
    #[arg(required = true, allow_negative_numbers = true, value_name = "INTEGER")]
    values: Vec<i32>,

    /// Read keys from stdin and retrieve them before the removals
    #[arg(long)]
    probe: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::TRACE } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&cli, &mut out) {
        Ok(()) => {
            banner(&mut out, "Tests ran successfully.")?;
            Ok(())
        }
        Err(error) => {
            banner(&mut out, "Tests aborting after error.")?;
            Err(error)
        }
    }
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let mut tree: IntTree = AvlTree::for_pod()?;
    let printer = PodPrinter::<i32>::new();

    banner(out, "Inserting set into AVL tree.")?;
    for value in &cli.values {
        step(out, "Next insert", *value)?;
        tree.insert_pod(value)
            .with_context(|| format!("failed to insert {value}"))?;
        print_tree(&tree, &printer, out)?;
    }

    if cli.probe {
        banner(out, "Test retrieval from AVL tree.")?;
        probe(&tree, io::stdin().lock(), out)?;
    }

    banner(out, "Test removals from AVL tree.")?;
    for value in &cli.values {
        step(out, "Next removal", *value)?;
        tree.remove_pod(value)
            .with_context(|| format!("failed to remove {value}"))?;
        print_tree(&tree, &printer, out)?;
    }
    Ok(())
}

// Looks up keys until the input ends or a token is not an integer.
fn probe(tree: &IntTree, input: impl BufRead, out: &mut impl Write) -> Result<()> {
    write!(out, "Insert a key to retrieve or NaN to skip test: ")?;
    out.flush()?;
    for line in input.lines() {
        for token in line?.split_whitespace() {
            let Ok(key) = token.parse::<i32>() else {
                writeln!(out)?;
                return Ok(());
            };
            match tree.retrieve_pod(&key) {
                Ok(value) => writeln!(out, "{value} retrieved.")?,
                Err(TreeError::NotFound | TreeError::EmptyTree) => {
                    writeln!(out, "{key} not found.")?
                }
                Err(error) => return Err(error.into()),
            }
            write!(out, "Insert another key to retrieve or NaN to end test: ")?;
            out.flush()?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn print_tree(tree: &IntTree, printer: &PodPrinter<i32>, out: &mut impl Write) -> Result<()> {
    match tree.print(out, Some(printer)) {
        Err(TreeError::EmptyTree) => Ok(()),
        result => Ok(result?),
    }
}

fn banner(out: &mut impl Write, title: &str) -> io::Result<()> {
    let rule = "-".repeat(61);
    writeln!(out, "\n{rule}\n{title}\n{rule}\n")
}

fn step(out: &mut impl Write, action: &str, value: i32) -> io::Result<()> {
    let rule = "-".repeat(22);
    writeln!(out, "{rule}\n{action}: ({value})\n{rule}")
}
