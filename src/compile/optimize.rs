//! Whole-tree rewrite passes applied once after parsing.
//!
//! Every sequence in the tree is rewritten bottom up:
//! - Conditionals with a literal condition are replaced by the selected
//!   branch, or dropped if that branch is absent.
//! - Maximal runs of adjacent text nodes are concatenated.
//! - Text nodes consisting only of spaces, tabs, CR and LF are removed.
//!
//! Folding runs before merging so that the nodes of a spliced branch merge
//! with their new neighbours, and elision runs last. This order makes the
//! optimizer idempotent.

use crate::types::ast::{Node, Sequence, Text};

/// Counts of the rewrites performed by [`optimize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub folded: usize,
    pub merged: usize,
    pub elided: usize,
}

/// Optimizes a sequence and all nested sequences.
pub fn optimize(seq: Sequence) -> (Sequence, Stats) {
    let mut stats = Stats::default();
    let seq = optimize_sequence(seq, &mut stats);
    (seq, stats)
}

fn optimize_sequence(seq: Sequence, stats: &mut Stats) -> Sequence {
    let nodes = fold_constants(seq.nodes, stats);
    let nodes = merge_text(nodes, stats);
    let nodes = elide_whitespace(nodes, stats);
    Sequence { nodes }
}

/// Optimizes nested sequences and replaces conditionals that have a literal
/// condition by the nodes of the selected branch.
fn fold_constants(nodes: Vec<Node>, stats: &mut Stats) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::IfElse(mut if_else) => {
                if_else.then_branch = optimize_sequence(if_else.then_branch, stats);
                if_else.else_branch = if_else
                    .else_branch
                    .map(|branch| optimize_sequence(branch, stats));
                match if_else.cond.const_truth() {
                    Some(true) => {
                        stats.folded += 1;
                        out.extend(if_else.then_branch.nodes);
                    }
                    Some(false) => {
                        stats.folded += 1;
                        if let Some(branch) = if_else.else_branch {
                            out.extend(branch.nodes);
                        }
                    }
                    None => out.push(Node::IfElse(if_else)),
                }
            }
            Node::Range(mut range) => {
                range.body = optimize_sequence(range.body, stats);
                out.push(Node::Range(range));
            }
            Node::With(mut with) => {
                with.body = optimize_sequence(with.body, stats);
                out.push(Node::With(with));
            }
            Node::Block(mut block) => {
                block.body = optimize_sequence(block.body, stats);
                out.push(Node::Block(block));
            }
            node @ (Node::Text(_) | Node::Expr(_)) => out.push(node),
        }
    }
    out
}

/// Concatenates maximal runs of adjacent text nodes.
fn merge_text(nodes: Vec<Node>, stats: &mut Stats) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Some(Node::Text(prev)), Node::Text(next)) = (out.last_mut(), &node) {
            stats.merged += 1;
            prev.text.push_str(&next.text);
            prev.span = prev.span.combine(next.span);
            continue;
        }
        out.push(node);
    }
    out
}

/// Removes text nodes that consist only of whitespace.
fn elide_whitespace(nodes: Vec<Node>, stats: &mut Stats) -> Vec<Node> {
    let before = nodes.len();
    let out: Vec<Node> = nodes
        .into_iter()
        .filter(|node| !matches!(node, Node::Text(Text { text, .. }) if is_whitespace(text)))
        .collect();
    stats.elided += before - out.len();
    out
}

fn is_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
