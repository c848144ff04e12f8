//! Deterministic id assignment for template elements.
//!
//! Synthesized ids look like `fmo-{tag}-{n}` where `n` is a 1-based counter scoped to the
//! node's depth level and tag name. The generator is seeded with every id literally present in
//! the source markup (full-text scan, not tree-aware) so synthesized ids never collide with
//! pre-existing ones; residual collisions get a `:{k}` suffix.

use super::ElementNode;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn re_id_attr() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r#"\bid\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    /// One tag→count map per depth level. Levels persist across sibling subtrees so every node
    /// at the same depth shares the same counter for its tag.
    counters: Vec<HashMap<String, usize>>,
    depth: usize,
    seen: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            counters: vec![HashMap::new()],
            depth: 0,
            seen: HashSet::new(),
        }
    }

    /// Seeds the collision set with every id attribute found anywhere in the markup.
    pub fn seed_from_markup(&mut self, markup: &str) {
        for caps in re_id_attr().captures_iter(markup) {
            let id = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if !id.is_empty() {
                self.seen.insert(id.to_string());
            }
        }
    }

    /// Records an id so later synthesized ids cannot collide with it.
    pub fn record(&mut self, id: impl Into<String>) {
        self.seen.insert(id.into());
    }

    pub fn enter_depth(&mut self) {
        self.depth += 1;
        if self.counters.len() <= self.depth {
            self.counters.push(HashMap::new());
        }
    }

    pub fn exit_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Clears the per-depth counters while preserving the seeded collision set.
    pub fn reset(&mut self) {
        self.counters = vec![HashMap::new()];
        self.depth = 0;
    }

    /// Returns the next synthesized id for `tag` at the current depth, unique within this
    /// assignment session.
    pub fn next(&mut self, tag: &str) -> String {
        let count = self.counters[self.depth]
            .entry(tag.to_string())
            .or_insert(0);
        *count += 1;
        let base = format!("fmo-{tag}-{count}");

        let mut id = base;
        if self.seen.contains(&id) {
            let mut k = 1usize;
            loop {
                let candidate = format!("{id}:{k}");
                if !self.seen.contains(&candidate) {
                    id = candidate;
                    break;
                }
                k += 1;
            }
        }
        self.seen.insert(id.clone());
        id
    }
}

/// Gives every node a non-empty working id: the markup-supplied one when present, a synthesized
/// one otherwise.
pub fn assign_ids(node: &mut ElementNode, ids: &mut IdGenerator) {
    match &node.original_id {
        Some(original) => {
            node.id = original.clone();
            ids.record(original.clone());
        }
        None => {
            node.id = ids.next(&node.tag);
        }
    }

    ids.enter_depth();
    for child in &mut node.children {
        assign_ids(child, ids);
    }
    ids.exit_depth();
}
