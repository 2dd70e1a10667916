//! Flag trees: filters, sibling convolution and boolean combination.

use super::analyzer::Analyzer;
use super::node::{Node, NodeKind};
use crate::error::{BraidError, Result};
use crate::schema::{hash_str, ParamQuery, Template};
use crate::types::ParameterKey;
use std::ops::BitOr;

/// Per-node mark of a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Node is excluded.
    Disabled,
    /// Node is included.
    Enabled,
}

impl Flag {
    /// Whether the node is included.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, Flag::Enabled)
    }
}

/// Pre-visit verdict of a filter's action callback, combinable as
/// bit-flags.
///
/// [`Action::APPLY`] runs the filter predicate on the node;
/// [`Action::TERMINATE`] prunes the subtree below it. The empty
/// combination ([`Action::SKIP`]) recurses without running the
/// predicate. The default action of every filter applies the predicate
/// to enabled nodes and terminates at disabled ones, so a disabled
/// ancestor excludes its whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action(u8);

impl Action {
    /// Recurse without running the predicate.
    pub const SKIP: Action = Action(0);
    /// Run the predicate on this node.
    pub const APPLY: Action = Action(1);
    /// Prune the subtree below this node.
    pub const TERMINATE: Action = Action(2);

    /// Whether the predicate runs on this node.
    #[must_use]
    pub fn applies(self) -> bool {
        self.0 & Action::APPLY.0 != 0
    }

    /// Whether the subtree below this node is pruned.
    #[must_use]
    pub fn terminates(self) -> bool {
        self.0 & Action::TERMINATE.0 != 0
    }
}

impl BitOr for Action {
    type Output = Action;

    fn bitor(self, rhs: Action) -> Action {
        Action(self.0 | rhs.0)
    }
}

fn default_action(_node: &Node, flag: Flag) -> Action {
    if flag.is_enabled() {
        Action::APPLY
    } else {
        Action::TERMINATE
    }
}

/// Iterative depth-first walk over the node array using parent
/// back-edges; terminates by stepping off the root. At each pre-visit
/// the action decides whether `visit` runs and whether to descend.
fn traverse<A, V>(nodes: &[Node], flags: &mut [Flag], mut action: A, mut visit: V)
where
    A: FnMut(&Node, Flag) -> Action,
    V: FnMut(Flag, &Node) -> Flag,
{
    let mut active = 0usize;
    let mut returned: Option<usize> = None;

    loop {
        let node = &nodes[active];

        // Came back from a child: step to the next sibling, or upward.
        if let Some(prev) = returned {
            let Some(first) = node.first_child else { break };
            let next = prev - first + 1;
            if next < node.child_count {
                active = first + next;
                returned = None;
                continue;
            }
            returned = Some(active);
            match node.parent {
                Some(parent) => active = parent,
                None => break,
            }
            continue;
        }

        let flag = flags[active];
        let act = action(node, flag);
        if act.applies() {
            flags[active] = visit(flag, node);
        }

        if !act.terminates() && node.child_count > 0 {
            if let Some(first) = node.first_child {
                active = first;
                returned = None;
                continue;
            }
        }

        returned = Some(active);
        match node.parent {
            Some(parent) => active = parent,
            None => break,
        }
    }
}

/// Sibling-window pass over every enabled stream/region parent.
///
/// `window` sees the parent, the child index, the first-child index, the
/// old flag vector and the parent's scratch copy; writes go to the
/// scratch so no decision feeds back into the same window pass.
fn convolution<F>(nodes: &[Node], flags: &mut [Flag], mut window: F)
where
    F: FnMut(&Node, usize, usize, &[Flag], &mut [Flag]),
{
    let mut active = 0usize;
    let mut returned: Option<usize> = None;
    let mut scratch: Vec<Flag> = Vec::new();

    loop {
        let node = &nodes[active];

        // Came back from a child: step to the next stream/region
        // sibling, or upward.
        if let Some(prev) = returned {
            let Some(first) = node.first_child else { break };
            let mut next = prev - first + 1;
            while next < node.child_count && !nodes[first + next].is_group() {
                next += 1;
            }
            if next < node.child_count {
                active = first + next;
                returned = None;
                continue;
            }
            returned = Some(active);
            match node.parent {
                Some(parent) => active = parent,
                None => break,
            }
            continue;
        }

        // A disabled parent skips its whole subtree.
        if !flags[active].is_enabled() {
            returned = Some(active);
            match node.parent {
                Some(parent) => active = parent,
                None => break,
            }
            continue;
        }

        if node.is_group() && node.child_count > 0 {
            if let Some(first) = node.first_child {
                let count = node.child_count;
                scratch.clear();
                scratch.extend_from_slice(&flags[first..first + count]);
                for i in 0..count {
                    window(node, i, first, flags, &mut scratch);
                }
                flags[first..first + count].copy_from_slice(&scratch);
            }
        }

        if node.child_count > 0 {
            if let Some(first) = node.first_child {
                active = first;
                returned = None;
                continue;
            }
        }

        returned = Some(active);
        match node.parent {
            Some(parent) => active = parent,
            None => break,
        }
    }
}

fn params_match(query: &[ParameterKey], actual: &[ParameterKey]) -> bool {
    query.len() == actual.len()
        && query
            .iter()
            .zip(actual)
            .all(|(q, a)| q.is_wildcard() || q == a)
}

/// A selection over an analyzer's node tree.
///
/// Holds one flag per node, all initialized to [`Flag::Enabled`].
/// Filters refine the selection, [`Tree::expand`]/[`Tree::reduce`] apply
/// morphological passes over sibling windows, and two trees of the same
/// analyzer combine with [`Tree::union`]/[`Tree::intersect`]. None of
/// these operations changes the tree's shape, only the flags.
pub struct Tree<'a> {
    analyzer: &'a Analyzer,
    flags: Vec<Flag>,
}

impl<'a> Tree<'a> {
    /// Create a tree with every node enabled.
    #[must_use]
    pub fn new(analyzer: &'a Analyzer) -> Self {
        Self {
            analyzer,
            flags: vec![Flag::Enabled; analyzer.nodes().len()],
        }
    }

    /// The flag vector, parallel to the analyzer's node array.
    #[must_use]
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// The analyzer this tree selects over.
    #[must_use]
    pub fn analyzer(&self) -> &'a Analyzer {
        self.analyzer
    }

    /// Apply `f` to every stream node. `f` receives the old flag, the
    /// node and the stream index.
    pub fn filter_stream<F>(&mut self, mut f: F)
    where
        F: FnMut(Flag, &Node, usize) -> Flag,
    {
        let nodes = self.analyzer.nodes();
        let root = &nodes[0];
        let Some(first) = root.first_child else { return };
        for i in 0..root.child_count {
            self.flags[first + i] = f(self.flags[first + i], &nodes[first + i], i);
        }
    }

    /// Apply `f` to the category of every reachable message node.
    pub fn filter_category<F>(&mut self, f: F)
    where
        F: FnMut(Flag, u32) -> Flag,
    {
        self.filter_category_with(f, default_action);
    }

    /// [`Tree::filter_category`] with an explicit pre-visit action.
    pub fn filter_category_with<F, A>(&mut self, mut f: F, action: A)
    where
        F: FnMut(Flag, u32) -> Flag,
        A: FnMut(&Node, Flag) -> Action,
    {
        let analyzer = self.analyzer;
        traverse(analyzer.nodes(), &mut self.flags, action, |flag, node| {
            if node.kind != NodeKind::Message {
                return flag;
            }
            match node.format.and_then(|key| analyzer.format(key)) {
                Some(info) => f(flag, info.descriptor.category),
                None => flag,
            }
        });
    }

    /// Apply `f` to every reachable region node.
    pub fn filter_region<F>(&mut self, f: F)
    where
        F: FnMut(Flag, &Node) -> Flag,
    {
        self.filter_region_with(f, default_action);
    }

    /// [`Tree::filter_region`] with an explicit pre-visit action.
    pub fn filter_region_with<F, A>(&mut self, mut f: F, action: A)
    where
        F: FnMut(Flag, &Node) -> Flag,
        A: FnMut(&Node, Flag) -> Action,
    {
        traverse(self.analyzer.nodes(), &mut self.flags, action, |flag, node| {
            if node.kind == NodeKind::Region {
                f(flag, node)
            } else {
                flag
            }
        });
    }

    /// Apply `f` to every reachable message node whose descriptor
    /// matches the template `T` (by text hash and category) and the
    /// query `Q` parameter-type list, where [`Any`](crate::schema::Any)
    /// positions match every type. A query of different arity matches
    /// nothing.
    pub fn filter_message<T, Q, F>(&mut self, f: F)
    where
        T: Template,
        Q: ParamQuery,
        F: FnMut(Flag, &Node) -> Flag,
    {
        self.filter_message_with::<T, Q, F, _>(f, default_action);
    }

    /// [`Tree::filter_message`] with an explicit pre-visit action.
    pub fn filter_message_with<T, Q, F, A>(&mut self, mut f: F, action: A)
    where
        T: Template,
        Q: ParamQuery,
        F: FnMut(Flag, &Node) -> Flag,
        A: FnMut(&Node, Flag) -> Action,
    {
        let message_hash = hash_str(T::MESSAGE);
        let analyzer = self.analyzer;
        traverse(analyzer.nodes(), &mut self.flags, action, |flag, node| {
            if node.kind != NodeKind::Message {
                return flag;
            }
            let Some(info) = node.format.and_then(|key| analyzer.format(key)) else {
                return flag;
            };
            if info.message_hash == message_hash
                && info.descriptor.category == T::CATEGORY
                && params_match(Q::KEYS, &info.descriptor.parameters)
            {
                f(flag, node)
            } else {
                flag
            }
        });
    }

    /// Enable every disabled node with an enabled sibling within
    /// `left`/`right` positions. Stream nodes themselves are untouched;
    /// disabled parents are skipped entirely.
    pub fn expand(&mut self, left: u32, right: u32) {
        convolution(
            self.analyzer.nodes(),
            &mut self.flags,
            |parent, i, first, old, new| {
                if new[i].is_enabled() {
                    return;
                }
                let lo = i.saturating_sub(left as usize);
                let hi = (i + right as usize).min(parent.child_count - 1);
                for j in lo..=hi {
                    if old[first + j].is_enabled() {
                        new[i] = Flag::Enabled;
                        break;
                    }
                }
            },
        );
    }

    /// Disable every enabled node whose sibling window of `left`/`right`
    /// positions contains no other enabled node, thinning out isolated
    /// marks. `reduce(0, 0)` is the identity. Stream nodes themselves
    /// are untouched; disabled parents are skipped entirely.
    pub fn reduce(&mut self, left: u32, right: u32) {
        convolution(
            self.analyzer.nodes(),
            &mut self.flags,
            |parent, i, first, old, new| {
                if !new[i].is_enabled() {
                    return;
                }
                let lo = i.saturating_sub(left as usize);
                let hi = (i + right as usize).min(parent.child_count - 1);
                let mut has_sibling = false;
                let mut supported = false;
                for j in lo..=hi {
                    if j == i {
                        continue;
                    }
                    has_sibling = true;
                    if old[first + j].is_enabled() {
                        supported = true;
                        break;
                    }
                }
                if has_sibling && !supported {
                    new[i] = Flag::Disabled;
                }
            },
        );
    }

    /// Enable every node enabled in either tree.
    ///
    /// Fails with [`BraidError::ForeignTree`] unless both trees derive
    /// from the same analyzer.
    pub fn union(&mut self, rhs: &Tree<'_>) -> Result<()> {
        self.check_same(rhs)?;
        for (flag, other) in self.flags.iter_mut().zip(&rhs.flags) {
            if other.is_enabled() {
                *flag = Flag::Enabled;
            }
        }
        Ok(())
    }

    /// Keep enabled only the nodes enabled in both trees.
    ///
    /// Fails with [`BraidError::ForeignTree`] unless both trees derive
    /// from the same analyzer.
    pub fn intersect(&mut self, rhs: &Tree<'_>) -> Result<()> {
        self.check_same(rhs)?;
        for (flag, other) in self.flags.iter_mut().zip(&rhs.flags) {
            if !other.is_enabled() {
                *flag = Flag::Disabled;
            }
        }
        Ok(())
    }

    fn check_same(&self, rhs: &Tree<'_>) -> Result<()> {
        if std::ptr::eq(self.analyzer, rhs.analyzer) {
            Ok(())
        } else {
            Err(BraidError::ForeignTree)
        }
    }
}
