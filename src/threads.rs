//! Reply threading for maintenance comments and inquiry answers.
//!
//! Comments arrive as a flat list with an optional parent reference. The tree is
//! built in two passes over an id index, so construction stays linear in the
//! number of comments.

use std::collections::HashMap;

use hcms_api::models::{InquiryAnswer, MaintenanceComment};
use serde::{Deserialize, Serialize};

/// Pixels of indentation added per reply level.
pub const INDENT_STEP_PX: u32 = 20;
/// Indentation stops growing past this width.
pub const MAX_INDENT_PX: u32 = 80;

/// Anything that can take part in a reply thread.
pub trait Threaded {
    fn thread_id(&self) -> i64;
    fn thread_parent(&self) -> Option<i64>;
    fn thread_author(&self) -> &str;
}

impl Threaded for MaintenanceComment {
    fn thread_id(&self) -> i64 {
        self.id
    }

    fn thread_parent(&self) -> Option<i64> {
        self.parent_id
    }

    fn thread_author(&self) -> &str {
        &self.author
    }
}

impl Threaded for InquiryAnswer {
    fn thread_id(&self) -> i64 {
        self.id
    }

    fn thread_parent(&self) -> Option<i64> {
        self.parent_answer_id
    }

    fn thread_author(&self) -> &str {
        &self.author
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadNode<T> {
    pub item: T,
    pub replies: Vec<ThreadNode<T>>,
}

impl<T> ThreadNode<T> {
    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(ThreadNode::size).sum::<usize>()
    }
}

/// Builds a reply forest from a flat list.
///
/// Roots and siblings keep their input order. A parent reference that does not
/// resolve within `items` (or points at the item itself) makes the item a root.
/// Items caught in a parent cycle are unreachable from any root; the earliest
/// such item is promoted to a root so that every input item appears exactly once.
pub fn build_comment_tree<T: Threaded>(items: Vec<T>) -> Vec<ThreadNode<T>> {
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        index.entry(item.thread_id()).or_insert(position);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut is_root = vec![false; items.len()];
    for (position, item) in items.iter().enumerate() {
        let parent = item
            .thread_parent()
            .and_then(|parent_id| index.get(&parent_id).copied())
            .filter(|parent| *parent != position);
        match parent {
            Some(parent) => children[parent].push(position),
            None => is_root[position] = true,
        }
    }

    let mut reached = vec![false; items.len()];
    for position in 0..items.len() {
        if is_root[position] {
            mark_reachable(position, &children, &mut reached);
        }
    }
    for position in 0..items.len() {
        if !reached[position] {
            is_root[position] = true;
            mark_reachable(position, &children, &mut reached);
        }
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut roots = Vec::new();
    for position in 0..slots.len() {
        if is_root[position] {
            if let Some(node) = assemble(position, &children, &mut slots) {
                roots.push(node);
            }
        }
    }
    roots
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(position) = stack.pop() {
        if reached[position] {
            continue;
        }
        reached[position] = true;
        stack.extend(children[position].iter().copied());
    }
}

fn assemble<T>(position: usize, children: &[Vec<usize>], slots: &mut [Option<T>]) -> Option<ThreadNode<T>> {
    let item = slots[position].take()?;
    let replies = children[position]
        .iter()
        .filter_map(|child| assemble(*child, children, slots))
        .collect();
    Some(ThreadNode { item, replies })
}

pub fn indent_px(depth: usize) -> u32 {
    let depth = u32::try_from(depth).unwrap_or(u32::MAX);
    depth.saturating_mul(INDENT_STEP_PX).min(MAX_INDENT_PX)
}

/// One rendered line of a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadRow<'a, T> {
    pub item: &'a T,
    pub depth: usize,
    pub indent_px: u32,
}

/// Depth-first rows in display order.
pub fn flatten_thread<T>(roots: &[ThreadNode<T>]) -> Vec<ThreadRow<'_, T>> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&ThreadNode<T>, usize)> = roots.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        rows.push(ThreadRow {
            item: &node.item,
            depth,
            indent_px: indent_px(depth),
        });
        stack.extend(node.replies.iter().rev().map(|reply| (reply, depth + 1)));
    }
    rows
}

/// Thread a reply belongs to. A target only applies to submissions on the
/// same maintenance request or inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReplyScope {
    Maintenance(i64),
    Inquiry(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub scope: ReplyScope,
    pub id: i64,
    pub author: String,
}

/// "Replying to" state of a comment form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyContext {
    target: Option<ReplyTarget>,
}

impl ReplyContext {
    pub fn reply_to<T: Threaded>(&mut self, scope: ReplyScope, item: &T) {
        self.set_target(ReplyTarget {
            scope,
            id: item.thread_id(),
            author: item.thread_author().to_string(),
        });
    }

    /// Same as [`ReplyContext::reply_to`] for a row the webview already rendered.
    pub fn set_target(&mut self, target: ReplyTarget) {
        self.target = Some(target);
    }

    pub fn cancel(&mut self) {
        self.target = None;
    }

    pub fn target(&self) -> Option<&ReplyTarget> {
        self.target.as_ref()
    }

    /// Drops a target picked on another thread.
    pub fn retain_scope(&mut self, scope: ReplyScope) {
        if self.target.as_ref().is_some_and(|target| target.scope != scope) {
            self.target = None;
        }
    }

    /// Parent id to attach to the next comment submitted on `scope`.
    pub fn parent_id_for(&self, scope: ReplyScope) -> Option<i64> {
        self.target
            .as_ref()
            .filter(|target| target.scope == scope)
            .map(|target| target.id)
    }

    /// Clears the context once a reply has been accepted by the backend.
    pub fn complete(&mut self) {
        self.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: i64,
        parent: Option<i64>,
    }

    impl Threaded for Note {
        fn thread_id(&self) -> i64 {
            self.id
        }

        fn thread_parent(&self) -> Option<i64> {
            self.parent
        }

        fn thread_author(&self) -> &str {
            "tester"
        }
    }

    fn note(id: i64, parent: Option<i64>) -> Note {
        Note { id, parent }
    }

    fn ids<T: Threaded>(nodes: &[ThreadNode<T>]) -> Vec<i64> {
        nodes.iter().map(|node| node.item.thread_id()).collect()
    }

    fn total(nodes: &[ThreadNode<Note>]) -> usize {
        nodes.iter().map(ThreadNode::size).sum()
    }

    #[test]
    fn nests_replies_under_their_parents() {
        let tree = build_comment_tree(vec![
            note(1, None),
            note(2, Some(1)),
            note(3, Some(1)),
            note(4, Some(2)),
        ]);

        assert_eq!(ids(&tree), vec![1]);
        assert_eq!(ids(&tree[0].replies), vec![2, 3]);
        assert_eq!(ids(&tree[0].replies[0].replies), vec![4]);
        assert!(tree[0].replies[1].replies.is_empty());
    }

    #[test]
    fn reply_listed_before_parent_still_nests() {
        let tree = build_comment_tree(vec![note(5, Some(9)), note(9, None)]);
        assert_eq!(ids(&tree), vec![9]);
        assert_eq!(ids(&tree[0].replies), vec![5]);
    }

    #[test]
    fn orphans_become_roots_in_encounter_order() {
        let tree = build_comment_tree(vec![note(1, None), note(2, Some(42)), note(3, None)]);
        assert_eq!(ids(&tree), vec![1, 2, 3]);
        assert_eq!(total(&tree), 3);
    }

    #[test]
    fn self_parent_and_cycles_keep_every_node() {
        let tree = build_comment_tree(vec![
            note(1, Some(1)),
            note(2, Some(3)),
            note(3, Some(2)),
            note(4, Some(3)),
        ]);

        assert_eq!(total(&tree), 4);
        assert_eq!(ids(&tree), vec![1, 2]);
        assert_eq!(ids(&tree[1].replies), vec![3]);
        assert_eq!(ids(&tree[1].replies[0].replies), vec![4]);
    }

    #[test]
    fn sibling_order_is_stable_across_depths() {
        let input = vec![
            note(10, None),
            note(11, Some(10)),
            note(12, Some(10)),
            note(13, Some(11)),
            note(14, Some(10)),
            note(15, Some(11)),
        ];
        let tree = build_comment_tree(input);
        assert_eq!(ids(&tree[0].replies), vec![11, 12, 14]);
        assert_eq!(ids(&tree[0].replies[0].replies), vec![13, 15]);
    }

    #[test]
    fn rows_are_depth_first_with_capped_indent() {
        let tree = build_comment_tree(vec![
            note(1, None),
            note(2, Some(1)),
            note(3, Some(2)),
            note(4, Some(3)),
            note(5, Some(4)),
            note(6, Some(5)),
            note(7, None),
        ]);
        let rows = flatten_thread(&tree);
        let order: Vec<i64> = rows.iter().map(|row| row.item.id).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6, 7]);

        let indents: Vec<u32> = rows.iter().map(|row| row.indent_px).collect();
        assert_eq!(indents, vec![0, 20, 40, 60, 80, 80, 0]);
        assert_eq!(rows[5].depth, 5);
    }

    #[test]
    fn reply_context_tracks_target_until_completed() {
        let scope = ReplyScope::Maintenance(3);
        let mut context = ReplyContext::default();
        assert_eq!(context.parent_id_for(scope), None);

        context.reply_to(scope, &note(7, None));
        assert_eq!(context.parent_id_for(scope), Some(7));
        assert_eq!(context.target().map(|target| target.author.as_str()), Some("tester"));

        context.complete();
        assert_eq!(context.target(), None);
    }

    #[test]
    fn reply_target_does_not_leak_into_other_threads() {
        let mut context = ReplyContext::default();
        context.reply_to(ReplyScope::Maintenance(5), &note(11, None));

        assert_eq!(context.parent_id_for(ReplyScope::Maintenance(9)), None);
        assert_eq!(context.parent_id_for(ReplyScope::Inquiry(5)), None);

        context.retain_scope(ReplyScope::Maintenance(5));
        assert!(context.target().is_some());

        context.retain_scope(ReplyScope::Inquiry(42));
        assert_eq!(context.target(), None);
    }

    #[test]
    fn reply_scope_serializes_with_kind_and_id() {
        let value = serde_json::to_value(ReplyScope::Inquiry(42)).expect("serialize scope");
        assert_eq!(value, serde_json::json!({ "kind": "inquiry", "id": 42 }));
    }
}
