// src/comments/tree.rs

// Nested view over a post's flat comment list. Every walk below keeps its own
// work stack, so reply depth is bounded by memory and not by the call stack.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::comment::Comment;

/// One comment plus its replies, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    #[schema(no_recursion)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.comment.id
    }

    /// Number of nodes in this subtree, self included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&CommentNode> = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

impl Drop for CommentNode {
    // Unlinks descendants onto a heap stack so a long reply chain is freed
    // one node at a time.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

/// Ordered list of root comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentForest {
    roots: Vec<CommentNode>,
}

impl CommentForest {
    /// Builds the forest in O(n).
    ///
    /// Each comment lands in the replies of the comment named by its
    /// `parent_id`, or at the root when that id is absent or unknown. Input
    /// order is kept inside every bucket. If ids repeat, the last record
    /// with that id receives the replies.
    pub fn build(comments: Vec<Comment>) -> Self {
        let n = comments.len();

        let mut index: HashMap<i64, usize> = HashMap::with_capacity(n);
        for (i, comment) in comments.iter().enumerate() {
            index.insert(comment.id, i);
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut roots: Vec<usize> = Vec::new();
        for (i, comment) in comments.iter().enumerate() {
            match comment.parent_id.and_then(|pid| index.get(&pid).copied()) {
                Some(parent) if parent != i => children[parent].push(i),
                _ => roots.push(i),
            }
        }

        // Claim every record top-down. `order` lists each node after its
        // parent and `attached` keeps the replies each node actually got.
        let mut visited = vec![false; n];
        let mut attached: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut tops: Vec<usize> = Vec::with_capacity(roots.len());
        let mut claim = |start: usize, visited: &mut [bool]| {
            visited[start] = true;
            tops.push(start);
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                order.push(i);
                for &child in &children[i] {
                    if !visited[child] {
                        visited[child] = true;
                        attached[i].push(child);
                        stack.push(child);
                    }
                }
            }
        };

        for root in roots {
            claim(root, &mut visited);
        }

        // Whatever is still unclaimed sits on a parent cycle; surface it at
        // the root rather than losing it.
        for i in 0..n {
            if !visited[i] {
                tracing::warn!(
                    comment_id = comments[i].id,
                    "comment parent chain forms a cycle, demoting to root"
                );
                claim(i, &mut visited);
            }
        }

        // Assemble bottom-up so every reply is finished before its parent.
        let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
        let mut built: Vec<Option<CommentNode>> = (0..n).map(|_| None).collect();
        for &i in order.iter().rev() {
            if let Some(comment) = slots[i].take() {
                let mut node = CommentNode::new(comment);
                node.replies = attached[i]
                    .iter()
                    .filter_map(|&child| built[child].take())
                    .collect();
                built[i] = Some(node);
            }
        }

        Self {
            roots: tops.iter().filter_map(|&i| built[i].take()).collect(),
        }
    }

    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    pub fn into_roots(mut self) -> Vec<CommentNode> {
        std::mem::take(&mut self.roots)
    }

    /// Total node count across all levels.
    pub fn len(&self) -> usize {
        self.roots.iter().map(CommentNode::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first lookup.
    pub fn find(&self, id: i64) -> Option<&CommentNode> {
        let mut stack: Vec<&CommentNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.replies.iter().rev());
        }
        None
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut CommentNode> {
        let mut stack: Vec<&mut CommentNode> = self.roots.iter_mut().rev().collect();
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.replies.iter_mut().rev());
        }
        None
    }

    /// Pre-order walk yielding each comment with its depth (roots are 0).
    pub fn walk(&self) -> Vec<(usize, &Comment)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, &CommentNode)> =
            self.roots.iter().rev().map(|node| (0, node)).collect();
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, &node.comment));
            stack.extend(node.replies.iter().rev().map(|reply| (depth + 1, reply)));
        }
        out
    }

    /// Pre-order flattening back to the stored shape.
    pub fn flatten(&self) -> Vec<Comment> {
        self.walk()
            .into_iter()
            .map(|(_, comment)| comment.clone())
            .collect()
    }

    /// Orders every sibling list: pinned first, then oldest first.
    /// The sort is stable, so equal keys keep their current order.
    pub fn sort_for_display(&mut self) {
        let mut stack: Vec<&mut Vec<CommentNode>> = vec![&mut self.roots];
        while let Some(level) = stack.pop() {
            level.sort_by(|a, b| {
                b.comment
                    .is_pinned
                    .cmp(&a.comment.is_pinned)
                    .then(a.comment.created_at.cmp(&b.comment.created_at))
            });
            for node in level {
                stack.push(&mut node.replies);
            }
        }
    }

    /// Splices a freshly created comment into the forest.
    ///
    /// Root comments are appended to the root list. Replies are appended to
    /// the first node (depth-first) whose id matches `parent_id`. Returns
    /// `false` when that parent is not loaded, leaving the forest unchanged.
    pub fn insert(&mut self, comment: Comment) -> bool {
        match comment.parent_id {
            None => {
                self.roots.push(CommentNode::new(comment));
                true
            }
            Some(parent_id) => match self.find_mut(parent_id) {
                Some(parent) => {
                    parent.replies.push(CommentNode::new(comment));
                    true
                }
                None => {
                    tracing::debug!(
                        comment_id = comment.id,
                        parent_id,
                        "parent not loaded, reply not shown"
                    );
                    false
                }
            },
        }
    }

    /// Removes every node with this id at any depth. A removed node takes its
    /// replies with it. Returns how many nodes were cut (0 means no-op).
    pub fn remove(&mut self, id: i64) -> usize {
        self.cut(id, |_| {})
    }

    /// Like `remove`, but the direct replies of each removed node are
    /// promoted to the end of the root list instead of disappearing.
    pub fn remove_promoting(&mut self, id: i64) -> usize {
        let mut orphans = Vec::new();
        let removed = self.cut(id, |mut node: CommentNode| {
            orphans.extend(std::mem::take(&mut node.replies).into_iter().map(|mut reply| {
                reply.comment.parent_id = None;
                reply
            }));
        });
        self.roots.extend(orphans);
        removed
    }

    /// Swaps the record of an existing node (after an edit or a pin change),
    /// keeping its replies. Returns `false` when the id is not loaded.
    pub fn replace(&mut self, comment: Comment) -> bool {
        match self.find_mut(comment.id) {
            Some(node) => {
                node.comment = comment;
                true
            }
            None => false,
        }
    }

    /// Writes the nested JSON served by the tree endpoint: the same shape as
    /// the derived `Serialize`, produced without recursing per level.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = String::from("[");
        // Nodes whose `replies` array is still open.
        let mut open = 0usize;
        for (depth, comment) in self.walk() {
            let opened_as_reply = open > 0 && depth == open;
            while open > depth {
                out.push_str("]}");
                open -= 1;
            }
            if !opened_as_reply && out.len() > 1 {
                out.push(',');
            }
            let fields = serde_json::to_string(comment)?;
            out.push_str(fields.strip_suffix('}').unwrap_or(&fields));
            out.push_str(",\"replies\":[");
            open += 1;
        }
        for _ in 0..open {
            out.push_str("]}");
        }
        out.push(']');
        Ok(out)
    }

    fn cut(&mut self, id: i64, mut on_removed: impl FnMut(CommentNode)) -> usize {
        let mut removed = 0;
        let mut stack: Vec<&mut Vec<CommentNode>> = vec![&mut self.roots];
        while let Some(level) = stack.pop() {
            let (cut, kept): (Vec<CommentNode>, Vec<CommentNode>) = std::mem::take(level)
                .into_iter()
                .partition(|node| node.id() == id);
            *level = kept;
            removed += cut.len();
            cut.into_iter().for_each(&mut on_removed);
            for node in level {
                stack.push(&mut node.replies);
            }
        }
        removed
    }
}

impl PartialEq for CommentForest {
    fn eq(&self, other: &Self) -> bool {
        self.walk() == other.walk()
    }
}

impl Eq for CommentForest {}

impl From<Vec<Comment>> for CommentForest {
    fn from(comments: Vec<Comment>) -> Self {
        Self::build(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{comment::CommentAuthor, user::Role};
    use chrono::{Duration, TimeZone, Utc};

    fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(id);
        Comment {
            id,
            post_id: 1,
            text: format!("comment {}", id),
            is_pinned: false,
            parent_id,
            author: CommentAuthor {
                id: 10,
                name: "Ana".to_string(),
                image: None,
                role: Role::User,
            },
            created_at: at,
            updated_at: at,
        }
    }

    /// Renders a forest as nested ids, e.g. `[1[2], 3]`.
    fn shape(forest: &CommentForest) -> String {
        fn level(nodes: &[CommentNode]) -> String {
            let parts: Vec<String> = nodes
                .iter()
                .map(|n| {
                    if n.replies.is_empty() {
                        n.id().to_string()
                    } else {
                        format!("{}{}", n.id(), level(&n.replies))
                    }
                })
                .collect();
            format!("[{}]", parts.join(", "))
        }
        level(forest.roots())
    }

    fn sample() -> CommentForest {
        CommentForest::build(vec![comment(1, None), comment(2, Some(1)), comment(3, None)])
    }

    #[test]
    fn builds_nested_forest_from_flat_list() {
        assert_eq!(shape(&sample()), "[1[2], 3]");
    }

    #[test]
    fn reply_listed_before_its_parent_still_nests() {
        let forest = CommentForest::build(vec![
            comment(5, Some(4)),
            comment(4, Some(1)),
            comment(1, None),
        ]);
        assert_eq!(shape(&forest), "[1[4[5]]]");
    }

    #[test]
    fn unresolved_parent_is_promoted_to_root() {
        let forest = CommentForest::build(vec![comment(1, None), comment(7, Some(99))]);
        assert_eq!(shape(&forest), "[1, 7]");
        assert_eq!(forest.len(), 2);
    }

    #[test]
    fn parent_cycle_does_not_drop_comments() {
        let forest = CommentForest::build(vec![
            comment(1, Some(2)),
            comment(2, Some(1)),
            comment(3, Some(3)),
        ]);
        assert_eq!(forest.len(), 3);
        assert_eq!(shape(&forest), "[3, 1[2]]");
    }

    #[test]
    fn every_comment_appears_exactly_once() {
        let input = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, Some(1)),
            comment(5, None),
            comment(6, Some(42)),
        ];
        let forest = CommentForest::build(input.clone());
        let mut ids: Vec<i64> = forest.flatten().iter().map(|c| c.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

        for node in forest.roots() {
            for reply in &node.replies {
                assert_eq!(reply.comment.parent_id, Some(node.id()));
            }
        }
    }

    #[test]
    fn rebuilding_from_flattened_forest_is_stable() {
        let forest = CommentForest::build(vec![
            comment(3, Some(1)),
            comment(1, None),
            comment(2, Some(1)),
            comment(4, Some(3)),
        ]);
        let mut reversed = forest.flatten();
        reversed.reverse();
        let mut rebuilt = CommentForest::build(reversed);

        let mut original = forest.clone();
        original.sort_for_display();
        rebuilt.sort_for_display();
        assert_eq!(original, rebuilt);
    }

    #[test]
    fn insert_reply_under_loaded_parent() {
        let mut forest = sample();
        assert!(forest.insert(comment(4, Some(3))));
        assert_eq!(shape(&forest), "[1[2], 3[4]]");
    }

    #[test]
    fn insert_reply_at_depth() {
        let mut forest = sample();
        assert!(forest.insert(comment(8, Some(2))));
        assert_eq!(shape(&forest), "[1[2[8]], 3]");
    }

    #[test]
    fn insert_root_appends_without_touching_others() {
        let mut forest = sample();
        let before = forest.roots().to_vec();
        assert!(forest.insert(comment(9, None)));
        assert_eq!(&forest.roots()[..2], &before[..]);
        assert_eq!(shape(&forest), "[1[2], 3, 9]");
    }

    #[test]
    fn insert_with_missing_parent_is_noop() {
        let mut forest = sample();
        let before = forest.clone();
        assert!(!forest.insert(comment(9, Some(77))));
        assert_eq!(forest, before);
    }

    #[test]
    fn inserting_same_id_twice_keeps_both() {
        let mut forest = sample();
        forest.insert(comment(4, Some(3)));
        forest.insert(comment(4, Some(3)));
        assert_eq!(shape(&forest), "[1[2], 3[4, 4]]");
    }

    #[test]
    fn remove_root_takes_replies_along() {
        let mut forest = sample();
        assert_eq!(forest.remove(1), 1);
        assert_eq!(shape(&forest), "[3]");
        assert!(forest.find(2).is_none());
    }

    #[test]
    fn remove_nested_node() {
        let mut forest = CommentForest::build(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, Some(1)),
        ]);
        assert_eq!(forest.remove(3), 1);
        assert_eq!(shape(&forest), "[1[2, 4]]");
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let mut forest = sample();
        let before = forest.clone();
        assert_eq!(forest.remove(404), 0);
        assert_eq!(forest, before);
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn remove_promoting_moves_replies_to_root() {
        let mut forest = CommentForest::build(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(5, Some(2)),
            comment(3, None),
        ]);
        assert_eq!(forest.remove_promoting(1), 1);
        assert_eq!(shape(&forest), "[3, 2[5]]");
        assert_eq!(forest.find(2).map(|n| n.comment.parent_id), Some(None));
    }

    #[test]
    fn replace_keeps_replies() {
        let mut forest = sample();
        let mut edited = comment(1, None);
        edited.text = "edited".to_string();
        assert!(forest.replace(edited));
        let node = forest.find(1).unwrap();
        assert_eq!(node.comment.text, "edited");
        assert_eq!(node.replies.len(), 1);
        assert!(!forest.replace(comment(50, None)));
    }

    #[test]
    fn display_order_is_pinned_then_chronological() {
        let mut pinned = comment(5, None);
        pinned.is_pinned = true;
        let mut late_reply = comment(9, Some(1));
        late_reply.is_pinned = true;
        let mut forest = CommentForest::build(vec![
            comment(3, None),
            comment(1, None),
            pinned,
            comment(4, Some(1)),
            late_reply,
            comment(2, Some(1)),
        ]);
        forest.sort_for_display();
        assert_eq!(shape(&forest), "[5, 1[9, 2, 4], 3]");
    }

    #[test]
    fn serializes_as_array_with_inline_replies() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["replies"][0]["id"], 2);
        assert_eq!(value[0]["author"]["role"], "user");
    }

    #[test]
    fn json_writer_matches_derived_shape() {
        let mut forest = CommentForest::build(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, Some(1)),
            comment(5, None),
        ]);
        let written: serde_json::Value = serde_json::from_str(&forest.to_json().unwrap()).unwrap();
        assert_eq!(written, serde_json::to_value(&forest).unwrap());

        forest.remove(1);
        forest.remove(5);
        assert_eq!(forest.to_json().unwrap(), "[]");
    }

    #[test]
    fn deep_reply_chain_is_handled_without_recursion() {
        const DEPTH: i64 = 10_000;
        let mut chain: Vec<Comment> = (1..=DEPTH)
            .map(|id| comment(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();
        chain.reverse();

        let mut forest = CommentForest::build(chain);
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.len(), DEPTH as usize);
        forest.sort_for_display();

        let deepest = forest.find(DEPTH).unwrap();
        assert!(deepest.replies.is_empty());
        assert_eq!(deepest.comment.parent_id, Some(DEPTH - 1));

        assert!(forest.insert(comment(DEPTH + 1, Some(DEPTH))));
        assert_eq!(forest.len(), DEPTH as usize + 1);
        assert_eq!(
            forest.walk().last().map(|(depth, c)| (*depth, c.id)),
            Some((DEPTH as usize, DEPTH + 1))
        );

        let mut edited = comment(DEPTH / 2, Some(DEPTH / 2 - 1));
        edited.text = "edited".to_string();
        assert!(forest.replace(edited));

        let json = forest.to_json().unwrap();
        assert!(json.starts_with("[{"));
        assert!(json.ends_with(&format!("{}]", "]}".repeat(DEPTH as usize + 1))));

        assert_eq!(forest.remove_promoting(DEPTH - 1), 1);
        assert_eq!(forest.roots().len(), 2);
        assert_eq!(forest.roots()[1].id(), DEPTH);
        assert_eq!(forest.roots()[1].replies[0].id(), DEPTH + 1);

        assert_eq!(forest.remove(DEPTH / 2), 1);
        assert_eq!(forest.len(), (DEPTH / 2 - 1) as usize + 2);
        assert!(forest.find(DEPTH / 2 + 1).is_none());

        assert_eq!(forest.remove(1), 1);
        assert_eq!(shape(&forest), format!("[{}[{}]]", DEPTH, DEPTH + 1));
    }
}
