use log::debug;

use crate::model::{Comment, Thread};

/// How an adapter laid out a comment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentLayout {
    /// Every comment appears once in preorder; nesting is implied by `depth`.
    Flat,
    /// Replies already live in `children`.
    Nested,
}

impl CommentLayout {
    pub fn detect(comments: &[Comment]) -> Self {
        if comments.iter().any(|comment| !comment.children.is_empty()) {
            CommentLayout::Nested
        } else {
            CommentLayout::Flat
        }
    }
}

/// Turns a flat depth-annotated sequence into a tree of `children`.
///
/// Nested input is returned unchanged. For flat input each comment adopts the
/// contiguous run of following comments that are deeper than it; depth gaps
/// are accepted as-is and depths are never renumbered.
pub fn reconcile(comments: Vec<Comment>) -> Vec<Comment> {
    match CommentLayout::detect(&comments) {
        CommentLayout::Nested => {
            debug!("reconcile: {} root comments already nested", comments.len());
            comments
        }
        CommentLayout::Flat => {
            debug!("reconcile: nesting {} flat comments", comments.len());
            nest(comments)
        }
    }
}

pub fn reconcile_thread(mut thread: Thread) -> Thread {
    thread.comments = reconcile(std::mem::take(&mut thread.comments));
    thread
}

fn nest(flat: Vec<Comment>) -> Vec<Comment> {
    let runs = sibling_runs(&flat);
    let mut rest = flat.into_iter();
    let mut siblings = Vec::with_capacity(runs.len());
    for len in runs {
        let Some(mut head) = rest.next() else {
            break;
        };
        let descendants: Vec<Comment> = rest.by_ref().take(len - 1).collect();
        head.children = nest(descendants);
        siblings.push(head);
    }
    siblings
}

/// Lengths of the consecutive runs in `items`, each a head comment followed by
/// everything deeper than it.
fn sibling_runs(items: &[Comment]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start < items.len() {
        let head = items[start].depth;
        let descendants = items[start + 1..]
            .iter()
            .take_while(|comment| comment.depth > head)
            .count();
        runs.push(descendants + 1);
        start += descendants + 1;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(rows: &[(&str, usize)]) -> Vec<Comment> {
        rows.iter()
            .map(|(id, depth)| Comment {
                id: (*id).into(),
                author: format!("user{id}"),
                content: format!("<p>comment {id}</p>"),
                depth: *depth,
                ..Comment::default()
            })
            .collect()
    }

    fn ids(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|comment| comment.id.as_str()).collect()
    }

    #[test]
    fn nests_flat_sequence_by_depth() {
        let tree = reconcile(flat(&[("1", 0), ("2", 1), ("3", 2), ("4", 1), ("5", 0)]));
        assert_eq!(ids(&tree), ["1", "5"]);
        assert_eq!(ids(&tree[0].children), ["2", "4"]);
        assert_eq!(ids(&tree[0].children[0].children), ["3"]);
        assert!(tree[0].children[1].children.is_empty());
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn depth_gap_attaches_to_previous_shallower_comment() {
        let tree = reconcile(flat(&[("1", 0), ("2", 2)]));
        assert_eq!(ids(&tree), ["1"]);
        assert_eq!(ids(&tree[0].children), ["2"]);
        assert_eq!(tree[0].children[0].depth, 2);
    }

    #[test]
    fn gap_followed_by_normal_reply_keeps_both() {
        let tree = reconcile(flat(&[("1", 0), ("2", 2), ("3", 1), ("4", 2)]));
        assert_eq!(ids(&tree), ["1"]);
        assert_eq!(ids(&tree[0].children), ["2", "3"]);
        assert_eq!(ids(&tree[0].children[1].children), ["4"]);
        assert_eq!(crate::model::count_all(&tree), 4);
    }

    #[test]
    fn counts_after_reconciliation() {
        let tree = reconcile(flat(&[("1", 0), ("2", 1), ("3", 0)]));
        assert_eq!(crate::model::count_all(&tree), 3);
        assert_eq!(ids(&tree), ["1", "3"]);
    }

    #[test]
    fn nested_input_passes_through_unchanged() {
        let nested = reconcile(flat(&[("1", 0), ("2", 1), ("3", 2), ("4", 1), ("5", 0)]));
        assert_eq!(CommentLayout::detect(&nested), CommentLayout::Nested);
        assert_eq!(reconcile(nested.clone()), nested);
    }

    #[test]
    fn nested_shape_is_not_regrouped() {
        // Depths that disagree with the nesting must not trigger regrouping.
        let nested = vec![
            Comment {
                id: "a".into(),
                depth: 0,
                children: vec![Comment {
                    id: "b".into(),
                    depth: 1,
                    ..Comment::default()
                }],
                ..Comment::default()
            },
            Comment {
                id: "c".into(),
                depth: 3,
                ..Comment::default()
            },
        ];
        assert_eq!(reconcile(nested.clone()), nested);
    }

    #[test]
    fn preserves_input_order() {
        let tree = reconcile(flat(&[("9", 0), ("3", 0), ("7", 1), ("1", 1), ("5", 0)]));
        assert_eq!(ids(&tree), ["9", "3", "5"]);
        assert_eq!(ids(&tree[1].children), ["7", "1"]);
    }

    #[test]
    fn shallower_first_reply_is_never_dropped() {
        let tree = reconcile(flat(&[("1", 1), ("2", 0), ("3", 1)]));
        assert_eq!(ids(&tree), ["1", "2"]);
        assert_eq!(ids(&tree[1].children), ["3"]);
    }

    #[test]
    fn empty_sequence_stays_empty() {
        assert!(reconcile(Vec::new()).is_empty());
    }

    #[test]
    fn reconcile_thread_replaces_comments() {
        let thread = Thread {
            comments: flat(&[("1", 0), ("2", 1)]),
            ..Thread::default()
        };
        let thread = reconcile_thread(thread);
        assert_eq!(ids(&thread.comments), ["1"]);
        assert_eq!(thread.comment_count(), 2);
    }
}
