//! Reading order: top-to-bottom, then left-to-right.
//!
//! PDFs carry no reading-order metadata, and parsers emit blocks in content
//! stream order, which is often the order the authoring tool drew them in.
//! Sorting on `(y, x)` approximates how a single-column page is read. True
//! multi-column layouts come out interleaved row by row; that is a known
//! limitation of the heuristic.

use crate::model::{PageBlockSet, TextBlock};
use std::cmp::Ordering;

/// Sort a page's blocks into reading order and drop the blank ones.
///
/// The sort is stable: blocks tied on both coordinates keep the order the
/// parser emitted them in.
pub fn order_blocks(set: PageBlockSet) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = set
        .blocks
        .into_iter()
        .filter(|b| !b.text.trim().is_empty())
        .collect();
    blocks.sort_by(reading_order);
    blocks
}

/// `y` ascending, then `x` ascending.
pub fn reading_order(a: &TextBlock, b: &TextBlock) -> Ordering {
    coord(a.y)
        .total_cmp(&coord(b.y))
        .then_with(|| coord(a.x).total_cmp(&coord(b.x)))
}

/// `total_cmp` orders `-0.0` before `0.0`; adding zero folds them together.
/// NaN sorts after every number.
fn coord(v: f32) -> f32 {
    if v.is_nan() {
        f32::INFINITY
    } else {
        v + 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(blocks: &[(f32, f32, &str)]) -> PageBlockSet {
        PageBlockSet::new(
            0,
            blocks
                .iter()
                .map(|&(x, y, t)| TextBlock::new(0, x, y, t))
                .collect(),
        )
    }

    fn texts(blocks: &[TextBlock]) -> Vec<&str> {
        blocks.iter().map(|b| b.text.as_str()).collect()
    }

    #[test]
    fn same_line_sorted_by_x() {
        let ordered = order_blocks(set(&[(50.0, 10.0, "Hello"), (10.0, 10.0, "World")]));
        assert_eq!(texts(&ordered), vec!["World", "Hello"]);
    }

    #[test]
    fn y_dominates_x() {
        let ordered = order_blocks(set(&[
            (0.0, 300.0, "footer"),
            (400.0, 20.0, "title right"),
            (5.0, 20.0, "title left"),
            (100.0, 120.0, "body"),
        ]));
        assert_eq!(
            texts(&ordered),
            vec!["title left", "title right", "body", "footer"]
        );
    }

    #[test]
    fn full_ties_keep_emission_order() {
        let ordered = order_blocks(set(&[
            (10.0, 10.0, "first"),
            (10.0, 10.0, "second"),
            (10.0, 10.0, "third"),
        ]));
        assert_eq!(texts(&ordered), vec!["first", "second", "third"]);
    }

    #[test]
    fn negative_zero_ties_with_zero() {
        let ordered = order_blocks(set(&[(0.0, 0.0, "a"), (-0.0, -0.0, "b")]));
        assert_eq!(texts(&ordered), vec!["a", "b"]);
    }

    #[test]
    fn nan_coordinates_sort_last_without_panicking() {
        let ordered = order_blocks(set(&[
            (0.0, f32::NAN, "lost"),
            (0.0, 5.0, "found"),
        ]));
        assert_eq!(texts(&ordered), vec!["found", "lost"]);
    }

    #[test]
    fn blank_blocks_are_discarded() {
        let ordered = order_blocks(set(&[
            (0.0, 0.0, "   "),
            (0.0, 1.0, "\n\t"),
            (0.0, 2.0, ""),
            (0.0, 3.0, " kept "),
        ]));
        assert_eq!(texts(&ordered), vec![" kept "]);
    }

    #[test]
    fn ordering_is_deterministic() {
        let input = set(&[
            (3.0, 1.0, "c"),
            (1.0, 1.0, "a"),
            (2.0, 1.0, "b"),
            (1.0, 0.5, "z"),
        ]);
        let first = order_blocks(input.clone());
        for _ in 0..10 {
            assert_eq!(order_blocks(input.clone()), first);
        }
    }

    #[test]
    fn precedence_matches_pairwise_rule() {
        let input = set(&[
            (7.0, 2.0, "p"),
            (1.0, 9.0, "q"),
            (7.0, 2.0, "r"),
            (0.0, 2.0, "s"),
            (3.0, 0.0, "t"),
        ]);
        let emitted: Vec<TextBlock> = input.blocks.clone();
        let ordered = order_blocks(input);

        let pos = |t: &str| ordered.iter().position(|b| b.text == t).unwrap();
        let emit = |t: &str| emitted.iter().position(|b| b.text == t).unwrap();

        for a in &emitted {
            for b in &emitted {
                if a.text == b.text {
                    continue;
                }
                let expected = a.y < b.y
                    || (a.y == b.y && a.x < b.x)
                    || (a.y == b.y && a.x == b.x && emit(&a.text) < emit(&b.text));
                assert_eq!(pos(&a.text) < pos(&b.text), expected, "{} vs {}", a.text, b.text);
            }
        }
    }
}
