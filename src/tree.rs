//! Scaling of recursive group-by trees.

use crate::model::{GroupTree, GroupValue};

/// Multiply every leaf of `tree`, at any depth, by `factor`.
///
/// Integer leaves truncate, real leaves stay real. Returns the number of
/// leaves scaled.
pub fn scale_tree(tree: &mut GroupTree, factor: f64) -> usize {
    tree.values_mut()
        .map(|value| scale_value(value, factor))
        .sum()
}

fn scale_value(value: &mut GroupValue, factor: f64) -> usize {
    match value {
        GroupValue::Leaf(n) => {
            *n = n.scaled(factor);
            1
        }
        GroupValue::Node(children) => scale_tree(children, factor),
    }
}
