//! 规则组合
//!
//! 把多棵独立构建的规则树合并为一棵树。相邻规则两两配对逐层归并，落单的规则直接进入下一层：
//! `[r1, r2, r3]` -> `AND(AND(r1, r2), r3)`，`[r1, r2, r3, r4]` -> `AND(AND(r1, r2), AND(r3, r4))`。
//! 合并新增的层数为 ceil(log2 n)，叶子保持输入顺序。输入树整体作为子树挂接，内部结构不变。

use crate::error::{Result, RuleError};
use crate::models::Node;
use crate::operators::LogicalOperator;

/// 用 AND 组合规则（所有规则都必须成立）
///
/// - 空输入返回 EmptyRuleSet
/// - 单条规则原样返回，不额外包一层 AND
pub fn combine(rules: Vec<Node>) -> Result<Node> {
    combine_with(LogicalOperator::And, rules)
}

/// 用指定逻辑操作符组合规则
pub fn combine_with(operator: LogicalOperator, rules: Vec<Node>) -> Result<Node> {
    let mut level = rules;
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut iter = level.into_iter();
        while let Some(left) = iter.next() {
            match iter.next() {
                Some(right) => next.push(Node::operator(operator, left, right)),
                None => next.push(left),
            }
        }
        level = next;
    }

    level.pop().ok_or(RuleError::EmptyRuleSet)
}
