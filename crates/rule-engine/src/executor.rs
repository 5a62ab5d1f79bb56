//! 规则执行器
//!
//! 实现规则树的短路求值执行，返回匹配结果和评估追踪信息。

use crate::compiler::DEFAULT_MAX_DEPTH;
use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::facts::FactRecord;
use crate::models::{EvaluationResult, Node, NodeKind, Rule};
use crate::operators::LogicalOperator;
use std::time::Instant;

/// 规则执行器
///
/// 求值深度超过 `max_depth` 的树返回 InvalidTree，不会继续向下递归。
#[derive(Clone)]
pub struct RuleExecutor {
    evaluator: ConditionEvaluator,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
    max_depth: usize,
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::with_evaluator(ConditionEvaluator::default())
    }
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义的条件评估器
    pub fn with_evaluator(evaluator: ConditionEvaluator) -> Self {
        Self {
            evaluator,
            trace_enabled: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 设置可求值的最大树深度
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    /// 对规则树求值
    pub fn evaluate(&self, node: &Node, facts: &FactRecord) -> Result<bool> {
        self.evaluate_node(node, facts, None, "root", 1)
    }

    /// 执行规则评估，附带命中条件和追踪信息
    pub fn execute(&self, rule: &Rule, facts: &FactRecord) -> Result<EvaluationResult> {
        let start = Instant::now();

        let mut result = EvaluationResult::new(rule.id.clone(), rule.name.clone());
        let matched = self.evaluate_node(&rule.root, facts, Some(&mut result), "root", 1)?;

        result.matched = matched;
        result.evaluation_time_us = start.elapsed().as_micros() as u64;

        Ok(result)
    }

    /// 递归评估规则节点
    fn evaluate_node(
        &self,
        node: &Node,
        facts: &FactRecord,
        result: Option<&mut EvaluationResult>,
        path: &str,
        depth: usize,
    ) -> Result<bool> {
        if depth > self.max_depth {
            return Err(RuleError::InvalidTree(format!(
                "{}: 树深度超过上限 {}",
                path, self.max_depth
            )));
        }

        match node.kind {
            NodeKind::Operand => self.evaluate_operand(node, facts, result, path),
            NodeKind::Operator => self.evaluate_operator(node, facts, result, path, depth),
        }
    }

    /// 评估操作数节点
    fn evaluate_operand(
        &self,
        node: &Node,
        facts: &FactRecord,
        result: Option<&mut EvaluationResult>,
        path: &str,
    ) -> Result<bool> {
        if node.left.is_some() || node.right.is_some() {
            return Err(RuleError::InvalidTree(format!(
                "{}: 操作数节点 '{}' 不能有子节点",
                path, node.value
            )));
        }

        let matched = self.evaluator.evaluate_operand(&node.value, facts)?;

        if let Some(result) = result {
            if self.trace_enabled {
                result.evaluation_trace.push(format!(
                    "{}: {} => {}",
                    path,
                    node.value,
                    if matched { "MATCHED" } else { "NOT_MATCHED" }
                ));
            }
            if matched {
                result.matched_conditions.push(node.value.clone());
            }
        }

        Ok(matched)
    }

    /// 评估操作符节点（短路求值）
    fn evaluate_operator(
        &self,
        node: &Node,
        facts: &FactRecord,
        mut result: Option<&mut EvaluationResult>,
        path: &str,
        depth: usize,
    ) -> Result<bool> {
        let operator = node
            .logical_operator()
            .map_err(|e| RuleError::InvalidTree(format!("{}: {}", path, e)))?;
        let left = child(node.left.as_deref(), path, "left")?;
        let right = child(node.right.as_deref(), path, "right")?;

        let left_path = format!("{}.left", path);
        let left_matched =
            self.evaluate_node(left, facts, result.as_deref_mut(), &left_path, depth + 1)?;

        // AND 遇到 false、OR 遇到 true 立即返回，右子树不求值
        let short_circuit = match operator {
            LogicalOperator::And => !left_matched,
            LogicalOperator::Or => left_matched,
        };

        if short_circuit {
            if let Some(result) = result {
                if self.trace_enabled {
                    result
                        .evaluation_trace
                        .push(format!("{}: {} 短路 - 跳过右子树", path, operator));
                }
            }
            return Ok(left_matched);
        }

        let right_path = format!("{}.right", path);
        self.evaluate_node(right, facts, result, &right_path, depth + 1)
    }
}

fn child<'a>(node: Option<&'a Node>, path: &str, side: &str) -> Result<&'a Node> {
    node.ok_or_else(|| RuleError::InvalidTree(format!("{}: 操作符节点缺少 {} 子节点", path, side)))
}
