//! 规则编译器
//!
//! 在规则进入存储或执行前校验树结构，并预提取规则引用的字段。
//! 条件文本本身不在这里校验，未注册谓词的条件允许先保存、后注册。

use crate::condition;
use crate::error::{Result, RuleError};
use crate::models::{Node, NodeKind, Rule};
use crate::operators::LogicalOperator;
use std::collections::HashSet;

/// 默认最大树深度
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始规则
    pub rule: Rule,
    /// 规则中可识别条件引用的字段
    pub required_fields: HashSet<String>,
    /// 编译版本号（用于缓存失效）
    pub compile_version: u64,
}

impl CompiledRule {
    pub fn id(&self) -> &str {
        &self.rule.id
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn root(&self) -> &Node {
        &self.rule.root
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
    max_depth: usize,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            compile_version: 0,
            max_depth,
        }
    }

    /// 编译规则
    pub fn compile(&mut self, rule: Rule) -> Result<CompiledRule> {
        self.validate_tree(&rule.root)?;

        let required_fields = extract_fields(&rule.root);
        self.compile_version += 1;

        Ok(CompiledRule {
            rule,
            required_fields,
            compile_version: self.compile_version,
        })
    }

    /// 校验树结构
    ///
    /// - 操作符节点取值必须是 `AND` / `OR`，且左右子节点齐全
    /// - 操作数节点不能有子节点
    /// - 深度不超过 `max_depth`
    pub fn validate_tree(&self, node: &Node) -> Result<()> {
        self.validate_node(node, "root", 1)
    }

    fn validate_node(&self, node: &Node, path: &str, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(RuleError::InvalidTree(format!(
                "{}: 树深度超过上限 {}",
                path, self.max_depth
            )));
        }

        match node.kind {
            NodeKind::Operand => {
                if node.left.is_some() || node.right.is_some() {
                    return Err(RuleError::InvalidTree(format!(
                        "{}: 操作数节点不能有子节点",
                        path
                    )));
                }
            }
            NodeKind::Operator => {
                if let Err(reason) = node.value.parse::<LogicalOperator>() {
                    return Err(RuleError::InvalidTree(format!("{}: {}", path, reason)));
                }

                for (side, child) in [("left", &node.left), ("right", &node.right)] {
                    let child_path = format!("{}.{}", path, side);
                    match child {
                        Some(child) => self.validate_node(child, &child_path, depth + 1)?,
                        None => {
                            return Err(RuleError::InvalidTree(format!(
                                "{}: 操作符节点缺少子节点",
                                child_path
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// 收集规则中可识别条件引用的字段
pub fn extract_fields(node: &Node) -> HashSet<String> {
    node.conditions()
        .into_iter()
        .filter_map(condition::referenced_field)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::combine;

    fn sample_rule() -> Rule {
        Rule::new(
            "sales",
            Node::and(
                Node::operand("age > 30"),
                Node::or(
                    Node::operand("department == 'Sales'"),
                    Node::operand("city in ['Beijing']"),
                ),
            ),
        )
    }

    #[test]
    fn test_compile_extracts_fields() {
        let mut compiler = RuleCompiler::new();
        let compiled = compiler.compile(sample_rule()).unwrap();

        assert_eq!(compiled.name(), "sales");
        assert_eq!(compiled.required_fields.len(), 3);
        assert!(compiled.required_fields.contains("age"));
        assert!(compiled.required_fields.contains("department"));
        assert!(compiled.required_fields.contains("city"));
    }

    #[test]
    fn test_compile_version() {
        let mut compiler = RuleCompiler::new();

        let compiled1 = compiler.compile(sample_rule()).unwrap();
        let compiled2 = compiler.compile(sample_rule()).unwrap();

        assert_eq!(compiled1.compile_version, 1);
        assert_eq!(compiled2.compile_version, 2);
    }

    #[test]
    fn test_unrecognized_conditions_are_deferred() {
        let mut compiler = RuleCompiler::new();
        let rule = Rule::new("custom", Node::operand("geo.within('Shanghai')"));

        let compiled = compiler.compile(rule).unwrap();
        assert!(compiled.required_fields.is_empty());
    }

    #[test]
    fn test_validate_unknown_operator() {
        let compiler = RuleCompiler::new();
        let mut tree = sample_rule().root;
        tree.value = "NAND".to_string();

        let result = compiler.validate_tree(&tree);
        assert!(matches!(result, Err(RuleError::InvalidTree(_))));
    }

    #[test]
    fn test_validate_missing_child_reports_path() {
        let compiler = RuleCompiler::new();
        let mut tree = sample_rule().root;
        if let Some(right) = tree.right.as_mut() {
            right.left = None;
        }

        match compiler.validate_tree(&tree) {
            Err(RuleError::InvalidTree(msg)) => assert!(msg.contains("root.right.left")),
            other => panic!("expected InvalidTree, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_operand_with_children() {
        let compiler = RuleCompiler::new();
        let mut leaf = Node::operand("age > 30");
        leaf.right = Some(Box::new(Node::operand("age < 60")));

        assert!(matches!(
            compiler.validate_tree(&leaf),
            Err(RuleError::InvalidTree(_))
        ));
    }

    #[test]
    fn test_validate_max_depth() {
        let rules: Vec<Node> = (0..10).map(|i| Node::operand(format!("f{} > 0", i))).collect();
        let tree = combine(rules).unwrap();
        // 10 条规则两两归并为 4 层运算符
        assert_eq!(tree.depth(), 5);

        assert!(RuleCompiler::with_max_depth(5).validate_tree(&tree).is_ok());
        assert!(matches!(
            RuleCompiler::with_max_depth(4).validate_tree(&tree),
            Err(RuleError::InvalidTree(_))
        ));
    }
}
