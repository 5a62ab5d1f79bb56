//! 条件评估器
//!
//! 管理所有操作数谓词，按注册顺序路由条件文本到第一个接受它的谓词。
//!
//! ## 设计说明
//!
//! 谓词通过 Arc 共享，注册完成后评估器只读，可在多个线程间共享同一实例
//! 对不同事实记录并发求值。

use crate::error::{Result, RuleError};
use crate::facts::FactRecord;
use crate::predicate::{ComparisonPredicate, MembershipPredicate, Predicate};
use std::sync::Arc;
use tracing::debug;

/// 条件评估器
#[derive(Clone)]
pub struct ConditionEvaluator {
    predicates: Vec<Arc<dyn Predicate>>,
}

impl ConditionEvaluator {
    /// 创建包含默认谓词的评估器
    ///
    /// 默认注册：
    /// - MembershipPredicate: `field in [...]`
    /// - ComparisonPredicate: `field > 30`、`field == 'x'` 等
    pub fn new() -> Self {
        let mut evaluator = Self::empty();
        evaluator
            .register(Arc::new(MembershipPredicate))
            .register(Arc::new(ComparisonPredicate));
        evaluator
    }

    /// 创建不含任何谓词的评估器
    pub fn empty() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// 在末尾注册谓词
    pub fn register(&mut self, predicate: Arc<dyn Predicate>) -> &mut Self {
        debug!(predicate = predicate.name(), "注册操作数谓词");
        self.predicates.push(predicate);
        self
    }

    /// 在最前面注册谓词，优先于已注册的谓词
    pub fn register_first(&mut self, predicate: Arc<dyn Predicate>) -> &mut Self {
        debug!(predicate = predicate.name(), "注册操作数谓词（最高优先级）");
        self.predicates.insert(0, predicate);
        self
    }

    /// 已注册的谓词名称（按优先级）
    pub fn predicate_names(&self) -> Vec<&'static str> {
        self.predicates.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// 评估操作数条件
    ///
    /// 没有谓词识别该条件时返回 MalformedCondition，不会返回 false。
    pub fn evaluate_operand(&self, condition: &str, facts: &FactRecord) -> Result<bool> {
        let predicate = self
            .predicates
            .iter()
            .find(|p| p.accepts(condition))
            .ok_or_else(|| RuleError::malformed(condition, "没有可识别该条件的谓词"))?;

        predicate.evaluate(condition, facts)
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlagPredicate;

    impl Predicate for FlagPredicate {
        fn name(&self) -> &'static str {
            "flag"
        }

        fn accepts(&self, condition: &str) -> bool {
            condition.starts_with("flag:")
        }

        fn evaluate(&self, condition: &str, facts: &FactRecord) -> Result<bool> {
            let field = &condition["flag:".len()..];
            match facts.get(field) {
                Some(crate::facts::FactValue::Boolean(b)) => Ok(*b),
                Some(other) => Err(RuleError::type_mismatch("boolean", other.type_name())),
                None => Err(RuleError::MissingFact {
                    field: field.to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_default_predicates() {
        let evaluator = ConditionEvaluator::new();
        assert_eq!(evaluator.predicate_names(), vec!["membership", "comparison"]);
    }

    #[test]
    fn test_evaluate_age_scenario() {
        let evaluator = ConditionEvaluator::new();
        let older = FactRecord::new().with("age", 35);
        let younger = FactRecord::new().with("age", 20);

        assert!(evaluator.evaluate_operand("age > 30", &older).unwrap());
        assert!(!evaluator.evaluate_operand("age > 30", &younger).unwrap());
    }

    #[test]
    fn test_missing_fact_is_error() {
        let evaluator = ConditionEvaluator::new();
        let facts = FactRecord::new().with("age", 35);

        let result = evaluator.evaluate_operand("height > 180", &facts);
        assert!(matches!(result, Err(RuleError::MissingFact { ref field }) if field == "height"));
    }

    #[test]
    fn test_unrecognized_condition_is_error() {
        let evaluator = ConditionEvaluator::new();
        let facts = FactRecord::new().with("age", 35);

        let result = evaluator.evaluate_operand("age is old", &facts);
        assert!(matches!(result, Err(RuleError::MalformedCondition { .. })));
    }

    #[test]
    fn test_empty_evaluator_rejects_everything() {
        let evaluator = ConditionEvaluator::empty();
        assert!(evaluator.is_empty());

        let result = evaluator.evaluate_operand("age > 30", &FactRecord::new().with("age", 35));
        assert!(matches!(result, Err(RuleError::MalformedCondition { .. })));
    }

    #[test]
    fn test_custom_predicate_is_additive() {
        let mut evaluator = ConditionEvaluator::new();
        evaluator.register(Arc::new(FlagPredicate));
        assert_eq!(evaluator.len(), 3);

        let facts = FactRecord::new().with("active", true).with("age", 35);
        assert!(evaluator.evaluate_operand("flag:active", &facts).unwrap());
        // 内置谓词不受影响
        assert!(evaluator.evaluate_operand("age > 30", &facts).unwrap());
    }

    #[test]
    fn test_register_first_takes_priority() {
        struct Shadow;

        impl Predicate for Shadow {
            fn name(&self) -> &'static str {
                "shadow"
            }

            fn accepts(&self, _condition: &str) -> bool {
                true
            }

            fn evaluate(&self, _condition: &str, _facts: &FactRecord) -> Result<bool> {
                Ok(false)
            }
        }

        let mut evaluator = ConditionEvaluator::new();
        evaluator.register_first(Arc::new(Shadow));

        let facts = FactRecord::new().with("age", 35);
        assert!(!evaluator.evaluate_operand("age > 30", &facts).unwrap());
        assert_eq!(evaluator.predicate_names()[0], "shadow");
    }
}
