//! 操作数谓词
//!
//! 每种条件语法对应一个 [`Predicate`] 实现，由 [`ConditionEvaluator`](crate::evaluator::ConditionEvaluator)
//! 按注册顺序挑选第一个接受该条件文本的谓词进行求值。
//! 新增条件语法只需实现该 trait 并注册，不需要修改规则树或执行器。

use crate::condition::{self, MembershipCondition, ParsedCondition};
use crate::error::{Result, RuleError};
use crate::facts::{FactRecord, FactValue};
use crate::operators::ComparisonOperator;
use std::cmp::Ordering;

/// 操作数谓词 Trait
///
/// # 示例
///
/// ```ignore
/// struct AlwaysTrue;
///
/// impl Predicate for AlwaysTrue {
///     fn name(&self) -> &'static str {
///         "always_true"
///     }
///
///     fn accepts(&self, condition: &str) -> bool {
///         condition.trim() == "TRUE"
///     }
///
///     fn evaluate(&self, _condition: &str, _facts: &FactRecord) -> Result<bool> {
///         Ok(true)
///     }
/// }
/// ```
pub trait Predicate: Send + Sync {
    /// 谓词名称，用于日志和调试
    fn name(&self) -> &'static str;

    /// 是否识别该条件文本
    ///
    /// 只判断语法形状；形状正确但细节非法（如字面量无法解析）时
    /// 应返回 true，由 `evaluate` 报告 MalformedCondition。
    fn accepts(&self, condition: &str) -> bool;

    /// 对事实记录求值
    ///
    /// 必须是确定性且无副作用的，短路求值依赖这一点。
    fn evaluate(&self, condition: &str, facts: &FactRecord) -> Result<bool>;
}

/// 比较谓词：`<field> <op> <literal>`
#[derive(Debug, Default, Clone, Copy)]
pub struct ComparisonPredicate;

impl Predicate for ComparisonPredicate {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn accepts(&self, condition: &str) -> bool {
        condition::is_comparison(condition)
    }

    fn evaluate(&self, condition: &str, facts: &FactRecord) -> Result<bool> {
        let ParsedCondition {
            field,
            operator,
            literal,
        } = condition::parse_comparison(condition)?;

        let fact = lookup(facts, &field)?;
        compare(fact, operator, &literal)
    }
}

/// 列表成员谓词：`<field> in [...]` / `<field> not in [...]`
#[derive(Debug, Default, Clone, Copy)]
pub struct MembershipPredicate;

impl Predicate for MembershipPredicate {
    fn name(&self) -> &'static str {
        "membership"
    }

    fn accepts(&self, condition: &str) -> bool {
        condition::is_membership(condition)
    }

    fn evaluate(&self, condition: &str, facts: &FactRecord) -> Result<bool> {
        let MembershipCondition {
            field,
            negated,
            items,
        } = condition::parse_membership(condition)?;

        let fact = lookup(facts, &field)?;

        // 逐项比较全部元素，类型不兼容的元素总会报错，与顺序无关
        let mut found = false;
        for item in &items {
            if compare(fact, ComparisonOperator::Eq, item)? {
                found = true;
            }
        }

        Ok(found != negated)
    }
}

/// 查找事实，不存在时返回 MissingFact
pub fn lookup<'a>(facts: &'a FactRecord, field: &str) -> Result<&'a FactValue> {
    facts.get(field).ok_or_else(|| RuleError::MissingFact {
        field: field.to_string(),
    })
}

/// 比较事实值和字面量
///
/// 整数与浮点数按数值比较；字符串支持相等和字典序比较；
/// 布尔值只支持相等比较。其他类型组合返回 TypeMismatch。
pub fn compare(
    fact: &FactValue,
    operator: ComparisonOperator,
    literal: &FactValue,
) -> Result<bool> {
    let ordering = match (fact, literal) {
        (FactValue::Integer(a), FactValue::Integer(b)) => Some(a.cmp(b)),
        (FactValue::Integer(a), FactValue::Float(b)) => cmp_int_float(*a, *b),
        (FactValue::Float(a), FactValue::Integer(b)) => cmp_int_float(*b, *a).map(Ordering::reverse),
        (FactValue::String(a), FactValue::String(b)) => Some(a.cmp(b)),
        (FactValue::Boolean(a), FactValue::Boolean(b)) => {
            if operator.is_ordering() {
                return Err(RuleError::type_mismatch("number or string", "boolean"));
            }
            Some(a.cmp(b))
        }
        _ => match (fact.as_f64(), literal.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(RuleError::type_mismatch(
                    literal.type_name(),
                    fact.type_name(),
                ));
            }
        },
    };

    Ok(match operator {
        ComparisonOperator::Eq => ordering == Some(Ordering::Equal),
        ComparisonOperator::Neq => ordering != Some(Ordering::Equal),
        ComparisonOperator::Gt => ordering == Some(Ordering::Greater),
        ComparisonOperator::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        ComparisonOperator::Lt => ordering == Some(Ordering::Less),
        ComparisonOperator::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    })
}

/// 整数与浮点数的精确比较，不把整数有损转换为 f64
fn cmp_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63，i64 的取值范围是 [-2^63, 2^63)
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= BOUND {
        return Some(Ordering::Less);
    }
    if float < -BOUND {
        return Some(Ordering::Greater);
    }

    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&float),
        other => Some(other),
    }
}
