//! 条件文本解析
//!
//! 将操作数节点中的条件文本拆分为字段、操作符和字面量：
//! - `age > 30`
//! - `department == 'Sales'`（`=` 等价于 `==`）
//! - `user.level >= 3.5`
//! - `city in ['Beijing', "Shanghai"]` / `city not in ['Beijing']`

use crate::error::{Result, RuleError};
use crate::facts::FactValue;
use crate::operators::ComparisonOperator;
use regex::Regex;
use std::sync::LazyLock;

// 操作符按长度优先排列，避免 `>=` 被截成 `>`
static COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s*(==|!=|>=|<=|=|>|<)\s*(.*?)\s*$")
        .expect("comparison pattern is valid")
});

static MEMBERSHIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s+(not\s+in|in)\s*\[(.*)\]\s*$")
        .expect("membership pattern is valid")
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("number pattern is valid")
});

/// 比较条件 `<field> <op> <literal>`
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCondition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub literal: FactValue,
}

/// 列表成员条件 `<field> [not] in [<literal>, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipCondition {
    pub field: String,
    pub negated: bool,
    pub items: Vec<FactValue>,
}

/// 文本是否具有比较条件的形状（不校验字面量）
pub fn is_comparison(condition: &str) -> bool {
    COMPARISON_RE.is_match(condition)
}

/// 文本是否具有列表成员条件的形状
pub fn is_membership(condition: &str) -> bool {
    MEMBERSHIP_RE.is_match(condition)
}

/// 解析比较条件
pub fn parse_comparison(condition: &str) -> Result<ParsedCondition> {
    let caps = COMPARISON_RE
        .captures(condition)
        .ok_or_else(|| RuleError::malformed(condition, "期望 <字段> <操作符> <字面量>"))?;

    let operator = ComparisonOperator::from_symbol(&caps[2])
        .ok_or_else(|| RuleError::malformed(condition, format!("未知操作符 '{}'", &caps[2])))?;
    let literal = parse_literal(&caps[3]).map_err(|reason| RuleError::malformed(condition, reason))?;

    Ok(ParsedCondition {
        field: caps[1].to_string(),
        operator,
        literal,
    })
}

/// 解析列表成员条件
pub fn parse_membership(condition: &str) -> Result<MembershipCondition> {
    let caps = MEMBERSHIP_RE
        .captures(condition)
        .ok_or_else(|| RuleError::malformed(condition, "期望 <字段> [not] in [<字面量>, ...]"))?;

    let negated = caps[2].starts_with("not");
    let items = split_list(&caps[3])
        .map_err(|reason| RuleError::malformed(condition, reason))?
        .into_iter()
        .map(parse_literal)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|reason| RuleError::malformed(condition, reason))?;

    Ok(MembershipCondition {
        field: caps[1].to_string(),
        negated,
        items,
    })
}

/// 提取条件引用的字段名，无法识别时返回 None
pub fn referenced_field(condition: &str) -> Option<String> {
    MEMBERSHIP_RE
        .captures(condition)
        .or_else(|| COMPARISON_RE.captures(condition))
        .map(|caps| caps[1].to_string())
}

/// 解析字面量
///
/// 支持单/双引号字符串、`true`/`false`、整数和浮点数。
/// 不带引号的单词不视为字符串。
pub fn parse_literal(text: &str) -> std::result::Result<FactValue, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("缺少字面量".to_string());
    }

    if let Some(inner) = unquote(text) {
        return Ok(FactValue::String(inner.to_string()));
    }

    match text {
        "true" => return Ok(FactValue::Boolean(true)),
        "false" => return Ok(FactValue::Boolean(false)),
        _ => {}
    }

    if NUMBER_RE.is_match(text) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(FactValue::Integer(i));
        }
        if let Ok(f) = text.parse::<f64>() {
            return Ok(FactValue::Float(f));
        }
    }

    Err(format!("无法识别的字面量 {}", text))
}

fn unquote(text: &str) -> Option<&str> {
    let first = text.chars().next()?;
    if (first == '\'' || first == '"') && text.len() >= 2 && text.ends_with(first) {
        let inner = &text[1..text.len() - 1];
        if !inner.contains(first) {
            return Some(inner);
        }
    }
    None
}

/// 按逗号拆分列表内容，引号内的逗号不拆分
fn split_list(content: &str) -> std::result::Result<Vec<&str>, String> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, ',') => {
                items.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err("列表中的引号未闭合".to_string());
    }
    items.push(&content[start..]);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_comparison() {
        let parsed = parse_comparison("age > 30").unwrap();
        assert_eq!(parsed.field, "age");
        assert_eq!(parsed.operator, ComparisonOperator::Gt);
        assert_eq!(parsed.literal, FactValue::Integer(30));
    }

    #[test]
    fn test_parse_without_spaces() {
        let parsed = parse_comparison("score>=7.5").unwrap();
        assert_eq!(parsed.operator, ComparisonOperator::Gte);
        assert_eq!(parsed.literal, FactValue::Float(7.5));
    }

    #[test]
    fn test_parse_quoted_strings() {
        let single = parse_comparison("department == 'Sales'").unwrap();
        assert_eq!(single.literal, FactValue::from("Sales"));

        let double = parse_comparison("department != \"R&D > Ops\"").unwrap();
        assert_eq!(double.operator, ComparisonOperator::Neq);
        assert_eq!(double.literal, FactValue::from("R&D > Ops"));
    }

    #[test]
    fn test_single_equals_alias() {
        let parsed = parse_comparison("department = 'Sales'").unwrap();
        assert_eq!(parsed.operator, ComparisonOperator::Eq);
    }

    #[test]
    fn test_parse_bool_and_negative() {
        assert_eq!(
            parse_comparison("user.is_vip == true").unwrap().literal,
            FactValue::Boolean(true)
        );
        assert_eq!(
            parse_comparison("balance < -12").unwrap().literal,
            FactValue::Integer(-12)
        );
    }

    #[test]
    fn test_malformed_conditions() {
        for text in [
            "age >",
            "age > thirty",
            "age >> 30",
            "30 < age",
            "age > 'unterminated",
            "age > nan",
            "",
        ] {
            let result = parse_comparison(text);
            assert!(
                matches!(result, Err(RuleError::MalformedCondition { .. })),
                "expected malformed for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_parse_membership() {
        let parsed = parse_membership("city in ['Beijing', \"Shang, hai\", 3]").unwrap();
        assert_eq!(parsed.field, "city");
        assert!(!parsed.negated);
        assert_eq!(
            parsed.items,
            vec![
                FactValue::from("Beijing"),
                FactValue::from("Shang, hai"),
                FactValue::Integer(3)
            ]
        );

        let negated = parse_membership("city not in []").unwrap();
        assert!(negated.negated);
        assert!(negated.items.is_empty());
    }

    #[test]
    fn test_membership_bad_item() {
        let result = parse_membership("city in ['a', b]");
        assert!(matches!(result, Err(RuleError::MalformedCondition { .. })));
    }

    #[test]
    fn test_shape_detection() {
        assert!(is_comparison("age > 30"));
        assert!(!is_comparison("city in ['a']"));
        assert!(is_membership("city in ['a']"));
        assert!(!is_membership("age > 30"));
    }

    #[test]
    fn test_referenced_field() {
        assert_eq!(referenced_field("user.age >= 18"), Some("user.age".to_string()));
        assert_eq!(referenced_field("city not in ['x']"), Some("city".to_string()));
        assert_eq!(referenced_field("whatever"), None);
    }
}
