//! 条件评估器性能基准测试
//!
//! 针对 ConditionEvaluator 的单个操作数条件进行细粒度的性能测试。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rule_engine::{ConditionEvaluator, FactRecord};
use std::hint::black_box;

fn create_facts() -> FactRecord {
    FactRecord::new()
        .with("age", 35)
        .with("score", 4.5)
        .with("department", "Sales")
        .with("vip", true)
}

/// 数值比较操作基准
fn bench_numeric_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("numeric_operations");
    let evaluator = ConditionEvaluator::new();
    let facts = create_facts();

    for condition in ["age == 35", "age != 30", "age > 30", "age >= 35", "age < 60", "score <= 5.0"] {
        group.bench_with_input(BenchmarkId::from_parameter(condition), condition, |b, cond| {
            b.iter(|| evaluator.evaluate_operand(black_box(cond), black_box(&facts)))
        });
    }

    group.finish();
}

/// 字符串和布尔比较基准
fn bench_string_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_operations");
    let evaluator = ConditionEvaluator::new();
    let facts = create_facts();

    group.bench_function("eq_single_quoted", |b| {
        b.iter(|| evaluator.evaluate_operand(black_box("department == 'Sales'"), black_box(&facts)))
    });

    group.bench_function("eq_double_quoted", |b| {
        b.iter(|| {
            evaluator.evaluate_operand(black_box("department == \"Sales\""), black_box(&facts))
        })
    });

    group.bench_function("bool_eq", |b| {
        b.iter(|| evaluator.evaluate_operand(black_box("vip == true"), black_box(&facts)))
    });

    group.finish();
}

/// In 操作符不同列表大小的性能
fn bench_in_operator_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_operator_scaling");
    let evaluator = ConditionEvaluator::new();
    let facts = FactRecord::new().with("city", "target");

    for size in [5, 10, 50, 100].iter() {
        let items: Vec<String> = (0..*size)
            .map(|i| {
                if i == size - 1 {
                    "'target'".to_string()
                } else {
                    format!("'item_{}'", i)
                }
            })
            .collect();
        let condition = format!("city in [{}]", items.join(", "));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| evaluator.evaluate_operand(black_box(&condition), black_box(&facts)))
        });
    }

    group.finish();
}

/// 缺失字段基准（错误路径）
fn bench_missing_field(c: &mut Criterion) {
    let evaluator = ConditionEvaluator::new();
    let facts = create_facts();

    c.bench_function("missing_field", |b| {
        b.iter(|| evaluator.evaluate_operand(black_box("height > 180"), black_box(&facts)))
    });
}

criterion_group!(
    benches,
    bench_numeric_operations,
    bench_string_operations,
    bench_in_operator_scaling,
    bench_missing_field,
);

criterion_main!(benches);
