//! 规则引擎门面
//!
//! 串联编译校验、文档编解码、仓储和执行器：
//! 保存规则 -> 读取并求值 -> 组合多条已保存规则并另存。

use crate::codec;
use crate::combinator::combine;
use crate::compiler::{CompiledRule, RuleCompiler};
use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::executor::RuleExecutor;
use crate::facts::FactRecord;
use crate::models::{EvaluationResult, Node, Rule};
use crate::store::RuleRepository;
use parking_lot::Mutex;
use rule_shared::config::EngineConfig;
use tracing::{debug, info, instrument, warn};

/// 规则引擎
pub struct RuleEngine<R: RuleRepository> {
    repository: R,
    executor: RuleExecutor,
    compiler: Mutex<RuleCompiler>,
    trace_enabled: bool,
    max_depth: usize,
    validate_on_save: bool,
}

impl<R: RuleRepository> RuleEngine<R> {
    pub fn new(repository: R) -> Self {
        Self::from_config(repository, &EngineConfig::default())
    }

    pub fn from_config(repository: R, config: &EngineConfig) -> Self {
        let executor =
            build_executor(ConditionEvaluator::new(), config.trace_enabled, config.max_depth);

        Self {
            repository,
            executor,
            compiler: Mutex::new(RuleCompiler::with_max_depth(config.max_depth)),
            trace_enabled: config.trace_enabled,
            max_depth: config.max_depth,
            validate_on_save: config.validate_on_save,
        }
    }

    /// 替换条件评估器（用于注册自定义谓词）
    pub fn with_evaluator(mut self, evaluator: ConditionEvaluator) -> Self {
        self.executor = build_executor(evaluator, self.trace_enabled, self.max_depth);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn executor(&self) -> &RuleExecutor {
        &self.executor
    }

    /// 保存规则
    ///
    /// 开启 `validate_on_save` 时先校验树结构，结构非法的规则不会写入仓储。
    /// 超过文档深度上限的树无论是否开启校验都会被拒绝。
    #[instrument(skip(self, root))]
    pub fn save_rule(&self, name: &str, root: &Node) -> Result<()> {
        if self.validate_on_save {
            self.compiler.lock().validate_tree(root)?;
        }
        codec::ensure_encodable(root)?;

        self.repository.save(name, codec::encode(root))?;
        info!(depth = root.depth(), "规则已写入仓储: {}", name);
        Ok(())
    }

    /// 读取规则
    ///
    /// 规则不存在返回 RuleNotFound，文档损坏返回 CorruptDocument。
    #[instrument(skip(self))]
    pub fn load_rule(&self, name: &str) -> Result<Node> {
        let document = self.repository.fetch(name)?;

        codec::decode(&document).inspect_err(|e| {
            warn!("规则文档解码失败: {} - {}", name, e);
        })
    }

    /// 读取并编译规则，返回规则引用的字段
    pub fn compile_rule(&self, name: &str) -> Result<CompiledRule> {
        let root = self.load_rule(name)?;
        self.compiler.lock().compile(Rule::new(name, root))
    }

    /// 读取规则并对事实记录求值
    #[instrument(skip(self, facts))]
    pub fn evaluate_rule(&self, name: &str, facts: &FactRecord) -> Result<bool> {
        let root = self.load_rule(name)?;
        let matched = self.executor.evaluate(&root, facts)?;

        debug!(matched, "规则求值完成: {}", name);
        Ok(matched)
    }

    /// 读取规则并执行，附带命中条件和追踪信息
    #[instrument(skip(self, facts))]
    pub fn execute_rule(&self, name: &str, facts: &FactRecord) -> Result<EvaluationResult> {
        let root = self.load_rule(name)?;
        let result = self.executor.execute(&Rule::new(name, root), facts)?;

        debug!(
            matched = result.matched,
            elapsed_us = result.evaluation_time_us,
            "规则执行完成: {}",
            name
        );
        Ok(result)
    }

    /// 组合多条已保存的规则并以 `target` 为名保存
    #[instrument(skip(self))]
    pub fn combine_rules(&self, target: &str, names: &[&str]) -> Result<Node> {
        if names.is_empty() {
            return Err(RuleError::EmptyRuleSet);
        }

        let rules = names
            .iter()
            .map(|name| self.load_rule(name))
            .collect::<Result<Vec<_>>>()?;

        let combined = combine(rules)?;
        self.save_rule(target, &combined)?;

        info!(sources = names.len(), "规则组合完成: {}", target);
        Ok(combined)
    }

    /// 删除规则
    pub fn delete_rule(&self, name: &str) -> Result<()> {
        self.repository.delete(name)
    }

    /// 所有已保存的规则名称
    pub fn rule_names(&self) -> Vec<String> {
        self.repository.list_names()
    }
}

fn build_executor(
    evaluator: ConditionEvaluator,
    trace_enabled: bool,
    max_depth: usize,
) -> RuleExecutor {
    let executor = RuleExecutor::with_evaluator(evaluator).with_max_depth(max_depth);
    if trace_enabled {
        executor.with_trace()
    } else {
        executor
    }
}
