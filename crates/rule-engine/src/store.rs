//! 规则存储管理
//!
//! 持久化协作方的接口定义，以及基于 DashMap 的线程安全内存实现。
//! 存储层只保存文档，不保存规则树，读写都必须经过编解码边界。

use crate::codec::Document;
use crate::error::{Result, RuleError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 规则仓储接口
///
/// 负责按名称保存、读取文档。名称不存在时返回 RuleNotFound，
/// 与文档损坏（CorruptDocument）区分开。
#[cfg_attr(test, mockall::automock)]
pub trait RuleRepository: Send + Sync {
    /// 保存文档，同名文档会被覆盖
    fn save(&self, name: &str, document: Document) -> Result<()>;

    /// 读取文档
    fn fetch(&self, name: &str) -> Result<Document>;

    /// 删除文档
    fn delete(&self, name: &str) -> Result<()>;

    /// 所有规则名称
    fn list_names(&self) -> Vec<String>;
}

/// 存储的规则文档
#[derive(Debug, Clone)]
pub struct StoredRule {
    pub document: Document,
    /// 每次覆盖保存递增
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

/// 内存规则存储
#[derive(Clone, Default)]
pub struct RuleStore {
    rules: Arc<DashMap<String, StoredRule>>,
}

impl RuleStore {
    /// 创建新的规则存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前存储的规则数量
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 检查存储是否为空
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 检查规则是否存在
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// 获取规则文档及元数据
    pub fn get(&self, name: &str) -> Option<StoredRule> {
        self.rules.get(name).map(|r| r.clone())
    }

    /// 清空所有规则
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }

    /// 获取规则存储统计信息
    pub fn stats(&self) -> RuleStoreStats {
        let rules_count = self.rules.len();
        let total_revisions = self.rules.iter().map(|r| r.revision).sum();

        RuleStoreStats {
            rules_count,
            total_revisions,
        }
    }
}

impl RuleRepository for RuleStore {
    #[instrument(skip(self, document))]
    fn save(&self, name: &str, document: Document) -> Result<()> {
        let revision = self
            .rules
            .get(name)
            .map(|existing| existing.revision + 1)
            .unwrap_or(1);

        self.rules.insert(
            name.to_string(),
            StoredRule {
                document,
                revision,
                updated_at: Utc::now(),
            },
        );

        info!(revision, "规则已保存: {}", name);
        Ok(())
    }

    #[instrument(skip(self))]
    fn fetch(&self, name: &str) -> Result<Document> {
        match self.rules.get(name) {
            Some(stored) => Ok(stored.document.clone()),
            None => {
                warn!("读取不存在的规则: {}", name);
                Err(RuleError::RuleNotFound(name.to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    fn delete(&self, name: &str) -> Result<()> {
        if self.rules.remove(name).is_some() {
            info!("规则已删除: {}", name);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", name);
            Err(RuleError::RuleNotFound(name.to_string()))
        }
    }

    fn list_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.key().clone()).collect()
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone)]
pub struct RuleStoreStats {
    /// 规则总数
    pub rules_count: usize,
    /// 所有规则的保存次数总和
    pub total_revisions: u64,
}
