//! 共享库
//!
//! 嵌入规则引擎的程序共用的配置加载和日志初始化代码。

pub mod config;
pub mod observability;
