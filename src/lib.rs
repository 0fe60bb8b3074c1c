//! # Heuristic Runner
//!
//! 一个用于启动 LLM 驱动的双目标启发式自动设计实验的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 注册表层（Registry）
//! - `registry/` - 算法名、问题名到具体实现的映射
//! - `Catalog` - 算法 / 任务 / 边界三张表，启动时检查一致性
//!
//! ### ② 业务能力层（Services / Clients）
//! - `clients/` - LLM 采样能力（`LlmSampler`）和客户端工厂
//! - `services/` - 候选程序评估（`Evaluation`）和运行记录（`Profiler`）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一次搜索运行的完整流程
//! - `HeuristicSearch` - 选父代 → 并发采样 → 并发评估 → 更新 Pareto 存档
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/dispatcher` - 解析配置、构造协作者、运行一次
//! - `orchestrator/launcher` - 应用入口
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, RunConfig};
pub use error::{AppError, AppResult};
pub use orchestrator::{App, Orchestrator, PreparedRun, RunOutcome};
pub use registry::Catalog;
pub use workflow::{HeuristicSearch, Method, MethodConfig};
