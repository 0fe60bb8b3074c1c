//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把运行配置解析成方法实例并运行一次，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `dispatcher` - 运行调度器
//! - 按固定顺序查注册表（算法 → 任务 → 边界）
//! - 检查输出目录是否已被同名运行占用
//! - 构造 LLM 客户端、Profiler、方法
//! - 调用一次 `Method::run`
//!
//! ### `launcher` - 应用入口
//! - 启动日志、构建内置注册表
//! - 读取 API 凭证
//! - 输出最终统计
//!
//! ## 层次关系
//!
//! ```text
//! launcher (App)
//!     ↓
//! dispatcher (Orchestrator)
//!     ↓
//! registry (算法 / 任务 / 边界)  +  clients (LLM)
//!     ↓
//! workflow::Method (搜索流程，拥有全部并发)
//!     ↓
//! services (能力层：evaluation / profiler)
//! ```
//!
//! ## 设计原则
//!
//! 1. **先校验后花费**：所有解析错误在任何有副作用的构造之前返回
//! 2. **无并发**：编排层顺序执行，唯一的等待点是 `Method::run`
//! 3. **错误不吞**：方法的错误原样上抛

pub mod dispatcher;
pub mod launcher;

pub use dispatcher::{Orchestrator, PreparedRun, RunOutcome};
pub use launcher::App;
