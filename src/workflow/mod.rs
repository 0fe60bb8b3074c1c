//! 流程层（Workflow Layer）
//!
//! 定义一次搜索运行的完整流程：选父代 → 采样 → 评估 → 更新存档。

pub mod archive;
pub mod method;
pub mod prompt;
pub mod search;

pub use archive::ParetoArchive;
pub use method::{Method, MethodConfig};
pub use search::HeuristicSearch;
