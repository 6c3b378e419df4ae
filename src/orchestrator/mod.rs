//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和资源管理，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_runner (处理 Vec<UpdateRequest>，持有 Browser)
//!     ↓
//! workflow::RetryFlow (处理单行，带重试状态机)
//!     ↓
//! services::RowUpdater (单行的 搜索→选择→校验→编辑→保存)
//!     ↓
//! infrastructure::SessionDriver (页面原语)
//! ```
//!
//! ## 设计原则
//!
//! 1. **严格串行**：整批共享一个浏览器会话，没有任何行级并行
//! 2. **资源隔离**：只有编排层持有 Browser
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度、报表和统计

pub mod batch_runner;

// 重新导出主要类型
pub use batch_runner::{run_batch, App};
