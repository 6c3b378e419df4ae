//! # Employee POS Update
//!
//! 一个批量更新员工管理后台 POS 信息的自动化工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `SessionDriver` - 唯一的 page owner，提供导航/填表/点击/等待能力，
//!   以及登录和"重置到搜索页"两个会话级操作
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个行
//! - `RowUpdater` - 对单个员工执行 搜索 → 选择 → 校验 → 编辑 → 保存
//! - `ReportWriter` - 写 CSV 报表能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行"的完整处理流程
//! - `RowCtx` - 上下文封装（第几行/共几行）
//! - `RetryFlow` - 重试状态机（尝试 → 重置会话 → 退避 → 再尝试）
//! - `UpdateSession` - 流程层对会话能力的唯一依赖（可用 mock 替换）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 顺序遍历整批行，管理浏览器资源，
//!   行与行之间重置会话，汇总结果并导出报表
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::launch_browser;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::SessionDriver;
pub use models::{Credentials, UpdateOutcome, UpdateRequest};
pub use orchestrator::{run_batch, App};
pub use workflow::{RetryFlow, RowCtx, RowState, UpdateSession};
