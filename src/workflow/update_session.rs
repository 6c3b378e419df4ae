//! 更新会话抽象
//!
//! 重试与批量层只依赖这个接口，不关心浏览器细节

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::UpdateRequest;

/// 一次批量运行所依赖的会话能力
///
/// 整批行共享同一个会话实例，严格串行调用；
/// `apply` 失败后会话状态视为未知，必须先 `reset` 再复用
#[async_trait]
pub trait UpdateSession: Send {
    /// 对单行执行完整的更新事务，返回修改前的 POS 值
    async fn apply(&mut self, request: &UpdateRequest) -> AppResult<String>;

    /// 把远端会话重置回规范的搜索页，丢弃一切残留状态
    async fn reset(&mut self) -> AppResult<()>;
}
