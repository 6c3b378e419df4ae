//! 核心数据模型
//!
//! 一行 = 一个 (员工编号, 目标 POS) 更新请求；
//! 每行处理完后产生一个与输入同序的结果记录

use crate::error::{AppError, AppResult};

/// 管理后台登录凭证
///
/// 每次运行读取一次，只在内存中存在，从不落盘、从不打日志
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// 从环境变量读取凭证（配合 .env 使用）
    pub fn from_env() -> AppResult<Self> {
        let username = std::env::var("ADMIN_USERNAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::env_var_not_found("ADMIN_USERNAME"))?;
        let password = std::env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::env_var_not_found("ADMIN_PASSWORD"))?;
        Ok(Self { username, password })
    }
}

/// 一行更新请求
///
/// 加载层保证两个字段去除首尾空白后非空；允许重复，重复行各自独立处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub employee_id: String,
    pub pos_id: String,
}

/// 被加载层拦下的无效行（缺少有效的 POS 数据）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRow {
    pub employee_id: String,
    pub pos_id: String,
}

/// 一行的终态处理结果
///
/// 不变式：success == error.is_none()；成功时 new_pos 等于请求的 pos_id；
/// old_pos 只在真实（非 dry-run）成功更新时存在。
/// 只能通过 [`UpdateOutcome::ok`] / [`UpdateOutcome::dry_run`] /
/// [`UpdateOutcome::failed`] 构造，保证不变式不被破坏
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub employee_id: String,
    pub pos_id: String,
    pub success: bool,
    pub old_pos: Option<String>,
    pub new_pos: Option<String>,
    pub error: Option<String>,
}

impl UpdateOutcome {
    /// 真实更新成功，记录修改前的值
    pub fn ok(request: &UpdateRequest, old_pos: String) -> Self {
        Self {
            employee_id: request.employee_id.clone(),
            pos_id: request.pos_id.clone(),
            success: true,
            old_pos: Some(old_pos),
            new_pos: Some(request.pos_id.clone()),
            error: None,
        }
    }

    /// dry-run 合成的成功结果：没有触碰远端，所以没有旧值
    pub fn dry_run(request: &UpdateRequest) -> Self {
        Self {
            employee_id: request.employee_id.clone(),
            pos_id: request.pos_id.clone(),
            success: true,
            old_pos: None,
            new_pos: Some(request.pos_id.clone()),
            error: None,
        }
    }

    /// 重试预算耗尽后的终态失败
    pub fn failed(request: &UpdateRequest, error: impl Into<String>) -> Self {
        Self {
            employee_id: request.employee_id.clone(),
            pos_id: request.pos_id.clone(),
            success: false,
            old_pos: None,
            new_pos: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UpdateRequest {
        UpdateRequest {
            employee_id: "E1".to_string(),
            pos_id: "P1".to_string(),
        }
    }

    #[test]
    fn ok_outcome_records_old_and_new_values() {
        let outcome = UpdateOutcome::ok(&request(), "P0".to_string());
        assert!(outcome.success);
        assert_eq!(outcome.old_pos.as_deref(), Some("P0"));
        assert_eq!(outcome.new_pos.as_deref(), Some("P1"));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn dry_run_outcome_has_no_old_value() {
        let outcome = UpdateOutcome::dry_run(&request());
        assert!(outcome.success);
        assert!(outcome.old_pos.is_none());
        assert_eq!(outcome.new_pos.as_deref(), Some("P1"));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn failed_outcome_always_carries_error() {
        let outcome = UpdateOutcome::failed(&request(), "boom");
        assert!(!outcome.success);
        assert!(outcome.old_pos.is_none());
        assert!(outcome.new_pos.is_none());
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }
}
