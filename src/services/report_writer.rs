//! 报表写入服务 - 业务能力层
//!
//! 只负责把处理结果落盘成 CSV，不关心流程

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{InvalidRow, UpdateOutcome};

/// 判断失败结果是否属于"员工不存在/无权限"一类
///
/// 按错误文本匹配，和上游报表消费方的约定保持一致
pub fn is_permission_denied(outcome: &UpdateOutcome) -> bool {
    if outcome.success {
        return false;
    }
    let error = outcome.error.as_deref().unwrap_or("").to_lowercase();
    error.contains("permission") || error.contains("not found")
}

/// 报表写入服务
pub struct ReportWriter {
    audit_path: String,
    invalid_path: String,
    permission_denied_path: String,
}

impl ReportWriter {
    /// 按配置创建报表写入服务
    pub fn new(config: &Config) -> Self {
        Self {
            audit_path: config.audit_csv.clone(),
            invalid_path: config.invalid_csv.clone(),
            permission_denied_path: config.permission_denied_csv.clone(),
        }
    }

    /// 使用自定义路径创建
    pub fn with_paths(
        audit_path: impl Into<String>,
        invalid_path: impl Into<String>,
        permission_denied_path: impl Into<String>,
    ) -> Self {
        Self {
            audit_path: audit_path.into(),
            invalid_path: invalid_path.into(),
            permission_denied_path: permission_denied_path.into(),
        }
    }

    /// 写审计报表：每行一条结果，保持输入顺序
    pub fn write_audit(&self, outcomes: &[UpdateOutcome]) -> AppResult<()> {
        let mut lines = vec!["employee_id,old_pos,new_pos,success,error".to_string()];
        for outcome in outcomes {
            lines.push(
                [
                    csv_field(&outcome.employee_id),
                    csv_field(outcome.old_pos.as_deref().unwrap_or("")),
                    csv_field(outcome.new_pos.as_deref().unwrap_or("")),
                    if outcome.success { "true" } else { "false" }.to_string(),
                    csv_field(outcome.error.as_deref().unwrap_or("")),
                ]
                .join(","),
            );
        }
        write_report(&self.audit_path, &lines)?;
        info!("审计 CSV 已写入: {}", self.audit_path);
        Ok(())
    }

    /// 把"不存在/无权限"一类失败单独导出，返回导出的行数
    pub fn write_permission_denied(&self, outcomes: &[UpdateOutcome]) -> AppResult<usize> {
        let denied: Vec<&UpdateOutcome> = outcomes
            .iter()
            .filter(|outcome| is_permission_denied(outcome))
            .collect();
        if denied.is_empty() {
            return Ok(0);
        }

        let mut lines = vec!["employee_id,reason".to_string()];
        for outcome in &denied {
            lines.push(format!(
                "{},{}",
                csv_field(&outcome.employee_id),
                csv_field("No permission to access user"),
            ));
        }
        write_report(&self.permission_denied_path, &lines)?;
        info!(
            "权限受限员工 CSV 已写入: {} ({} 人)",
            self.permission_denied_path,
            denied.len()
        );
        Ok(denied.len())
    }

    /// 导出缺少有效 POS 数据的行供人工复核
    pub fn write_invalid(&self, rows: &[InvalidRow]) -> AppResult<()> {
        let mut lines = vec!["employee_id,pos_id,reason".to_string()];
        for row in rows {
            lines.push(
                [
                    csv_field(&row.employee_id),
                    csv_field(&row.pos_id),
                    csv_field("Missing POS data"),
                ]
                .join(","),
            );
        }
        write_report(&self.invalid_path, &lines)?;
        info!("无效行 CSV 已写入: {}", self.invalid_path);
        Ok(())
    }
}

fn write_report(path: &str, lines: &[String]) -> AppResult<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

/// CSV 字段转义：含逗号/引号/换行时整体加引号
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateRequest;

    fn request(employee_id: &str) -> UpdateRequest {
        UpdateRequest {
            employee_id: employee_id.to_string(),
            pos_id: "P1".to_string(),
        }
    }

    #[test]
    fn csv_field_escapes_special_characters() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn permission_denied_matches_on_error_text() {
        let denied = UpdateOutcome::failed(
            &request("E1"),
            "员工不存在或无权限访问 (user not found or no permission): E1",
        );
        assert!(is_permission_denied(&denied));

        let other = UpdateOutcome::failed(&request("E2"), "页面交互异常: 点击失败");
        assert!(!is_permission_denied(&other));

        let success = UpdateOutcome::ok(&request("E3"), "P0".to_string());
        assert!(!is_permission_denied(&success));
    }

    #[test]
    fn audit_report_preserves_order_and_quotes_errors() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let audit = dir.path().join("audit.csv");
        let writer = ReportWriter::with_paths(
            audit.display().to_string(),
            dir.path().join("invalid.csv").display().to_string(),
            dir.path().join("denied.csv").display().to_string(),
        );

        let outcomes = vec![
            UpdateOutcome::ok(&request("E1"), "P0".to_string()),
            UpdateOutcome::failed(&request("E2"), "错误, 含逗号"),
        ];
        writer.write_audit(&outcomes).expect("写审计报表失败");

        let content = std::fs::read_to_string(&audit).expect("读回失败");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "employee_id,old_pos,new_pos,success,error");
        assert_eq!(lines[1], "E1,P0,P1,true,");
        assert_eq!(lines[2], "E2,,,false,\"错误, 含逗号\"");
    }

    #[test]
    fn permission_report_only_written_for_denied_rows() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let denied_path = dir.path().join("denied.csv");
        let writer = ReportWriter::with_paths(
            dir.path().join("audit.csv").display().to_string(),
            dir.path().join("invalid.csv").display().to_string(),
            denied_path.display().to_string(),
        );

        let clean = vec![UpdateOutcome::ok(&request("E1"), "P0".to_string())];
        assert_eq!(writer.write_permission_denied(&clean).unwrap(), 0);
        assert!(!denied_path.exists());

        let outcomes = vec![UpdateOutcome::failed(
            &request("E2"),
            "user not found or no permission",
        )];
        assert_eq!(writer.write_permission_denied(&outcomes).unwrap(), 1);
        let content = std::fs::read_to_string(&denied_path).expect("读回失败");
        assert!(content.contains("E2"));
    }
}
