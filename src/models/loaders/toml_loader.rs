//! 从 TOML 文件加载待更新的行数据
//!
//! 文件格式：
//!
//! ```toml
//! [[rows]]
//! employee_id = "1000123"
//! pos_id = "POS_8801"
//! ```

use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::record::{InvalidRow, UpdateRequest};

/// POS 列里表示"没有数据"的占位值（来自上游表格导出）
const POS_SENTINELS: [&str; 3] = ["#n/a", "nan", "none"];

#[derive(Debug, Deserialize)]
struct RowsFile {
    #[serde(default)]
    rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    employee_id: String,
    #[serde(default)]
    pos_id: String,
}

/// 加载行数据文件，返回 (有效行, 无效行)
///
/// 无效行指缺少有效 POS 数据的行，它们会被单独导出供人工复核；
/// offset/limit 只作用于有效行，用于断点续跑
pub async fn load_rows_file(
    path: &Path,
    offset: usize,
    limit: Option<usize>,
) -> AppResult<(Vec<UpdateRequest>, Vec<InvalidRow>)> {
    info!("正在加载行数据文件: {}", path.display());

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let file: RowsFile = toml::from_str(&content)
        .map_err(|e| AppError::toml_parse_failed(path.display().to_string(), e))?;

    let (valid, invalid) = partition_rows(file, offset, limit);
    info!("成功加载 {} 个有效行, {} 个无效行", valid.len(), invalid.len());

    Ok((valid, invalid))
}

/// 去空白、丢弃空员工编号、把缺少有效 POS 的行分流出去，
/// 最后对有效行应用 offset/limit 窗口
fn partition_rows(
    file: RowsFile,
    offset: usize,
    limit: Option<usize>,
) -> (Vec<UpdateRequest>, Vec<InvalidRow>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for row in file.rows {
        let employee_id = row.employee_id.trim().to_string();
        let pos_id = row.pos_id.trim().to_string();

        if employee_id.is_empty() {
            continue;
        }

        if pos_id.is_empty() || POS_SENTINELS.contains(&pos_id.to_lowercase().as_str()) {
            invalid.push(InvalidRow { employee_id, pos_id });
        } else {
            valid.push(UpdateRequest { employee_id, pos_id });
        }
    }

    let start = offset.min(valid.len());
    let end = match limit {
        Some(limit) => (start + limit).min(valid.len()),
        None => valid.len(),
    };

    (valid[start..end].to_vec(), invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> RowsFile {
        toml::from_str(content).expect("测试数据应能解析")
    }

    const SAMPLE: &str = r##"
        [[rows]]
        employee_id = " E1 "
        pos_id = "P1"

        [[rows]]
        employee_id = "E2"
        pos_id = "#N/A"

        [[rows]]
        employee_id = ""
        pos_id = "P3"

        [[rows]]
        employee_id = "E4"
        pos_id = "P4"
    "##;

    #[test]
    fn partitions_and_trims_rows() {
        let (valid, invalid) = partition_rows(parse(SAMPLE), 0, None);

        assert_eq!(
            valid,
            vec![
                UpdateRequest {
                    employee_id: "E1".to_string(),
                    pos_id: "P1".to_string()
                },
                UpdateRequest {
                    employee_id: "E4".to_string(),
                    pos_id: "P4".to_string()
                },
            ]
        );
        assert_eq!(
            invalid,
            vec![InvalidRow {
                employee_id: "E2".to_string(),
                pos_id: "#N/A".to_string()
            }]
        );
    }

    #[test]
    fn offset_and_limit_apply_to_valid_rows_only() {
        let (valid, invalid) = partition_rows(parse(SAMPLE), 1, Some(5));
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].employee_id, "E4");
        // 无效行不受窗口影响
        assert_eq!(invalid.len(), 1);

        let (valid, _) = partition_rows(parse(SAMPLE), 0, Some(1));
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].employee_id, "E1");

        let (valid, _) = partition_rows(parse(SAMPLE), 10, None);
        assert!(valid.is_empty());
    }

    #[tokio::test]
    async fn loads_rows_from_disk() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let path = dir.path().join("rows.toml");
        std::fs::write(&path, SAMPLE).expect("写入测试文件失败");

        let (valid, invalid) = load_rows_file(&path, 0, None).await.expect("加载失败");
        assert_eq!(valid.len(), 2);
        assert_eq!(invalid.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let result = load_rows_file(Path::new("does_not_exist.toml"), 0, None).await;
        assert!(result.is_err());
    }
}
