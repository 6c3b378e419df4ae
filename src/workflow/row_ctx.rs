//! 行处理上下文
//!
//! 封装"正在处理第几行/共几行"这一信息，仅用于日志显示

use std::fmt::Display;

/// 行处理上下文
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 行索引（从 1 开始）
    pub row_index: usize,

    /// 本批总行数
    pub total_rows: usize,
}

impl RowCtx {
    /// 创建新的行上下文
    pub fn new(row_index: usize, total_rows: usize) -> Self {
        Self {
            row_index,
            total_rows,
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[第 {}/{} 行]", self.row_index, self.total_rows)
    }
}
