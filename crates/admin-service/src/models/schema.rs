//! 数据库结构自省结果

use serde::Serialize;

/// 表信息（行数为系统目录中的估算值）
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub table_name: String,
    pub estimated_rows: i64,
}

/// 列信息
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    #[sqlx(default)]
    pub column_default: Option<String>,
    pub ordinal_position: i32,
}
