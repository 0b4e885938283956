//! 目标文件节读取 trait 定义

use thiserror::Error;

/// 节读取错误类型
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    #[error("未找到节标记 `section`: 已扫描 {scanned} 行")]
    MarkerNotFound { scanned: usize },
    #[error("节 {section} 的十六进制数据无效: {reason}")]
    InvalidHex { section: String, reason: String },
    #[error("目标文件解析失败: {0}")]
    Parse(String),
}

/// 节读取 trait
/// 所有节数据来源（文本转储、ELF 等）都必须实现此 trait
pub trait SectionReader {
    /// 读取指定节的原始字节
    ///
    /// # 参数
    /// - section: 节名称，例如 `.text`、`.data`
    ///
    /// # 返回
    /// 节内容按地址升序排列；节不存在时返回空序列
    fn read_section(&self, section: &str) -> Result<Vec<u8>, SectionError>;

    /// 获取读取器名称（用于日志）
    fn name(&self) -> &str {
        "unknown"
    }
}
