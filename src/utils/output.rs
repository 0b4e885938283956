//! 输出文件写入

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// 先写入同目录下的临时文件，再整体替换目标文件
///
/// 任何一步失败时临时文件随句柄一起删除，目标文件保持原状
pub fn write_atomic(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("无法在目录 {:?} 中创建临时文件", dir))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("无法写入临时文件 {:?}", file.path()))?;
    file.persist(path)
        .with_context(|| format!("无法写入输出文件 {:?}", path))?;
    Ok(())
}
