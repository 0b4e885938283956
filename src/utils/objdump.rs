//! `objdump -s -j <section>` 文本转储读取器
//!
//! 转储格式:
//! ```text
//! prog.elf:     file format elf32-littleriscv
//!
//! Contents of section .text:
//!  0000 13050000 93050000 13060000 93060000  ................
//! ```

use std::collections::BTreeMap;

use section_reader::{SectionError, SectionReader};
use tracing::debug;

/// 最多在前若干行中查找节标记
pub const MAX_HEADER_LINES: usize = 16;

const SECTION_MARKER: &str = "section";

/// 转储至少包含的行数，少于该行数表示节不存在
const MIN_DUMP_LINES: usize = 2;

/// 从单个节的转储文本中恢复原始字节
pub fn extract_section_bytes(section: &str, dump: &str) -> Result<Vec<u8>, SectionError> {
    let lines: Vec<&str> = dump.trim().lines().collect();
    if lines.len() < MIN_DUMP_LINES {
        debug!(section, "转储中没有节内容");
        return Ok(Vec::new());
    }

    let marker = lines
        .iter()
        .take(MAX_HEADER_LINES)
        .position(|line| line.contains(SECTION_MARKER))
        .ok_or(SectionError::MarkerNotFound {
            scanned: lines.len().min(MAX_HEADER_LINES),
        })?;

    let mut hex_digits = String::new();
    for line in &lines[marker + 1..] {
        let line = line.trim();
        // 去掉 ASCII 注释
        let groups = match line.find("  ") {
            Some(end) => &line[..end],
            None => line,
        };
        for group in groups.split_whitespace().skip(1) {
            hex_digits.push_str(group);
        }
    }

    hex::decode(&hex_digits).map_err(|e| SectionError::InvalidHex {
        section: section.to_string(),
        reason: e.to_string(),
    })
}

/// 按节名保存转储文本的读取器
#[derive(Debug, Default, Clone)]
pub struct ObjdumpReader {
    dumps: BTreeMap<String, String>,
}

impl ObjdumpReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记某个节的转储文本
    pub fn with_dump(mut self, section: &str, dump: impl Into<String>) -> Self {
        self.dumps.insert(section.to_string(), dump.into());
        self
    }
}

impl SectionReader for ObjdumpReader {
    fn read_section(&self, section: &str) -> Result<Vec<u8>, SectionError> {
        match self.dumps.get(section) {
            Some(dump) => extract_section_bytes(section, dump),
            None => {
                debug!(section, "未提供转储，按空节处理");
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &str {
        "objdump"
    }
}
