//! ELF文件节读取器

use object::{Object, ObjectSection};
use section_reader::{SectionError, SectionReader};
use std::fs;
use tracing::debug;

use anyhow::{Context, Result};

/// 直接从 ELF 映像读取节内容
pub struct ElfSectionReader {
    elf_data: Vec<u8>,
}

impl ElfSectionReader {
    pub fn new(elf_data: Vec<u8>) -> Self {
        Self { elf_data }
    }

    /// 读取ELF文件
    pub fn open(path: &str) -> Result<Self> {
        let elf_data = fs::read(path).with_context(|| format!("无法读取ELF文件 '{}'", path))?;
        Ok(Self::new(elf_data))
    }
}

impl SectionReader for ElfSectionReader {
    fn read_section(&self, section: &str) -> Result<Vec<u8>, SectionError> {
        let elf_file = object::File::parse(&*self.elf_data)
            .map_err(|e| SectionError::Parse(format!("无法解析ELF文件: {}", e)))?;

        let Some(found) = elf_file.section_by_name(section) else {
            debug!(section, "ELF中不存在该节");
            return Ok(Vec::new());
        };

        let data = found
            .data()
            .map_err(|e| SectionError::Parse(format!("无法读取节 '{}' 的数据: {}", section, e)))?;
        debug!(section, address = found.address(), size = data.len(), "读取节");
        Ok(data.to_vec())
    }

    fn name(&self) -> &str {
        "elf"
    }
}
