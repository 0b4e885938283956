//! 存储器初始化映像生成模块
//!
//! 节字节 -> 容量检查 -> SECDED 编码 -> Verilator 成员赋值

pub mod netlist;
pub mod secded;
pub mod signal;

use section_reader::{SectionError, SectionReader};
use thiserror::Error;
use tracing::{debug, info};

use crate::const_values::PrepConfig;
pub use netlist::{MemoryLimits, MemoryRegion, NetlistError, RegionKind};
use secded::{BLOCK_CHUNKS, block_payload, encode_block, encode_word, word_payload};
pub use signal::SignalNameMapper;

/// 映像生成错误
#[derive(Debug, Error)]
pub enum RamInitError {
    #[error(transparent)]
    Netlist(#[from] NetlistError),
    #[error("读取节 {section} 失败: {source}")]
    Section {
        section: &'static str,
        #[source]
        source: SectionError,
    },
    #[error("{section} 节过大: {len} 字节 (上限 {limit} 字节)")]
    CapacityExceeded {
        section: &'static str,
        len: usize,
        limit: usize,
    },
}

/// 一条成员赋值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalAssignment {
    pub path: String,
    pub value: u64,
}

/// 按顺序排列的全部赋值，指令在前，数据在后
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RamImage {
    pub assignments: Vec<SignalAssignment>,
}

const FUNCTION_HEADER: &str = "void load_prog(Testbench<Vcircuit>* tb) {\n";
const RESET_STATEMENT: &str = "  tb->reset();\n";
const FUNCTION_FOOTER: &str = "}\n";

impl RamImage {
    /// 生成 `ram_init.h` 内容
    pub fn render(&self) -> String {
        let mut out = String::from(FUNCTION_HEADER);
        for assignment in &self.assignments {
            out.push_str(&format!(
                "  tb->m_core->{} = {:#x};\n",
                assignment.path, assignment.value
            ));
        }
        out.push_str(RESET_STATEMENT);
        out.push_str(FUNCTION_FOOTER);
        out
    }
}

/// 存储器映像生成器
pub struct RamInitEmitter {
    limits: MemoryLimits,
    names: SignalNameMapper,
}

impl RamInitEmitter {
    pub fn new(limits: MemoryLimits, config: &PrepConfig) -> Self {
        Self {
            limits,
            names: SignalNameMapper::new(&config.signals, config.naming_convention()),
        }
    }

    /// 从读取器取出 `.text` 与 `.data` 并生成映像
    pub fn emit_from(&self, reader: &dyn SectionReader) -> Result<RamImage, RamInitError> {
        let text = read(reader, RegionKind::Instruction.section())?;
        let data = read(reader, RegionKind::Data.section())?;
        info!(reader = reader.name(), text_bytes = text.len(), data_bytes = data.len(), "读取节完成");
        self.emit(&text, &data)
    }

    /// 两个区域都通过容量检查后才开始生成赋值
    pub fn emit(&self, text: &[u8], data: &[u8]) -> Result<RamImage, RamInitError> {
        check_capacity(&self.limits.instr, text.len())?;
        check_capacity(&self.limits.data, data.len())?;

        let instr_width = self.limits.instr.word_width_bytes;
        let data_width = self.limits.data.word_width_bytes;
        let mut assignments = Vec::with_capacity(
            text.len().div_ceil(instr_width) + data.len().div_ceil(data_width) * BLOCK_CHUNKS,
        );

        for (word, chunk) in text.chunks(instr_width).enumerate() {
            let encoded = encode_word(word_payload(chunk));
            assignments.push(SignalAssignment {
                path: self.names.instr_word(word),
                value: encoded.value(),
            });
        }

        for (word, chunk) in data.chunks(data_width).enumerate() {
            let encoded = encode_block(&block_payload(chunk));
            for (index, value) in encoded.chunks().into_iter().enumerate() {
                assignments.push(SignalAssignment {
                    path: self.names.data_chunk(word, index),
                    value: value as u64,
                });
            }
        }

        debug!(assignments = assignments.len(), "生成赋值");
        Ok(RamImage { assignments })
    }
}

fn read(reader: &dyn SectionReader, section: &'static str) -> Result<Vec<u8>, RamInitError> {
    reader
        .read_section(section)
        .map_err(|source| RamInitError::Section { section, source })
}

fn check_capacity(region: &MemoryRegion, len: usize) -> Result<(), RamInitError> {
    let limit = region.capacity_bytes();
    if len > limit {
        return Err(RamInitError::CapacityExceeded {
            section: region.kind.section(),
            len,
            limit,
        });
    }
    Ok(())
}
