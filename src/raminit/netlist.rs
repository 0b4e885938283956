//! 从综合网表中读取存储器容量

use thiserror::Error;
use tracing::info;

use crate::const_values::{DATA_WORD_BYTES, INSTR_WORD_BYTES, MemoryConfig};

/// 网表解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetlistError {
    #[error("网表中没有找到存储器阵列 `{array}` 的元素引用")]
    NoMatches { array: String },
    #[error("存储器阵列 `{array}` 的下标过大: {index}")]
    IndexOverflow { array: String, index: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Instruction,
    Data,
}

impl RegionKind {
    pub fn section(self) -> &'static str {
        match self {
            RegionKind::Instruction => ".text",
            RegionKind::Data => ".data",
        }
    }
}

/// 存储器区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub kind: RegionKind,
    pub word_width_bytes: usize,
    pub capacity_words: usize,
}

impl MemoryRegion {
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_words * self.word_width_bytes
    }
}

/// 指令与数据存储器的容量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimits {
    pub instr: MemoryRegion,
    pub data: MemoryRegion,
}

impl MemoryLimits {
    /// 解析网表文本，两个阵列都必须至少出现一次
    pub fn from_netlist(netlist: &str, config: &MemoryConfig) -> Result<Self, NetlistError> {
        let instr_words = capacity_words(netlist, &config.imem_array)?;
        info!(array = %config.imem_array, words = instr_words, "指令存储器容量");
        let data_words = capacity_words(netlist, &config.dmem_array)?;
        info!(array = %config.dmem_array, words = data_words, "数据存储器容量");

        Ok(Self {
            instr: MemoryRegion {
                kind: RegionKind::Instruction,
                word_width_bytes: INSTR_WORD_BYTES,
                capacity_words: instr_words,
            },
            data: MemoryRegion {
                kind: RegionKind::Data,
                word_width_bytes: DATA_WORD_BYTES,
                capacity_words: data_words,
            },
        })
    }
}

/// 最大引用下标 + 1
pub fn capacity_words(netlist: &str, array: &str) -> Result<usize, NetlistError> {
    let mut max_index: Option<usize> = None;
    for digits in indexed_refs(netlist, array) {
        let index = digits.parse::<usize>().map_err(|_| NetlistError::IndexOverflow {
            array: array.to_string(),
            index: digits.to_string(),
        })?;
        max_index = Some(max_index.map_or(index, |max| max.max(index)));
    }

    let max_index = max_index.ok_or_else(|| NetlistError::NoMatches {
        array: array.to_string(),
    })?;
    max_index.checked_add(1).ok_or_else(|| NetlistError::IndexOverflow {
        array: array.to_string(),
        index: max_index.to_string(),
    })
}

/// 找出所有 `<array>[<digits>]`，返回下标数字串
///
/// 阵列名中的 `.` 匹配任意单个字符
fn indexed_refs<'a>(text: &'a str, array: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let bytes = text.as_bytes();
    let pattern = array.as_bytes();
    let mut pos = 0;

    std::iter::from_fn(move || {
        while pos + pattern.len() < bytes.len() {
            let start = pos;
            pos += 1;
            if !matches_at(&bytes[start..], pattern) {
                continue;
            }

            let open = start + pattern.len();
            if bytes[open] != b'[' {
                continue;
            }
            let digits_start = open + 1;
            let digits_len = bytes[digits_start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let close = digits_start + digits_len;
            if digits_len == 0 || bytes.get(close) != Some(&b']') {
                continue;
            }

            pos = close + 1;
            return Some(&text[digits_start..close]);
        }
        None
    })
}

fn matches_at(haystack: &[u8], pattern: &[u8]) -> bool {
    haystack.len() >= pattern.len()
        && pattern
            .iter()
            .zip(haystack)
            .all(|(&p, &h)| p == b'.' || p == h)
}
