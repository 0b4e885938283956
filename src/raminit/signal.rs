//! Verilator 信号名生成
//!
//! Verilator 把层次名中的特殊字符编码为 `__0XX` 形式，
//! 例如 `u_imem.mem[3]` 在 `otbn_top_coco` 中对应成员
//! `otbn_top_coco__DOT__u_imem__02Emem__05B3__05D`

use crate::const_values::{NamingConvention, SignalConfig};

/// `.` 的编码
const DOT_TOKEN: &str = "__02E";
/// `[` 的编码
const OPEN_BRACKET_TOKEN: &str = "__05B";
/// `]` 的编码
const CLOSE_BRACKET_TOKEN: &str = "__05D";

#[derive(Debug, Clone)]
pub struct SignalNameMapper {
    imem_prefix: String,
    dmem_prefix: String,
    array_name: String,
    convention: NamingConvention,
}

impl SignalNameMapper {
    pub fn new(config: &SignalConfig, convention: NamingConvention) -> Self {
        Self {
            imem_prefix: config.imem_prefix.clone(),
            dmem_prefix: config.dmem_prefix.clone(),
            array_name: config.array_name.clone(),
            convention,
        }
    }

    /// 指令存储器第 `word` 个字
    pub fn instr_word(&self, word: usize) -> String {
        let element = self.element(word);
        format!("{}{}", self.imem_prefix, self.apply_convention(element))
    }

    /// 数据存储器第 `word` 个字的第 `chunk` 个 32 位片段
    pub fn data_chunk(&self, word: usize, chunk: usize) -> String {
        let element = format!("{}[{}]", self.element(word), chunk);
        format!("{}{}", self.dmem_prefix, self.apply_convention(element))
    }

    fn element(&self, word: usize) -> String {
        format!(
            "{DOT_TOKEN}{}{OPEN_BRACKET_TOKEN}{word}{CLOSE_BRACKET_TOKEN}",
            self.array_name
        )
    }

    fn apply_convention(&self, element: String) -> String {
        match self.convention {
            NamingConvention::Legacy => element,
            NamingConvention::Lowercase => element.to_lowercase(),
        }
    }
}
