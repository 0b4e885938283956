//! 大数寄存器堆标签生成
//!
//! 寄存器堆 `logic [311:0] rf [32]` 综合后可能被展平为 `reg [9983:0] rf`。
//! 非打包维度 `[32]` 按大端解释 (等价于 `[0:31]`)，因此:
//!
//! ```text
//! w0  - rf[9983:9672]
//! w1  - rf[9671:9360]
//! ...
//! w31 - rf[ 311:   0]
//! ```

use thiserror::Error;
use tracing::{debug, warn};

/// 大数寄存器个数
pub const REGISTER_COUNT: u64 = 32;
/// 带 SECDED 校验位的寄存器宽度
pub const EXT_WIDTH: u64 = 8 * (32 + 7);

/// 致命的标签错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("第 {line} 行: 寄存器 w{index} 超出范围 (共 32 个)")]
    RegisterOutOfRange { line: usize, index: String },
    #[error("第 {line} 行: 子下标 {index} 过大")]
    QualifierIndexOverflow { line: usize, index: String },
}

/// 非致命的标签警告，附在对应的输出行上
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelWarning {
    /// 宽度或偏移超出寄存器范围，两者都回退为默认值
    GeometryOutOfRange { width: u64, offset: u64 },
    /// 该行不是寄存器标签，原样输出
    NoRegisterLabel,
}

/// 标签在寄存器中的宽度与偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelGeometry {
    pub width: u64,
    pub offset: u64,
}

impl Default for LabelGeometry {
    fn default() -> Self {
        Self {
            width: EXT_WIDTH,
            offset: 0,
        }
    }
}

impl LabelGeometry {
    /// 校验宽度与偏移，越界时回退为默认值并给出警告
    pub fn resolve(width: Option<u32>, offset: Option<u32>) -> (Self, Option<LabelWarning>) {
        let width = width.map_or(EXT_WIDTH, u64::from);
        let offset = offset.map_or(0, u64::from);

        if width < 1 || width > EXT_WIDTH || width + offset > EXT_WIDTH {
            let fallback = Self::default();
            warn!(
                width,
                offset,
                fallback_width = fallback.width,
                fallback_offset = fallback.offset,
                "标签宽度或偏移越界，使用默认值"
            );
            return (fallback, Some(LabelWarning::GeometryOutOfRange { width, offset }));
        }
        (Self { width, offset }, None)
    }
}

/// 单行输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    pub text: String,
    pub warning: Option<LabelWarning>,
}

/// 整个文件的输出
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelReport {
    pub lines: Vec<LabelLine>,
}

impl LabelReport {
    pub fn render(&self) -> String {
        self.lines.iter().map(|line| line.text.as_str()).collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = (usize, &LabelWarning)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| line.warning.as_ref().map(|w| (i, w)))
    }
}

/// `w<index>: <qualifier> [<subindex>]`
#[derive(Debug, Clone, PartialEq, Eq)]
struct RegisterLabel<'a> {
    index: &'a str,
    qualifier: &'a str,
    subindex: Option<&'a str>,
}

/// 匹配行首的 `w[0-9]+:\s*[a-z_]+\s*[0-9]*`
fn parse_label(line: &str) -> Option<RegisterLabel<'_>> {
    let rest = line.strip_prefix('w')?;
    let (index, rest) = split_while(rest, |c| c.is_ascii_digit());
    if index.is_empty() {
        return None;
    }
    let rest = rest.strip_prefix(':')?.trim_start();
    let (qualifier, rest) = split_while(rest, |c| c.is_ascii_lowercase() || c == '_');
    if qualifier.is_empty() {
        return None;
    }
    let (subindex, _) = split_while(rest.trim_start(), |c| c.is_ascii_digit());

    Some(RegisterLabel {
        index,
        qualifier,
        subindex: (!subindex.is_empty()).then_some(subindex),
    })
}

fn split_while(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

fn bit_range(msb: u64, lsb: u64, width: u64) -> String {
    if width > 1 {
        format!("[{msb}:{lsb}]")
    } else {
        format!("[{msb}]")
    }
}

/// 大数寄存器堆标签映射
#[derive(Debug, Clone)]
pub struct BignumLabelMapper {
    register_file_path: String,
    geometry: LabelGeometry,
}

impl BignumLabelMapper {
    pub fn new(register_file_path: impl Into<String>, geometry: LabelGeometry) -> Self {
        Self {
            register_file_path: register_file_path.into(),
            geometry,
        }
    }

    /// 寄存器 `index` 在展平向量中的 (msb, lsb)
    pub fn register_range(&self, index: u64) -> (u64, u64) {
        assert!(index < REGISTER_COUNT, "Register index out of range");
        let LabelGeometry { width, offset } = self.geometry;
        let base = (REGISTER_COUNT - index - 1) * EXT_WIDTH;
        (base + width + offset - 1, base + offset)
    }

    /// 子下标 `q` 在标签变量中的 (msb, lsb)
    pub fn qualifier_range(&self, subindex: u64) -> (u64, u64) {
        let width = self.geometry.width;
        ((subindex + 1) * width - 1, subindex * width)
    }

    /// 映射一行 (`number` 从 0 开始，仅用于诊断)
    pub fn map_line(&self, number: usize, line: &str) -> Result<LabelLine, LabelError> {
        let Some(label) = parse_label(line) else {
            warn!(line = number, text = line.trim_end(), "未找到寄存器标签，原样输出");
            return Ok(LabelLine {
                text: line.to_string(),
                warning: Some(LabelWarning::NoRegisterLabel),
            });
        };

        let index = label
            .index
            .parse::<u64>()
            .ok()
            .filter(|&i| i < REGISTER_COUNT)
            .ok_or_else(|| LabelError::RegisterOutOfRange {
                line: number,
                index: label.index.to_string(),
            })?;

        let width = self.geometry.width;
        let (msb, lsb) = self.register_range(index);
        let mut text = format!(
            "{}{} = {}",
            self.register_file_path,
            bit_range(msb, lsb, width),
            label.qualifier
        );

        if let Some(subindex) = label.subindex {
            let q = subindex
                .parse::<u64>()
                .ok()
                .filter(|q| q.checked_add(1).and_then(|n| n.checked_mul(width)).is_some())
                .ok_or_else(|| LabelError::QualifierIndexOverflow {
                    line: number,
                    index: subindex.to_string(),
                })?;
            let (q_msb, q_lsb) = self.qualifier_range(q);
            text.push_str(&bit_range(q_msb, q_lsb, width));
        }
        text.push('\n');

        debug!(line = number, text = text.trim_end(), "找到寄存器标签");
        Ok(LabelLine { text, warning: None })
    }

    /// 逐行映射，保持行序与原有换行符
    pub fn map_lines(&self, input: &str) -> Result<LabelReport, LabelError> {
        let lines = input
            .split_inclusive('\n')
            .enumerate()
            .map(|(number, line)| self.map_line(number, line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LabelReport { lines })
    }
}
