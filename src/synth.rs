//! yosys 综合脚本生成

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::template::{TemplateError, fill};

const READ_FILES: &str = "{READ_FILES}";
const TOP_MODULE: &str = "{TOP_MODULE}";
const JSON_FILE_PATH: &str = "{JSON_FILE_PATH}";
const NETLIST_FILE_PATH: &str = "{NETLIST_FILE_PATH}";

/// 自 0.9+3470 起 `opt` 默认会合并使能/同步复位触发器
const OPT_FLAGS_SINCE: YosysVersion = YosysVersion {
    major: 0,
    minor: 9,
    patch: 3470,
};
const OPT_WITH_FLAGS: &str = "opt -nodffe -nosdff";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthError {
    #[error("无法识别 yosys 版本: {0:?}")]
    UnknownVersion(String),
    #[error("源文件路径无效 {path:?}: {reason}")]
    SourcePath { path: PathBuf, reason: String },
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YosysVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl YosysVersion {
    /// 解析 `yosys -V` 的输出，例如 `Yosys 0.9+3470 (git sha1 ...)`
    ///
    /// 没有补丁号时视为 0
    pub fn parse(text: &str) -> Result<Self, SynthError> {
        let unknown = || SynthError::UnknownVersion(text.trim().to_string());

        let start = text.find("Yosys ").ok_or_else(unknown)? + "Yosys ".len();
        let rest = &text[start..];

        let (major, rest) = leading_number(rest).ok_or_else(unknown)?;
        let rest = rest.strip_prefix('.').ok_or_else(unknown)?;
        let (minor, rest) = leading_number(rest).ok_or_else(unknown)?;
        let patch = rest
            .strip_prefix('+')
            .and_then(leading_number)
            .map_or(0, |(patch, _)| patch);

        Ok(Self { major, minor, patch })
    }

    /// 是否需要给 `opt` 加上 `-nodffe -nosdff`
    pub fn needs_opt_flags(&self) -> bool {
        *self >= OPT_FLAGS_SINCE
    }
}

fn leading_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// 脚本模板所需的输入
#[derive(Debug, Clone)]
pub struct SynthInputs<'a> {
    pub sources: &'a [PathBuf],
    pub top_module: &'a str,
    pub json_path: &'a Path,
    pub netlist_path: &'a Path,
}

/// 填充模板中的四个占位符
pub fn render_script(template: &str, inputs: &SynthInputs<'_>) -> Result<String, SynthError> {
    let mut read_files = Vec::with_capacity(inputs.sources.len());
    for source in inputs.sources {
        let path = std::path::absolute(source).map_err(|e| SynthError::SourcePath {
            path: source.clone(),
            reason: e.to_string(),
        })?;
        read_files.push(format!("read_verilog {};", path.display()));
    }
    let read_files = read_files.join("\n") + "\n";

    let script = fill(template, READ_FILES, &read_files)?;
    let script = fill(&script, TOP_MODULE, inputs.top_module)?;
    let script = fill(&script, JSON_FILE_PATH, &inputs.json_path.display().to_string())?;
    let script = fill(&script, NETLIST_FILE_PATH, &inputs.netlist_path.display().to_string())?;
    Ok(script)
}

/// 把每个独立的 `opt` 命令改为 `opt -nodffe -nosdff`，`opt_clean` 等命令不变
pub fn patch_opt_passes(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut copied = 0;
    for (pos, _) in script.match_indices("opt") {
        let end = pos + "opt".len();
        let before = script[..pos].chars().next_back();
        let after = script[end..].chars().next();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            continue;
        }
        out.push_str(&script[copied..pos]);
        out.push_str(OPT_WITH_FLAGS);
        copied = end;
    }
    out.push_str(&script[copied..]);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// 生成最终脚本，按 yosys 版本决定是否修补 `opt`
pub fn build_script(
    template: &str,
    inputs: &SynthInputs<'_>,
    version: &YosysVersion,
) -> Result<String, SynthError> {
    let script = render_script(template, inputs)?;
    if version.needs_opt_flags() {
        info!(?version, "yosys 版本较新，为 opt 添加 -nodffe -nosdff");
        return Ok(patch_opt_passes(&script));
    }
    Ok(script)
}
