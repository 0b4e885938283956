//! 文本模板占位符替换

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("模板中缺少占位符 {0}")]
    MissingPlaceholder(&'static str),
}

pub const VCD_PATH: &str = "{VCD_PATH}";

/// 替换全部 `placeholder`，模板中必须至少出现一次
pub fn fill(template: &str, placeholder: &'static str, value: &str) -> Result<String, TemplateError> {
    if !template.contains(placeholder) {
        return Err(TemplateError::MissingPlaceholder(placeholder));
    }
    Ok(template.replace(placeholder, value))
}

/// Verilator 测试平台，写出的 VCD 路径由 `{VCD_PATH}` 指定
pub fn render_testbench(template: &str, vcd_path: &str) -> Result<String, TemplateError> {
    fill(template, VCD_PATH, vcd_path)
}
