use anyhow::{self, Context};
use serde::Deserialize;
use std::path::Path;

/// 指令存储器字宽 (字节)
pub const INSTR_WORD_BYTES: usize = 4;
/// 数据存储器字宽 (字节)
pub const DATA_WORD_BYTES: usize = 32;

/// 网表中的存储器阵列名称
#[derive(Deserialize, Debug, Clone)]
pub struct MemoryConfig {
    #[serde(default = "default_imem_array")]
    pub imem_array: String,
    #[serde(default = "default_dmem_array")]
    pub dmem_array: String,
}

/// Verilator 信号命名
#[derive(Deserialize, Debug, Clone)]
pub struct SignalConfig {
    #[serde(default = "default_imem_prefix")]
    pub imem_prefix: String,
    #[serde(default = "default_dmem_prefix")]
    pub dmem_prefix: String,
    #[serde(default = "default_array_name")]
    pub array_name: String,
    /// Verilator 4.200 起成员名统一为小写
    #[serde(default)]
    pub verilator_at_least_4_200: bool,
}

/// 大数寄存器堆标签
#[derive(Deserialize, Debug, Clone)]
pub struct LabelConfig {
    #[serde(default = "default_register_file_path")]
    pub register_file_path: String,
    pub width: Option<u32>,
    pub offset: Option<u32>,
}

fn default_imem_array() -> String {
    "u_imem.mem".to_string()
}

fn default_dmem_array() -> String {
    "u_dmem.mem".to_string()
}

fn default_imem_prefix() -> String {
    "otbn_top_coco__DOT__u_imem".to_string()
}

fn default_dmem_prefix() -> String {
    "otbn_top_coco__DOT__u_dmem".to_string()
}

fn default_array_name() -> String {
    "mem".to_string()
}

fn default_register_file_path() -> String {
    "u_otbn_core.u_otbn_rf_bignum.gen_rf_bignum_ff.u_otbn_rf_bignum_inner.rf".to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            imem_array: default_imem_array(),
            dmem_array: default_dmem_array(),
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            imem_prefix: default_imem_prefix(),
            dmem_prefix: default_dmem_prefix(),
            array_name: default_array_name(),
            verilator_at_least_4_200: false,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            register_file_path: default_register_file_path(),
            width: None,
            offset: None,
        }
    }
}

/// 信号命名约定，不同 Verilator 版本生成的成员名大小写不同
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    /// Verilator < 4.200，保留编码字符的大写形式
    Legacy,
    /// Verilator >= 4.200，全部小写
    Lowercase,
}

impl NamingConvention {
    pub fn from_verilator_at_least_4_200(at_least_4_200: bool) -> Self {
        if at_least_4_200 {
            NamingConvention::Lowercase
        } else {
            NamingConvention::Legacy
        }
    }
}

/// 主配置（来自 profile/config.toml），所有字段均有 OTBN 默认值
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PrepConfig {
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub labels: LabelConfig,
}

impl PrepConfig {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<PrepConfig> {
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取配置文件: {:?}", &path.as_ref().as_os_str()))?;
        let config: PrepConfig = toml::from_str(&toml_str)
            .with_context(|| format!("无法解析配置文件: {:?}", &path.as_ref().as_os_str()))?;
        anyhow::Ok(config)
    }

    /// 加载配置文件，未指定时使用默认值
    pub fn load(path: Option<&str>) -> anyhow::Result<PrepConfig> {
        match path {
            Some(path) => Self::new(path),
            None => anyhow::Ok(PrepConfig::default()),
        }
    }

    pub fn naming_convention(&self) -> NamingConvention {
        NamingConvention::from_verilator_at_least_4_200(self.signals.verilator_at_least_4_200)
    }
}
