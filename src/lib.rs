//! OTBN Coco-Alma 仿真准备工具库
pub mod const_values;
pub mod labels;
pub mod raminit;
pub mod synth;
pub mod template;
pub mod utils;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use section_reader::SectionReader;
use tracing::{info, warn};

use const_values::PrepConfig;
use labels::{BignumLabelMapper, LabelGeometry};
use raminit::{MemoryLimits, RamInitEmitter};
use utils::{ElfSectionReader, ObjdumpReader, write_atomic};

/// OTBN Coco-Alma 仿真准备工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 配置文件地址，不指定时使用内置默认值
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 生成 SECDED 编码的存储器初始化文件 ram_init.h
    Raminit(RaminitArgs),
    /// 把大数寄存器标签映射为寄存器堆位范围
    Labels(LabelArgs),
    /// 生成 yosys 综合脚本
    SynthScript(SynthArgs),
}

#[derive(clap::Args, Debug)]
pub struct RaminitArgs {
    /// 综合网表路径
    #[arg(short, long)]
    pub netlist: String,

    /// ELF文件路径
    #[arg(short, long, conflicts_with_all = ["text_dump", "data_dump"], required_unless_present = "text_dump")]
    pub elf: Option<String>,

    /// `objdump -s -j .text` 的输出
    #[arg(long)]
    pub text_dump: Option<String>,

    /// `objdump -s -j .data` 的输出
    #[arg(long, requires = "text_dump")]
    pub data_dump: Option<String>,

    /// 输出目录
    #[arg(short, long, default_value = "tmp")]
    pub build_dir: String,

    /// Verilator 测试平台模板
    #[arg(short, long)]
    pub testbench_template: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct LabelArgs {
    /// 输入标签文件
    #[arg(short, long)]
    pub input_file: String,

    /// 输出标签文件
    #[arg(short, long)]
    pub output_file: String,

    /// 标签变量宽度，默认为 ExtWLEN
    #[arg(short, long)]
    pub width: Option<u32>,

    /// 标签变量在寄存器中的偏移，默认为 0
    #[arg(short = 's', long)]
    pub offset: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct SynthArgs {
    /// Verilog / SystemVerilog 源文件
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// 顶层模块名
    #[arg(short, long = "top")]
    pub top_module: String,

    /// yosys 脚本模板
    #[arg(long)]
    pub template: String,

    /// `yosys -V` 的输出
    #[arg(long)]
    pub yosys_version: String,

    /// 综合后 JSON 路径
    #[arg(short, long)]
    pub json: PathBuf,

    /// 综合后网表路径
    #[arg(short, long)]
    pub netlist: PathBuf,

    /// 输出脚本路径
    #[arg(short, long)]
    pub output: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    let config = PrepConfig::load(args.config.as_deref())?;
    match args.command {
        Command::Raminit(raminit) => run_raminit(&config, &raminit),
        Command::Labels(labels) => run_labels(&config, &labels),
        Command::SynthScript(synth) => run_synth_script(&synth),
    }
}

fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).with_context(|| format!("无法读取文件 {:?}", path))
}

pub fn run_raminit(config: &PrepConfig, args: &RaminitArgs) -> Result<()> {
    info!(netlist = %args.netlist, build_dir = %args.build_dir, "生成存储器初始化文件");

    let netlist = read_text(&args.netlist)?;
    let limits = MemoryLimits::from_netlist(&netlist, &config.memory)
        .with_context(|| format!("无法从网表 '{}' 获取存储器容量", args.netlist))?;

    let reader: Box<dyn SectionReader> = match (&args.elf, &args.text_dump) {
        (Some(elf), _) => {
            info!(path = %elf, "从ELF文件读取节");
            Box::new(ElfSectionReader::open(elf)?)
        }
        (None, Some(text_dump)) => {
            let mut reader = ObjdumpReader::new().with_dump(".text", read_text(text_dump)?);
            if let Some(data_dump) = &args.data_dump {
                reader = reader.with_dump(".data", read_text(data_dump)?);
            }
            Box::new(reader)
        }
        (None, None) => anyhow::bail!("需要指定 --elf 或 --text-dump"),
    };

    let image = RamInitEmitter::new(limits, config).emit_from(reader.as_ref())?;

    let build_dir = Path::new(&args.build_dir);
    let vcd_path = build_dir.join("circuit.vcd");
    // 所有输出生成成功后才写文件
    let testbench = match &args.testbench_template {
        Some(template_path) => {
            let template = read_text(template_path)?;
            let testbench = template::render_testbench(&template, &vcd_path.display().to_string())
                .with_context(|| format!("测试平台模板 '{}' 无效", template_path))?;
            Some(testbench)
        }
        None => None,
    };

    let header_path = build_dir.join("ram_init.h");
    write_atomic(&header_path, &image.render())?;
    info!(path = %header_path.display(), assignments = image.assignments.len(), "写入 ram_init.h");

    if let Some(testbench) = testbench {
        let tb_path = build_dir.join("verilator_tb.c");
        write_atomic(&tb_path, &testbench)?;
        info!(path = %tb_path.display(), vcd = %vcd_path.display(), "写入测试平台");
    }

    Ok(())
}

pub fn run_labels(config: &PrepConfig, args: &LabelArgs) -> Result<()> {
    let width = args.width.or(config.labels.width);
    let offset = args.offset.or(config.labels.offset);
    let (geometry, _) = LabelGeometry::resolve(width, offset);
    info!(width = geometry.width, offset = geometry.offset, "标签几何参数");

    let input = read_text(&args.input_file)?;
    let mapper = BignumLabelMapper::new(config.labels.register_file_path.clone(), geometry);
    let report = mapper
        .map_lines(&input)
        .with_context(|| format!("无法处理标签文件 '{}'", args.input_file))?;

    let warnings = report.warnings().count();
    if warnings > 0 {
        warn!(warnings, "部分行未被映射");
    }
    write_atomic(&args.output_file, &report.render())?;
    info!(path = %args.output_file, lines = report.lines.len(), "写入标签文件");
    Ok(())
}

pub fn run_synth_script(args: &SynthArgs) -> Result<()> {
    let version = synth::YosysVersion::parse(&args.yosys_version)?;
    let template = read_text(&args.template)?;
    let inputs = synth::SynthInputs {
        sources: &args.sources,
        top_module: &args.top_module,
        json_path: &args.json,
        netlist_path: &args.netlist,
    };
    let script = synth::build_script(&template, &inputs, &version)
        .with_context(|| format!("无法生成综合脚本 (模板 '{}')", args.template))?;
    write_atomic(&args.output, &script)?;
    info!(path = %args.output.display(), ?version, "写入综合脚本");
    Ok(())
}
