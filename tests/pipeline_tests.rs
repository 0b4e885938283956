// 端到端测试：读取输入文件，写出 ram_init.h / 标签文件 / 综合脚本

use std::fs;
use std::path::Path;

use alma_prep::const_values::PrepConfig;
use alma_prep::raminit::{MemoryLimits, RamInitEmitter};
use alma_prep::utils::{ElfSectionReader, ObjdumpReader};
use alma_prep::{LabelArgs, RaminitArgs, SynthArgs, run_labels, run_raminit, run_synth_script};
use object::write::Object;
use object::{Architecture, BinaryFormat, Endianness, SectionKind};
use section_reader::SectionReader;
use tempfile::tempdir;

const NETLIST: &str = "\
module otbn_top_coco(clk_i, rst_ni);
  reg [38:0] \\u_imem.mem[0] ;
  reg [38:0] \\u_imem.mem[1] ;
  reg [311:0] \\u_dmem.mem[0] ;
endmodule
";

const TEXT_DUMP: &str = "
otbn_program.elf:     file format elf32-littleriscv

Contents of section .text:
 0000 13050000 a320001c                    ........
";

const DATA_DUMP: &str = "
otbn_program.elf:     file format elf32-littleriscv

Contents of section .data:
 0000 00010203 04050607 08090a0b 0c0d0e0f  ................
 0010 10111213 14151617 18191a1b 1c1d1e1f  ................
";

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn raminit_args(dir: &Path, text_dump: &str, data_dump: Option<&str>) -> RaminitArgs {
    RaminitArgs {
        netlist: write(dir, "circuit.v", NETLIST),
        elf: None,
        text_dump: Some(write(dir, "text.txt", text_dump)),
        data_dump: data_dump.map(|dump| write(dir, "data.txt", dump)),
        build_dir: dir.to_string_lossy().into_owned(),
        testbench_template: None,
    }
}

#[test]
fn test_raminit_writes_header() {
    let dir = tempdir().unwrap();
    let args = raminit_args(dir.path(), TEXT_DUMP, Some(DATA_DUMP));
    run_raminit(&PrepConfig::default(), &args).unwrap();

    let header = fs::read_to_string(dir.path().join("ram_init.h")).unwrap();
    let expected = "\
void load_prog(Testbench<Vcircuit>* tb) {
  tb->m_core->otbn_top_coco__DOT__u_imem__02Emem__05B0__05D = 0x7100000513;
  tb->m_core->otbn_top_coco__DOT__u_imem__02Emem__05B1__05D = 0x41c0020a3;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[0] = 0x3020100;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[1] = 0x8302825b;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[2] = 0x82423a83;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[3] = 0xa18982c2;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[4] = 0x101e1c1;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[5] = 0xc1312111;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[6] = 0xb8b0a8a1;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[7] = 0x68646190;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[8] = 0x3a39846c;
  tb->m_core->otbn_top_coco__DOT__u_dmem__02Emem__05B0__05D[9] = 0x9e3e3c;
  tb->reset();
}
";
    assert_eq!(header, expected);
}

#[test]
fn test_raminit_is_reproducible() {
    let dir = tempdir().unwrap();
    let args = raminit_args(dir.path(), TEXT_DUMP, Some(DATA_DUMP));
    run_raminit(&PrepConfig::default(), &args).unwrap();
    let first = fs::read(dir.path().join("ram_init.h")).unwrap();
    run_raminit(&PrepConfig::default(), &args).unwrap();
    let second = fs::read(dir.path().join("ram_init.h")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_text_over_capacity_writes_nothing() {
    let dir = tempdir().unwrap();
    let too_long = "
p.elf:     file format elf32-littleriscv

Contents of section .text:
 0000 13050000 13050000 13050000           ............
";
    let args = raminit_args(dir.path(), too_long, None);
    let err = run_raminit(&PrepConfig::default(), &args).unwrap_err();
    assert!(err.to_string().contains(".text"));
    assert!(!dir.path().join("ram_init.h").exists());
}

#[test]
fn test_data_over_capacity_writes_nothing() {
    let dir = tempdir().unwrap();
    let mut data_dump = String::from(DATA_DUMP);
    data_dump.push_str(" 0020 20212223                             !\"#$\n");
    let args = raminit_args(dir.path(), TEXT_DUMP, Some(&data_dump));
    assert!(run_raminit(&PrepConfig::default(), &args).is_err());
    assert!(!dir.path().join("ram_init.h").exists());
}

#[test]
fn test_netlist_without_memories() {
    let dir = tempdir().unwrap();
    let mut args = raminit_args(dir.path(), TEXT_DUMP, None);
    args.netlist = write(dir.path(), "empty.v", "module empty; endmodule\n");
    assert!(run_raminit(&PrepConfig::default(), &args).is_err());
    assert!(!dir.path().join("ram_init.h").exists());
}

#[test]
fn test_raminit_with_testbench() {
    let dir = tempdir().unwrap();
    let mut args = raminit_args(dir.path(), TEXT_DUMP, None);
    args.testbench_template = Some(write(
        dir.path(),
        "tb_template.txt",
        "#include \"ram_init.h\"\nconst char* vcd = \"{VCD_PATH}\";\n",
    ));
    let mut config = PrepConfig::default();
    config.signals.verilator_at_least_4_200 = true;
    run_raminit(&config, &args).unwrap();

    let header = fs::read_to_string(dir.path().join("ram_init.h")).unwrap();
    assert!(header.contains("otbn_top_coco__DOT__u_imem__02emem__05b1__05d = 0x41c0020a3;"));

    let testbench = fs::read_to_string(dir.path().join("verilator_tb.c")).unwrap();
    let vcd = dir.path().join("circuit.vcd");
    assert_eq!(
        testbench,
        format!("#include \"ram_init.h\"\nconst char* vcd = \"{}\";\n", vcd.display())
    );
}

#[test]
fn test_bad_testbench_template_writes_nothing() {
    let dir = tempdir().unwrap();
    let mut args = raminit_args(dir.path(), TEXT_DUMP, Some(DATA_DUMP));
    args.testbench_template = Some(write(dir.path(), "tb_template.txt", "int main() {}\n"));
    assert!(run_raminit(&PrepConfig::default(), &args).is_err());
    assert!(!dir.path().join("ram_init.h").exists());
    assert!(!dir.path().join("verilator_tb.c").exists());
}

/// 与 TEXT_DUMP / DATA_DUMP 内容相同的 ELF
fn program_elf() -> Vec<u8> {
    let text = [0x13, 0x05, 0x00, 0x00, 0xa3, 0x20, 0x00, 0x1c];
    let data: Vec<u8> = (0..32).collect();
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::Riscv32, Endianness::Little);
    let text_id = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.append_section_data(text_id, &text, 4);
    let data_id = obj.add_section(Vec::new(), b".data".to_vec(), SectionKind::Data);
    obj.append_section_data(data_id, &data, 32);
    obj.write().unwrap()
}

#[test]
fn test_elf_and_objdump_agree() {
    let elf = ElfSectionReader::new(program_elf());
    let dump = ObjdumpReader::new()
        .with_dump(".text", TEXT_DUMP)
        .with_dump(".data", DATA_DUMP);
    for section in [".text", ".data"] {
        assert_eq!(elf.read_section(section).unwrap(), dump.read_section(section).unwrap());
    }

    let config = PrepConfig::default();
    let emit = |reader: &dyn SectionReader| {
        let limits = MemoryLimits::from_netlist(NETLIST, &config.memory).unwrap();
        RamInitEmitter::new(limits, &config).emit_from(reader).unwrap()
    };
    assert_eq!(emit(&elf).render(), emit(&dump).render());
}

#[test]
fn test_raminit_from_elf() {
    let dir = tempdir().unwrap();
    let elf_path = dir.path().join("otbn_program.elf");
    fs::write(&elf_path, program_elf()).unwrap();

    let from_dump = tempdir().unwrap();
    run_raminit(
        &PrepConfig::default(),
        &raminit_args(from_dump.path(), TEXT_DUMP, Some(DATA_DUMP)),
    )
    .unwrap();

    let args = RaminitArgs {
        netlist: write(dir.path(), "circuit.v", NETLIST),
        elf: Some(elf_path.to_string_lossy().into_owned()),
        text_dump: None,
        data_dump: None,
        build_dir: dir.path().to_string_lossy().into_owned(),
        testbench_template: None,
    };
    run_raminit(&PrepConfig::default(), &args).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("ram_init.h")).unwrap(),
        fs::read_to_string(from_dump.path().join("ram_init.h")).unwrap()
    );
}

#[test]
fn test_labels_file() {
    let dir = tempdir().unwrap();
    let input = write(
        dir.path(),
        "labels_in.txt",
        "# bignum labels\nw0: secret 3\nw31: mask\n",
    );
    let output = dir.path().join("labels_out.txt");
    let args = LabelArgs {
        input_file: input,
        output_file: output.to_string_lossy().into_owned(),
        width: Some(8),
        offset: None,
    };
    run_labels(&PrepConfig::default(), &args).unwrap();

    let rf = "u_otbn_core.u_otbn_rf_bignum.gen_rf_bignum_ff.u_otbn_rf_bignum_inner.rf";
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!("# bignum labels\n{rf}[9679:9672] = secret[31:24]\n{rf}[7:0] = mask\n")
    );
}

#[test]
fn test_labels_out_of_range_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "labels_in.txt", "w0: a\nw32: b\n");
    let output = dir.path().join("labels_out.txt");
    let args = LabelArgs {
        input_file: input,
        output_file: output.to_string_lossy().into_owned(),
        width: None,
        offset: None,
    };
    assert!(run_labels(&PrepConfig::default(), &args).is_err());
    assert!(!output.exists());
}

#[test]
fn test_synth_script() {
    let dir = tempdir().unwrap();
    let template = write(
        dir.path(),
        "yosys_synth_template.txt",
        "{READ_FILES}hierarchy -top {TOP_MODULE};\nopt; opt_clean;\nwrite_json {JSON_FILE_PATH};\nwrite_verilog {NETLIST_FILE_PATH};\n",
    );
    let source = dir.path().join("otbn.sv");
    let output = dir.path().join("yosys_synth.ys");
    let args = SynthArgs {
        sources: vec![source.clone()],
        top_module: "otbn_top_coco".to_string(),
        template,
        yosys_version: "Yosys 0.9+3470 (git sha1 abc)".to_string(),
        json: dir.path().join("circuit.json"),
        netlist: dir.path().join("circuit.v"),
        output: output.clone(),
    };
    run_synth_script(&args).unwrap();

    let script = fs::read_to_string(&output).unwrap();
    assert!(script.starts_with(&format!("read_verilog {};\n", source.display())));
    assert!(script.contains("hierarchy -top otbn_top_coco;"));
    assert!(script.contains("opt -nodffe -nosdff; opt_clean;"));
}
