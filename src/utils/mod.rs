//! 工具模块

pub mod bit_utils;
mod elf;
mod objdump;
mod output;

pub use elf::ElfSectionReader;
pub use objdump::{MAX_HEADER_LINES, ObjdumpReader, extract_section_bytes};
pub use output::write_atomic;
