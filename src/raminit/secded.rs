//! SECDED 编码 (OpenTitan `enc_secded_inv_39_32`)
//!
//! 系统码：奇偶校验位追加在数据位之上，低 32 位始终等于原始数据

use crate::utils::bit_utils::{BitSlice, WideBits, xor_reduce};

/// 每个校验位的 (数据掩码, 极性)，校验位 i 位于第 32 + i 位
const PARITY_TERMS: [(u32, bool); 7] = [
    (0x2606_bd25, false),
    (0xdeba_8050, true),
    (0x413d_89aa, false),
    (0x3123_4ed1, true),
    (0xc2c1_323b, false),
    (0x2dcc_624c, true),
    (0x9850_5586, false),
];

/// 数据块中 32 位数据字的个数
pub const BLOCK_WORDS: usize = 8;
/// 编码后数据块拆分出的 32 位片段个数
pub const BLOCK_CHUNKS: usize = 10;

/// 39 位码字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedWord(u64);

impl EncodedWord {
    pub const PAYLOAD_BITS: usize = 32;
    pub const PARITY_BITS: usize = 7;
    pub const WIDTH: usize = Self::PAYLOAD_BITS + Self::PARITY_BITS;

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn payload(self) -> u32 {
        self.0.bit_range(0..Self::PAYLOAD_BITS) as u32
    }

    pub fn parity(self) -> u8 {
        self.0.bit_range(Self::PAYLOAD_BITS..Self::WIDTH) as u8
    }
}

/// 312 位码块：8 个 39 位码字首尾相接，码字 0 位于最低位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedBlock {
    bits: WideBits<5>,
}

impl EncodedBlock {
    pub const PAYLOAD_BITS: usize = BLOCK_WORDS * EncodedWord::PAYLOAD_BITS;
    pub const WIDTH: usize = BLOCK_WORDS * EncodedWord::WIDTH;

    /// 第 i 个 39 位码字
    pub fn codeword(&self, index: usize) -> EncodedWord {
        assert!(index < BLOCK_WORDS, "Codeword index out of bounds");
        EncodedWord(self.bits.field(index * EncodedWord::WIDTH, EncodedWord::WIDTH))
    }

    /// 第 i 个 32 位片段，即位 [32i, 32i + 31]；最后一个片段只有低 24 位有效
    pub fn chunk(&self, index: usize) -> u32 {
        assert!(index < BLOCK_CHUNKS, "Chunk index out of bounds");
        self.bits.field(index * 32, 32) as u32
    }

    pub fn chunks(&self) -> [u32; BLOCK_CHUNKS] {
        std::array::from_fn(|i| self.chunk(i))
    }
}

/// 将 32 位数据扩展为 39 位码字
pub fn encode_word(payload: u32) -> EncodedWord {
    let mut word = payload as u64;
    for (i, &(mask, polarity)) in PARITY_TERMS.iter().enumerate() {
        word.set_bit(EncodedWord::PAYLOAD_BITS + i, xor_reduce(payload & mask) ^ polarity);
    }
    EncodedWord(word)
}

/// 将 256 位数据扩展为 312 位码块
///
/// `payload[i]` 为数据的第 i 个 32 位片段 (位 [32i, 32i + 31])
pub fn encode_block(payload: &[u32; BLOCK_WORDS]) -> EncodedBlock {
    let mut bits = WideBits::new();
    for (i, &slice) in payload.iter().enumerate() {
        bits.set_field(i * EncodedWord::WIDTH, EncodedWord::WIDTH, encode_word(slice).value());
    }
    EncodedBlock { bits }
}

/// 按小端序把最多 4 字节解释为指令数据，不足部分高位补零
pub fn word_payload(bytes: &[u8]) -> u32 {
    assert!(bytes.len() <= 4, "Word chunk too long");
    let mut le = [0u8; 4];
    le[..bytes.len()].copy_from_slice(bytes);
    u32::from_le_bytes(le)
}

/// 按小端序把最多 32 字节解释为 256 位数据，不足部分高位补零
pub fn block_payload(bytes: &[u8]) -> [u32; BLOCK_WORDS] {
    assert!(bytes.len() <= BLOCK_WORDS * 4, "Block chunk too long");
    let mut payload = [0u32; BLOCK_WORDS];
    for (slot, word) in payload.iter_mut().zip(bytes.chunks(4)) {
        *slot = word_payload(word);
    }
    payload
}
