//! Crockford 风格的 base32 编解码，无填充
//!
//! 按高位优先消费比特。解码不区分大小写但很严格：`I`、`L`、`O`、`U`
//! 以及字母表之外的字节都会被拒绝，非零的尾部比特同样拒绝。

use thiserror::Error;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base32 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("non-canonical trailing bits")]
    TrailingBits,
}

pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity((input.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for &byte in input {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for (position, character) in input.chars().enumerate() {
        let value = symbol_value(character)
            .ok_or(DecodeError::InvalidCharacter { character, position })?;
        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
        buffer &= (1 << bits) - 1;
    }

    // 剩余比特必须是不足一个符号的零填充
    if bits >= 5 || buffer != 0 {
        return Err(DecodeError::TrailingBits);
    }
    Ok(out)
}

fn symbol_value(character: char) -> Option<u8> {
    let upper = character.to_ascii_uppercase();
    if !upper.is_ascii() {
        return None;
    }
    ALPHABET
        .iter()
        .position(|&symbol| symbol == upper as u8)
        .map(|index| index as u8)
}
