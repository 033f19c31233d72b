//! Canonical content stream layout.

use super::parser::{tokenize, Instruction, Operand};
use crate::error::Result;

fn write_operand(operand: &Operand<'_>, out: &mut Vec<u8>) {
    match operand {
        Operand::Atom(raw) => out.extend_from_slice(raw),
        Operand::Array(items) => {
            out.push(b'[');
            write_operands(items, out);
            out.push(b']');
        },
        Operand::Dictionary(items) => {
            out.extend_from_slice(b"<<");
            write_operands(items, out);
            out.extend_from_slice(b">>");
        },
    }
}

fn write_operands(operands: &[Operand<'_>], out: &mut Vec<u8>) {
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        write_operand(operand, out);
    }
}

/// Serialize instructions, one per line.
///
/// Inline images become `BI`, then the dictionary entries followed by `ID`
/// on one line, then the raw data directly followed by `EI`.
pub fn serialize_instructions(instructions: &[Instruction<'_>]) -> Vec<u8> {
    let mut out = Vec::new();

    for instruction in instructions {
        match instruction {
            Instruction::Operation { operands, operator } => {
                write_operands(operands, &mut out);
                if !operands.is_empty() {
                    out.push(b' ');
                }
                out.extend_from_slice(operator);
            },
            Instruction::InlineImage { dict, data } => {
                out.extend_from_slice(b"BI\n");
                write_operands(dict, &mut out);
                if !dict.is_empty() {
                    out.push(b' ');
                }
                out.extend_from_slice(b"ID\n");
                out.extend_from_slice(data);
                out.extend_from_slice(b"EI");
            },
            Instruction::Trailing(operands) => write_operands(operands, &mut out),
        }
        out.push(b'\n');
    }

    out
}

/// Rewrite decoded content stream data in canonical layout.
///
/// # Errors
///
/// Propagates tokenizer errors; the input is left for the caller to keep.
pub fn canonicalize(data: &[u8]) -> Result<Vec<u8>> {
    let instructions = tokenize(data)?;
    log::trace!("Canonicalizing {} content instructions", instructions.len());
    Ok(serialize_instructions(&instructions))
}
