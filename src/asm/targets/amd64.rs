//! AMD64 opcode table. Variable-length encoding with optional REX/ModR/M
//! bytes is handled by [`crate::asm::encoder`]; this table only supplies
//! the base opcode and dispatch form per mnemonic.

use crate::asm::form::{InstrForm, OpcodeEntry};

pub static TABLE: &[OpcodeEntry] = &[
    OpcodeEntry {
        mnemonic: "nop",
        opcode: 0x90,
        funct3: 0,
        form: InstrForm::NoArgs,
    },
    OpcodeEntry {
        mnemonic: "ret",
        opcode: 0xC3,
        funct3: 0,
        form: InstrForm::NoArgs,
    },
    OpcodeEntry {
        mnemonic: "mov",
        opcode: 0x89,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "add",
        opcode: 0x01,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "sub",
        opcode: 0x29,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "cmp",
        opcode: 0x39,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "push",
        opcode: 0x50,
        funct3: 0,
        form: InstrForm::GReg,
    },
    OpcodeEntry {
        mnemonic: "pop",
        opcode: 0x58,
        funct3: 0,
        form: InstrForm::GReg,
    },
    OpcodeEntry {
        mnemonic: "movabs",
        opcode: 0xB8,
        funct3: 0,
        form: InstrForm::Immediate,
    },
    OpcodeEntry {
        mnemonic: "jmp",
        opcode: 0xE9,
        funct3: 0,
        form: InstrForm::Jump,
    },
    OpcodeEntry {
        mnemonic: "call",
        opcode: 0xE8,
        funct3: 0,
        form: InstrForm::PcRel,
    },
    OpcodeEntry {
        mnemonic: "je",
        opcode: 0x84,
        funct3: 0x0F,
        form: InstrForm::BAddr,
    },
    OpcodeEntry {
        mnemonic: "syscall",
        opcode: 0x05,
        funct3: 0x0F,
        form: InstrForm::Syscall,
    },
];
