//! AArch64 opcode table. Register limit follows the AAPCS64 GPR file
//! (x0-x30), grounded in the ARM64 assembler notes in the original
//! `AssemblerARM64.cc`.

use crate::asm::form::{InstrForm, OpcodeEntry};

pub static TABLE: &[OpcodeEntry] = &[
    OpcodeEntry {
        mnemonic: "nop",
        opcode: 0xD503_201F,
        funct3: 0,
        form: InstrForm::NoArgs,
    },
    OpcodeEntry {
        mnemonic: "ret",
        opcode: 0xD65F_03C0,
        funct3: 0,
        form: InstrForm::NoArgs,
    },
    OpcodeEntry {
        mnemonic: "mov",
        opcode: 0xAA00_03E0,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "add",
        opcode: 0x8B00_0000,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "sub",
        opcode: 0xCB00_0000,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "b",
        opcode: 0x1400_0000,
        funct3: 0,
        form: InstrForm::Jump,
    },
    OpcodeEntry {
        mnemonic: "bl",
        opcode: 0x9400_0000,
        funct3: 0,
        form: InstrForm::PcRel,
    },
    OpcodeEntry {
        mnemonic: "cbz",
        opcode: 0xB400_0000,
        funct3: 0,
        form: InstrForm::BAddr,
    },
    OpcodeEntry {
        mnemonic: "svc",
        opcode: 0xD400_0001,
        funct3: 0,
        form: InstrForm::Syscall,
    },
];
