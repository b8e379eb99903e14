//! POWER64 opcode table. The encoder assembles each opcode's four bytes
//! into the instruction stream in `[0],[1],[2],[3]` order at a fixed
//! 4-byte stride, per `AssemblerPower.cc`'s explicit byte ordering.

use crate::asm::form::{InstrForm, OpcodeEntry};

pub static TABLE: &[OpcodeEntry] = &[
    OpcodeEntry {
        mnemonic: "nop",
        opcode: 0x6000_0000,
        funct3: 0,
        form: InstrForm::NoArgs,
    },
    OpcodeEntry {
        mnemonic: "blr",
        opcode: 0x4E80_0020,
        funct3: 0,
        form: InstrForm::NoArgs,
    },
    OpcodeEntry {
        mnemonic: "add",
        opcode: 0x7C00_0214,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "subf",
        opcode: 0x7C00_0050,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "mr",
        opcode: 0x7C00_0378,
        funct3: 0,
        form: InstrForm::RegToReg,
    },
    OpcodeEntry {
        mnemonic: "addi",
        opcode: 0x3800_0000,
        funct3: 0,
        form: InstrForm::Immediate,
    },
    OpcodeEntry {
        mnemonic: "b",
        opcode: 0x4800_0000,
        funct3: 0,
        form: InstrForm::Jump,
    },
    OpcodeEntry {
        mnemonic: "bl",
        opcode: 0x4800_0001,
        funct3: 0,
        form: InstrForm::PcRel,
    },
    OpcodeEntry {
        mnemonic: "beq",
        opcode: 0x4182_0000,
        funct3: 0,
        form: InstrForm::BAddr,
    },
    OpcodeEntry {
        mnemonic: "sc",
        opcode: 0x4400_0002,
        funct3: 0,
        form: InstrForm::Syscall,
    },
];
