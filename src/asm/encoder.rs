//! The assembler's per-stage context: section accounting, instruction
//! encoding, and AE/flat emission (§4.2).

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::classify::{self, ENTRYPOINT_SYMBOL};
use crate::container::ae::{AeObject, AeRecordHeader};
use crate::container::arch::Arch;
use crate::container::pef::PefKind;
use crate::error::{Error, Result};

use super::form::InstrForm;
use super::number::parse_number;
use super::section::Section;
use super::targets;

const DEFAULT_ERROR_LIMIT: usize = 10;
const ALLOWED_PUNCTUATION: &[u8] = b",()\"'[]+_:@.\t ";

fn is_allowed_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(&byte)
}

/// Per-file assembler state, threaded explicitly through every call
/// rather than kept in statics (§9 "Global state").
pub struct AssemblerContext {
    pub arch: Arch,
    pub flat: bool,
    pub sections: Vec<Section>,
    pub externs: Vec<String>,
    pub blob: Vec<u8>,
    pub register_counter: u32,
    pub errors: Vec<Error>,
    pub error_limit: usize,
    current_section: Option<usize>,
    section_start: usize,
}

impl AssemblerContext {
    pub fn new(arch: Arch, flat: bool) -> AssemblerContext {
        AssemblerContext {
            arch,
            flat,
            sections: Vec::new(),
            externs: Vec::new(),
            blob: Vec::new(),
            register_counter: 0,
            errors: Vec::new(),
            error_limit: DEFAULT_ERROR_LIMIT,
            current_section: None,
            section_start: 0,
        }
    }

    /// Lexical screening: every character outside alphanumerics and the
    /// allowed punctuation set is rejected.
    pub fn check_line(&self, line: &str, line_no: usize) -> Option<Error> {
        line.bytes()
            .find(|&b| !is_allowed_char(b))
            .map(|bad| Error::Lexical {
                line: line_no,
                message: format!("disallowed character '{}' in line", bad as char),
            })
    }

    fn push_error(&mut self, diagnostic: Error) -> Result<()> {
        self.errors.push(diagnostic);
        if self.errors.len() > self.error_limit {
            return Err(Error::Lexical {
                line: 0,
                message: format!("exceeded error limit ({})", self.error_limit),
            });
        }
        Ok(())
    }

    /// Opens a new section, finalizing whatever section was previously
    /// open. `__ImageStart` is always forced to `Code` regardless of the
    /// suffix the source wrote.
    pub fn open_section(&mut self, name: &str, kind: PefKind) {
        self.close_current_section();
        let kind = if name == ENTRYPOINT_SYMBOL { PefKind::Code } else { kind };
        self.section_start = self.blob.len();
        let qualified = classify::join_section(name, kind);
        log::debug!("opening section {qualified} at blob offset {}", self.section_start);
        self.sections.push(Section::new(qualified, kind, self.section_start as u64));
        self.current_section = Some(self.sections.len() - 1);
    }

    /// Finalizes the currently open section's size to how much of the
    /// blob has accumulated since it opened. A no-op if no section is
    /// open (called both when a new section opens and at end-of-file).
    pub fn close_current_section(&mut self) {
        if let Some(index) = self.current_section {
            let size = (self.blob.len() - self.section_start) as u64;
            log::trace!("closing section {} with size {size}", self.sections[index].name);
            self.sections[index].size = size;
        }
    }

    fn handle_public_segment(&mut self, rest: &str, line_no: usize) -> Result<()> {
        if self.flat {
            return self.push_error(Error::Lexical {
                line: line_no,
                message: "public_segment is not allowed in flat-binary mode".to_string(),
            });
        }
        let mut parts = rest.split_whitespace();
        let (name, suffix) = match (parts.next(), parts.next()) {
            (Some(n), Some(s)) => (n, s),
            _ => {
                return self.push_error(Error::Lexical {
                    line: line_no,
                    message: "public_segment requires a name and a section suffix".to_string(),
                })
            }
        };
        let kind = match suffix {
            ".code64" => PefKind::Code,
            ".data64" => PefKind::Data,
            ".zero64" => PefKind::Zero,
            other => {
                return self.push_error(Error::Lexical {
                    line: line_no,
                    message: format!("unknown section suffix '{other}'"),
                })
            }
        };
        self.open_section(name, kind);
        Ok(())
    }

    fn handle_extern_segment(&mut self, rest: &str, line_no: usize) -> Result<()> {
        if self.flat {
            return self.push_error(Error::Lexical {
                line: line_no,
                message: "extern_segment is not allowed in flat-binary mode".to_string(),
            });
        }
        if rest.is_empty() {
            return self.push_error(Error::Lexical {
                line: line_no,
                message: "extern_segment requires an identifier".to_string(),
            });
        }
        self.externs.push(rest.to_string());
        Ok(())
    }

    /// Scans operand text for `r<digits>` register tokens, bumping the
    /// register counter once per occurrence and rejecting any index at or
    /// past the architecture's register file size.
    fn scan_registers(&mut self, operands: &str, line_no: usize) -> Result<()> {
        let limit = targets::register_limit(self.arch)?;
        let bytes = operands.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'r' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                let start = i + 1;
                let mut j = start;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                let index: u32 = operands[start..j].parse().unwrap_or(u32::MAX);
                if index >= limit {
                    self.push_error(Error::Lexical {
                        line: line_no,
                        message: format!("register r{index} exceeds register limit {limit}"),
                    })?;
                } else {
                    self.register_counter += 1;
                }
                i = j;
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    fn encode_instruction(&mut self, line: &str, line_no: usize) -> Result<()> {
        let (mnemonic, operands) = match line.split_once(char::is_whitespace) {
            Some((m, o)) => (m, o.trim()),
            None => (line, ""),
        };
        let entry = match targets::lookup(self.arch, mnemonic) {
            Some(entry) => *entry,
            None => {
                return self.push_error(Error::Lexical {
                    line: line_no,
                    message: format!("unknown mnemonic '{mnemonic}' for {:?}", self.arch),
                })
            }
        };

        match entry.form {
            InstrForm::NoArgs => {
                self.blob.extend_from_slice(&entry.opcode.to_le_bytes());
            }
            InstrForm::Jump | InstrForm::BAddr | InstrForm::PcRel => {
                let target = parse_number(operands).unwrap_or(0);
                self.blob.extend_from_slice(&entry.opcode.to_le_bytes());
                self.blob.extend_from_slice(&(target as i32).to_le_bytes());
            }
            InstrForm::RegToReg | InstrForm::GReg | InstrForm::FReg | InstrForm::VReg => {
                self.scan_registers(operands, line_no)?;
                self.blob.extend_from_slice(&entry.opcode.to_le_bytes());
            }
            InstrForm::Syscall => {
                let vector = parse_number(operands).unwrap_or(0);
                self.blob.extend_from_slice(&entry.opcode.to_le_bytes());
                self.blob.extend_from_slice(&(vector as i32).to_le_bytes());
            }
            InstrForm::Immediate => {
                self.scan_registers(operands, line_no)?;
                let imm = operands
                    .rsplit(|c: char| c.is_whitespace() || c == ',')
                    .find(|tok| !tok.is_empty())
                    .and_then(|tok| parse_number(tok).ok())
                    .unwrap_or(0);
                self.blob.extend_from_slice(&entry.opcode.to_le_bytes());
                self.blob.extend_from_slice(&(imm as i64).to_le_bytes());
            }
        }
        Ok(())
    }

    /// Processes one physical line: comment/blank stripping, lexical
    /// screening, directive dispatch, then instruction encoding.
    pub fn encode_line(&mut self, raw_line: &str, line_no: usize) -> Result<()> {
        let without_comment = raw_line
            .split('#')
            .next()
            .unwrap_or(raw_line)
            .split(';')
            .next()
            .unwrap_or(raw_line);
        let line = without_comment.trim();
        if line.is_empty() {
            return Ok(());
        }
        if let Some(diag) = self.check_line(line, line_no) {
            return self.push_error(diag);
        }
        if let Some(rest) = line.strip_prefix("public_segment") {
            return self.handle_public_segment(rest.trim(), line_no);
        }
        if let Some(rest) = line.strip_prefix("extern_segment") {
            return self.handle_extern_segment(rest.trim(), line_no);
        }
        self.encode_instruction(line, line_no)
    }

    /// Runs every line of `source` through [`encode_line`], then closes
    /// whatever section is still open at end-of-file.
    pub fn assemble(&mut self, source: &str) -> Result<()> {
        for (i, line) in source.lines().enumerate() {
            self.encode_line(line, i + 1)?;
        }
        self.close_current_section();
        Ok(())
    }

    /// Builds the AE object: one record per section, plus one
    /// `:UndefinedSymbol:` record per `extern_segment` (no blob bytes).
    pub fn emit_ae(&self, sub_arch: u8) -> AeObject {
        let mut object = AeObject::new(self.arch.as_u8(), sub_arch);
        for section in &self.sections {
            let mut record = AeRecordHeader::with_name(&section.name, section.kind as u64);
            record.size = section.size;
            record.flags = section.flags;
            record.offset = section.file_offset;
            object.push_record(record);
        }
        for (ordinal, raw) in self.externs.iter().enumerate() {
            let mangled = classify::mangle_undefined(raw);
            let mut record = AeRecordHeader::with_name(&mangled, 0);
            record.offset = ordinal as u64;
            object.push_record(record);
        }
        object.blob = self.blob.clone();
        object
    }

    /// Flat-binary output: the blob only, no container.
    pub fn emit_flat(&self) -> Vec<u8> {
        self.blob.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_section_finalizes_previous_size() {
        let mut ctx = AssemblerContext::new(Arch::Amd64, false);
        ctx.open_section("text", PefKind::Code);
        ctx.encode_line("nop", 1).unwrap();
        ctx.encode_line("nop", 2).unwrap();
        ctx.open_section("other", PefKind::Data);
        assert_eq!(ctx.sections[0].size, 2);
    }

    #[test]
    fn imagestart_is_forced_to_code() {
        let mut ctx = AssemblerContext::new(Arch::Amd64, false);
        ctx.open_section(ENTRYPOINT_SYMBOL, PefKind::Data);
        assert_eq!(ctx.sections[0].kind, PefKind::Code);
        assert!(ctx.sections[0].name.ends_with(".code64"));
    }

    #[test]
    fn flat_mode_rejects_section_directives() {
        let mut ctx = AssemblerContext::new(Arch::Amd64, true);
        let err = ctx.encode_line("public_segment text .code64", 1);
        assert!(err.is_ok());
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn register_over_limit_is_an_error() {
        let mut ctx = AssemblerContext::new(Arch::Arch32000, false);
        ctx.open_section("text", PefKind::Code);
        ctx.encode_line("add r0 r16", 1).unwrap();
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn unknown_mnemonic_is_counted_not_fatal() {
        let mut ctx = AssemblerContext::new(Arch::Amd64, false);
        ctx.open_section("text", PefKind::Code);
        ctx.encode_line("frobnicate r0", 1).unwrap();
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn error_limit_aborts_the_stage() {
        let mut ctx = AssemblerContext::new(Arch::Amd64, false);
        ctx.error_limit = 2;
        ctx.open_section("text", PefKind::Code);
        for _ in 0..4 {
            let _ = ctx.encode_line("bogus", 1);
        }
        let result = ctx.encode_line("bogus", 1);
        assert!(result.is_err());
    }

    #[test]
    fn extern_segment_produces_undefined_record_with_no_bytes() {
        let mut ctx = AssemblerContext::new(Arch::Amd64, false);
        ctx.open_section("text", PefKind::Code);
        ctx.encode_line("extern_segment bar", 1).unwrap();
        let object = ctx.emit_ae(0);
        let undef = object
            .records
            .iter()
            .find(|r| classify::is_undefined(&r.name_str()))
            .unwrap();
        assert_eq!(undef.size, 0);
    }

    #[test]
    fn emit_ae_round_trips_an_empty_executable_scenario() {
        let mut ctx = AssemblerContext::new(Arch::Amd64, false);
        ctx.assemble("public_segment __ImageStart .code64\nnop\n").unwrap();
        let object = ctx.emit_ae(0);
        assert_eq!(object.records.len(), 1);
        assert!(object.records[0].name_str().contains("__ImageStart"));
        assert!(object.records[0].name_str().contains(".code64"));
    }
}
