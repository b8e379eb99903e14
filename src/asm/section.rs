//! Assembler section accounting (§3.2, §4.2 "Section finalization").

use alloc::string::String;

use crate::container::pef::PefKind;

/// A `public_segment`/`extern_segment` record while it's still being
/// assembled. `size` is unknown until the *next* section opens or the
/// file ends, so it starts at `0` and is patched in place.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub kind: PefKind,
    pub size: u64,
    pub flags: u64,
    pub file_offset: u64,
}

impl Section {
    pub fn new(name: String, kind: PefKind, file_offset: u64) -> Section {
        Section {
            name,
            kind,
            size: 0,
            flags: 0,
            file_offset,
        }
    }
}
