//! Assembly-text-to-AE-object encoder (§4.2).
//!
//! Each target exposes a static opcode table ([`targets`]) keyed by
//! mnemonic; [`encoder::AssemblerContext`] owns the per-file mutable
//! state (open section, blob, register counter, diagnostic list)
//! explicitly, rather than as process-wide globals.

mod encoder;
mod form;
mod number;
mod section;
mod targets;

pub use encoder::AssemblerContext;
pub use form::{InstrForm, OpcodeEntry};
pub use number::parse_number;
pub use section::Section;
pub use targets::{lookup, register_limit};
