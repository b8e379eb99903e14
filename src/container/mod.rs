//! On-disk container formats: the *Advanced Executable* (AE) relocatable
//! object and the *Preferred Executable Format* (PEF) image.
//!
//! Every struct here is `#[repr(C)]` and packed, with `scroll`-derived
//! `Pread`/`Pwrite`/`SizeWith` impls so that `serialize` followed by
//! `deserialize` round-trips bit-exactly (§8 R1/R2 of the format spec).
//! Endianness is host-native (little-endian on every target this
//! toolchain emits for), so every codec here reads/writes with
//! [`scroll::LE`].

pub mod ae;
pub mod arch;
pub mod pef;

pub use arch::{Arch, SubArch};
