//! `aeforge` — the core of a small, self-hosted toolchain that compiles a
//! C/C++-like source language down to executable images for custom
//! RISC-style and AMD64 targets.
//!
//! The toolchain is staged: a [`preprocess`] engine expands directives over
//! text, an [`asm`] encoder turns assembly text into an `AE` relocatable
//! object ([`container::ae`]), and a [`link`] resolver merges `AE` objects
//! into a `PEF` image ([`container::pef`]). [`driver`] sequences the stages
//! for a set of source files. Every stage is a pure file-to-file
//! transformation; there is no shared in-memory IR that crosses a stage
//! boundary.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;

pub mod classify;
pub mod container;

#[cfg(feature = "alloc")]
pub mod asm;
#[cfg(feature = "alloc")]
pub mod link;
#[cfg(feature = "alloc")]
pub mod preprocess;

#[cfg(feature = "std")]
pub mod driver;

pub use error::{Error, Result};
