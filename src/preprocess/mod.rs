//! Directive and macro expansion engine (§4.1).
//!
//! A single-pass, line-at-a-time pull loop (§9 "Coroutines / iterators"):
//! `run` walks the input one physical line at a time, threading a
//! conditional stack and macro table as explicit state rather than
//! relying on any process-wide singleton (§9 "Global state").

mod macros;

use alloc::borrow::ToOwned;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

pub use macros::{split_args, Macro, MacroTable};

use crate::error::{Error, Result};

/// One frame of the `#if`/`#ifdef`/`#ifndef` stack.
///
/// `defined` records whether the original condition (before any `#else`)
/// evaluated true; `inactive` is what the expander actually consults —
/// `#else` flips it, `#if`/`#ifdef`/`#ifndef` set it from the condition,
/// and while any enclosing frame is inactive the whole branch is
/// suppressed regardless of this frame's own condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CondFrame {
    pub defined: bool,
    pub inactive: bool,
}

/// Where `#include "..."` / `#include <...>` text comes from. Kept as a
/// trait so the expansion logic can be unit-tested without a real
/// filesystem; [`crate::driver`] supplies the `std`-backed implementation.
pub trait IncludeSource {
    /// Resolves a `#include` cookie (the raw text after the directive,
    /// quotes/angle-brackets included) to file contents. `local` is true
    /// for `"..."` includes (search the working directory first).
    fn read(&mut self, cookie: &str, local: bool) -> Result<String>;
}

/// An [`IncludeSource`] that always fails; used when a preprocessor run
/// never needs `#include` (e.g. most unit tests).
#[derive(Debug, Default)]
pub struct NoIncludes;

impl IncludeSource for NoIncludes {
    fn read(&mut self, cookie: &str, _local: bool) -> Result<String> {
        Err(Error::Directive(format!(
            "#include {cookie} used but no include source was configured"
        )))
    }
}

/// Per-run context: macro table, include-cookie set, conditional stack.
/// Bundled explicitly (§9 "Global state") rather than threaded through
/// free functions or held in statics.
pub struct Preprocessor<'a> {
    macros: MacroTable,
    cookies: Vec<String>,
    stack: Vec<CondFrame>,
    includes: &'a mut dyn IncludeSource,
    warnings: Vec<String>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(includes: &'a mut dyn IncludeSource) -> Preprocessor<'a> {
        let mut macros = MacroTable::new();
        macros.define(Macro::object_like("__true", "1"));
        macros.define(Macro::object_like("__false", "0"));
        Preprocessor {
            macros,
            cookies: Vec::new(),
            stack: Vec::new(),
            includes,
            warnings: Vec::new(),
        }
    }

    /// Seeds a host-defined macro (`__cplusplus`, `__SIZE_TYPE__`, or a
    /// driver `-def name value` flag) before the run starts.
    pub fn seed(&mut self, name: &str, value: &str) {
        self.macros.define(Macro::object_like(name, value));
    }

    pub fn define(&mut self, macro_def: Macro) {
        self.macros.define(macro_def);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// True while every frame currently on the conditional stack is
    /// active; a single inactive ancestor suppresses everything nested
    /// inside it.
    fn active(&self) -> bool {
        self.stack.iter().all(|frame| !frame.inactive)
    }

    pub fn push_if(&mut self, condition: bool) {
        self.stack.push(CondFrame {
            defined: condition,
            inactive: !condition,
        });
    }

    pub fn push_ifdef(&mut self, name: &str) {
        self.push_if(self.macros.contains(name));
    }

    pub fn push_ifndef(&mut self, name: &str) {
        self.push_if(!self.macros.contains(name));
    }

    pub fn toggle_else(&mut self) -> Result<()> {
        match self.stack.last_mut() {
            Some(frame) => {
                frame.inactive = frame.defined;
                Ok(())
            }
            None => Err(Error::Directive("#else without #if".to_owned())),
        }
    }

    pub fn pop_endif(&mut self) -> Result<()> {
        if self.stack.pop().is_none() {
            Err(Error::Directive("#endif without #if".to_owned()))
        } else {
            Ok(())
        }
    }

    /// Evaluates a `#if` expression: `LHS OP RHS` using one of the six
    /// recognized relational operators, or a bare truthiness check when
    /// no operator is present. `"0"`/`"1"` literals short-circuit without
    /// a table lookup.
    pub fn eval_if(&self, expr: &str) -> bool {
        let expr = expr.trim();
        if expr == "0" {
            return false;
        }
        if expr == "1" {
            return true;
        }
        const OPERATORS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];
        for op in OPERATORS {
            if let Some(pos) = expr.find(op) {
                let lhs = &expr[..pos];
                let rhs = &expr[pos + op.len()..];
                let left = self.resolve_operand(lhs);
                let right = self.resolve_operand(rhs);
                return match op {
                    "==" => left == right,
                    "!=" => left != right,
                    "<=" => left <= right,
                    ">=" => left >= right,
                    "<" => left < right,
                    ">" => left > right,
                    _ => unreachable!(),
                };
            }
        }
        self.resolve_operand(expr) != 0
    }

    /// Resolves an operand to an integer: a macro lookup first, then a
    /// direct parse, then a scan for the first run of decimal digits.
    fn resolve_operand(&self, text: &str) -> i64 {
        let text = text.trim();
        if let Some(value) = self.macros.int_value(text) {
            return value;
        }
        if let Ok(value) = text.parse::<i64>() {
            return value;
        }
        let digits: String = text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0)
    }

    /// Expands every macro occurrence on one line, single-pass: function-
    /// like calls first (they're syntactically distinguishable by the
    /// immediately-following `(`), then whole-word object-like names.
    /// Neither substitution result is rescanned, so a macro whose body
    /// mentions its own name is inert rather than an infinite loop.
    pub fn expand_line(&self, line: &str) -> String {
        let bytes = line.as_bytes();
        let mut out = String::with_capacity(line.len());
        let mut i = 0;
        while i < bytes.len() {
            if macros::is_ident_start(bytes[i]) {
                let start = i;
                let mut j = i;
                while j < bytes.len() && macros::is_ident_continue(bytes[j]) {
                    j += 1;
                }
                let word = &line[start..j];
                if j < bytes.len() && bytes[j] == b'(' {
                    if let Some(m) = self.macros.get(word) {
                        if m.function_like {
                            if let Some((args_text, after)) = extract_call_args(line, j) {
                                let args = split_args(&args_text);
                                out.push_str(&m.expand(&args));
                                i = after;
                                continue;
                            }
                        }
                    }
                }
                if let Some(m) = self.macros.get(word) {
                    if !m.function_like {
                        out.push_str(&m.body);
                        i = j;
                        continue;
                    }
                }
                out.push_str(word);
                i = j;
            } else {
                out.push(bytes[i] as char);
                i += 1;
            }
        }
        out
    }

    /// Registers `cookie` as seen; returns `true` if it was already
    /// present (the call is then a no-op re-inclusion, which is how both
    /// a literal repeat `#include` and `#pragma once` are suppressed).
    fn mark_cookie(&mut self, cookie: &str) -> bool {
        if self.cookies.iter().any(|c| c == cookie) {
            true
        } else {
            self.cookies.push(cookie.to_string());
            false
        }
    }

    fn include(&mut self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        let (cookie, local) = if raw.starts_with('"') {
            (raw.to_string(), true)
        } else {
            (raw.to_string(), false)
        };
        if self.mark_cookie(&cookie) {
            log::trace!("skipping already-seen include cookie {cookie}");
            return Ok(String::new());
        }
        let text = self.includes.read(&cookie, local)?;
        self.run(&text)
    }

    /// Runs the full engine over `source`, returning the expanded text.
    pub fn run(&mut self, source: &str) -> Result<String> {
        let mut out = String::with_capacity(source.len());
        for line in source.lines() {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix('#') {
                self.directive(rest.trim(), &mut out)?;
                continue;
            }
            if self.active() {
                out.push_str(&self.expand_line(line));
                out.push('\n');
            }
        }
        Ok(out)
    }

    fn directive(&mut self, rest: &str, out: &mut String) -> Result<()> {
        let (keyword, tail) = match rest.split_once(char::is_whitespace) {
            Some((k, t)) => (k, t.trim()),
            None => (rest, ""),
        };

        // Conditional-stack directives are always processed, even inside
        // an inactive region, so nesting stays balanced.
        match keyword {
            "if" => {
                let cond = self.active() && self.eval_if(tail);
                self.push_if(cond);
                return Ok(());
            }
            "ifdef" => {
                if self.active() {
                    self.push_ifdef(tail);
                } else {
                    self.push_if(false);
                }
                return Ok(());
            }
            "ifndef" => {
                if self.active() {
                    self.push_ifndef(tail);
                } else {
                    self.push_if(false);
                }
                return Ok(());
            }
            "else" => return self.toggle_else(),
            "endif" => return self.pop_endif(),
            _ => {}
        }

        if !self.active() {
            return Ok(());
        }

        match keyword {
            "define" => {
                self.directive_define(tail);
                Ok(())
            }
            "include" => {
                let expanded = self.include(tail)?;
                out.push_str(&expanded);
                Ok(())
            }
            "pragma" => {
                if tail.trim() == "once" {
                    // Modeled as the file registering its own path the
                    // first time it's opened; the driver passes that path
                    // in as the initial cookie before calling `run`, so a
                    // bare `#pragma once` with no argument needs no
                    // lookup here.
                }
                Ok(())
            }
            "warning" => {
                self.warnings.push(tail.to_string());
                Ok(())
            }
            "error" => Err(Error::Directive(tail.to_string())),
            other => {
                self.warnings
                    .push(format!("unknown preprocessor directive '{other}'"));
                Ok(())
            }
        }
    }

    fn directive_define(&mut self, tail: &str) {
        let (name, rest) = match tail.find(|c: char| c.is_whitespace() || c == '(') {
            Some(pos) => (&tail[..pos], &tail[pos..]),
            None => (tail, ""),
        };
        let rest_trimmed = rest.trim_start();
        if let Some(stripped) = rest_trimmed.strip_prefix('(') {
            if let Some(close) = stripped.find(')') {
                let params_text = &stripped[..close];
                let body = stripped[close + 1..].trim_start();
                let params: Vec<&str> = if params_text.trim().is_empty() {
                    Vec::new()
                } else {
                    params_text.split(',').map(str::trim).collect()
                };
                self.define(Macro::function_like(name, &params, body));
                return;
            }
        }
        self.define(Macro::object_like(name, rest_trimmed));
    }
}

/// Given a line and the index of the `(` that opens a macro call's
/// argument list, returns the text between the matching parentheses and
/// the index just past the closing `)`.
fn extract_call_args(line: &str, open_paren: usize) -> Option<(String, usize)> {
    let bytes = line.as_bytes();
    let mut depth = 0i32;
    let mut i = open_paren;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((line[open_paren + 1..i].to_string(), i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_like_macro_arity_scenario() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        let out = pp.run("#define F(x,y) x+y\nF(1,2)\n").unwrap();
        assert_eq!(out.trim(), "1+2");
    }

    #[test]
    fn conditional_nesting_scenario() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        pp.seed("A", "1");
        let out = pp.run("#ifdef A\n1\n#else\n2\n#endif\n").unwrap();
        assert_eq!(out.trim(), "1");
    }

    #[test]
    fn nested_inactive_branch_suppresses_inner_else() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        let out = pp
            .run("#ifdef MISSING\n#ifdef ALSO_MISSING\nX\n#else\nY\n#endif\n#endif\nZ\n")
            .unwrap();
        assert_eq!(out.trim(), "Z");
    }

    #[test]
    fn relational_if_operators() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        pp.seed("VERSION", "3");
        let out = pp.run("#if VERSION >= 2\nnew\n#else\nold\n#endif\n").unwrap();
        assert_eq!(out.trim(), "new");
    }

    #[test]
    fn self_referential_macro_does_not_loop() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        pp.define(Macro::object_like("LOOP", "LOOP + 1"));
        let out = pp.run("LOOP\n").unwrap();
        assert_eq!(out.trim(), "LOOP + 1");
    }

    #[test]
    fn directive_free_input_is_idempotent() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        let src = "plain line one\nplain line two\n";
        assert_eq!(pp.run(src).unwrap(), src);
    }

    #[test]
    fn unbalanced_endif_is_an_error() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        assert!(pp.run("#endif\n").is_err());
    }

    #[test]
    fn error_directive_aborts() {
        let mut includes = NoIncludes;
        let mut pp = Preprocessor::new(&mut includes);
        assert!(pp.run("#error fatal\n").is_err());
    }

    #[test]
    fn repeat_include_cookie_is_suppressed() {
        struct Fixed;
        impl IncludeSource for Fixed {
            fn read(&mut self, _cookie: &str, _local: bool) -> Result<String> {
                Ok("once\n".to_string())
            }
        }
        let mut includes = Fixed;
        let mut pp = Preprocessor::new(&mut includes);
        let out = pp.run("#include <x.h>\n#include <x.h>\n").unwrap();
        assert_eq!(out, "once\n");
    }
}
