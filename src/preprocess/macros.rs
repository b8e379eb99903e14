//! The macro table: definition, parameter handling, and single-pass
//! textual substitution.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A `#define`d name: object-like if `params` is empty and the source
/// never wrote parentheses, function-like otherwise. Created once, read
/// on every expansion, never mutated in place — redefinition replaces the
/// whole entry (last-writer-wins, no diagnostic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
    pub function_like: bool,
}

impl Macro {
    pub fn object_like(name: &str, body: &str) -> Macro {
        Macro {
            name: name.to_string(),
            params: Vec::new(),
            body: body.to_string(),
            function_like: false,
        }
    }

    /// Builds a function-like macro, deduplicating the formal parameter
    /// list at definition time: repeated parameter names are stripped
    /// before the macro is stored.
    pub fn function_like(name: &str, params: &[&str], body: &str) -> Macro {
        let mut seen = Vec::new();
        for &param in params {
            if !seen.iter().any(|p: &String| p == param) {
                seen.push(param.to_string());
            }
        }
        Macro {
            name: name.to_string(),
            params: seen,
            body: body.to_string(),
            function_like: true,
        }
    }

    /// Substitutes `args` (positionally, by formal parameter name) into
    /// the body. Not recursive: a parameter's replacement text is never
    /// itself re-scanned for further macro references, matching the
    /// single-pass expansion policy.
    pub fn expand(&self, args: &[String]) -> String {
        if self.params.is_empty() {
            return self.body.clone();
        }
        let mut out = String::with_capacity(self.body.len());
        let bytes = self.body.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if is_ident_start(bytes[i]) {
                let start = i;
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                let word = &self.body[start..i];
                if let Some(pos) = self.params.iter().position(|p| p == word) {
                    if let Some(arg) = args.get(pos) {
                        out.push_str(arg);
                    }
                } else {
                    out.push_str(word);
                }
            } else {
                out.push(bytes[i] as char);
                i += 1;
            }
        }
        out
    }
}

pub fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

pub fn is_ident_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// A flat, name-keyed macro table. Flat by design (§9 "Cyclic and
/// recursive structures") — there is no expansion graph to build or
/// traverse, which is what makes self-referential macros merely inert
/// rather than an infinite loop.
#[derive(Debug, Default, Clone)]
pub struct MacroTable {
    entries: BTreeMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable {
            entries: BTreeMap::new(),
        }
    }

    pub fn define(&mut self, macro_def: Macro) {
        self.entries.insert(macro_def.name.clone(), macro_def);
    }

    pub fn undef(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolves a macro's stored body as an integer, defaulting to `0`
    /// when the body isn't a bare decimal literal.
    pub fn int_value(&self, name: &str) -> Option<i64> {
        self.entries.get(name).map(|m| m.body.trim().parse().unwrap_or(0))
    }
}

/// Splits a function-like macro call's argument text on top-level
/// commas (commas nested inside parentheses don't split), trimming
/// whitespace from each piece.
pub fn split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                args.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(text[start..].trim().to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_like_macro_substitutes_positionally() {
        let m = Macro::function_like("F", &["x", "y"], "x+y");
        let out = m.expand(&["1".to_string(), "2".to_string()]);
        assert_eq!(out, "1+2");
    }

    #[test]
    fn duplicated_formal_params_are_deduplicated() {
        let m = Macro::function_like("F", &["x", "x", "y"], "x+y");
        assert_eq!(m.params, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn split_args_respects_nested_parens() {
        let args = split_args("a, f(b, c), d");
        assert_eq!(args, vec!["a", "f(b, c)", "d"]);
    }

    #[test]
    fn redefinition_is_last_writer_wins() {
        let mut table = MacroTable::new();
        table.define(Macro::object_like("N", "1"));
        table.define(Macro::object_like("N", "2"));
        assert_eq!(table.get("N").unwrap().body, "2");
    }
}
