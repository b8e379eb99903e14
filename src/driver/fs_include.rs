//! Filesystem-backed [`IncludeSource`], resolving `#include` cookies
//! against a working directory and a search list of `-include-dir`
//! paths, the way a real `cc1`-style front end would.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::preprocess::IncludeSource;

pub struct FsIncludeSource {
    pub working_dir: PathBuf,
    pub search_dirs: Vec<PathBuf>,
}

impl FsIncludeSource {
    pub fn new(working_dir: &Path, search_dirs: &[String]) -> FsIncludeSource {
        FsIncludeSource {
            working_dir: working_dir.to_path_buf(),
            search_dirs: search_dirs.iter().map(PathBuf::from).collect(),
        }
    }

    fn candidates(&self, bare_name: &str, local: bool) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if local {
            out.push(self.working_dir.join(bare_name));
        }
        for dir in &self.search_dirs {
            out.push(dir.join(bare_name));
        }
        if !local {
            out.push(self.working_dir.join(bare_name));
        }
        out
    }
}

/// Strips the `"..."` or `<...>` delimiters off a raw `#include` cookie.
fn bare_name(cookie: &str) -> &str {
    let cookie = cookie.trim();
    if let Some(stripped) = cookie.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return stripped;
    }
    if let Some(stripped) = cookie.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return stripped;
    }
    cookie
}

impl IncludeSource for FsIncludeSource {
    fn read(&mut self, cookie: &str, local: bool) -> Result<String> {
        let name = bare_name(cookie);
        for candidate in self.candidates(name, local) {
            if let Ok(text) = fs::read_to_string(&candidate) {
                return Ok(text);
            }
        }
        Err(Error::Directive(std::format!(
            "#include {cookie} not found in working directory or any -include-dir"
        )))
    }
}
