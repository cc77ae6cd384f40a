//! Expansion of `#include "file"` directives in shader files.
//!
//! Every file gets its own source string index. `#line` directives are inserted around included
//! content and the prefix code, so compiler messages point back to the right file and line.

use std::collections::HashSet;
use std::fmt::Write;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::*;

/// A shader file with all includes expanded.
#[derive(Debug, Clone)]
pub struct ExpandedSource {
    pub source: String,
    /// Every file read while expanding, the main file included.
    pub files: HashSet<PathBuf>,
}

/// Reads `path` and expands its includes recursively. `prefix` is inserted after the
/// `#version` line of the main file.
pub fn expand_file<P: AsRef<Path>>(path: P, prefix: &str) -> Result<ExpandedSource> {
    let mut expander = Expander {
        next_index: 0,
        chain: Vec::new(),
        files: HashSet::new(),
    };

    let source = expander.expand(&normalize(path.as_ref()), prefix, 0)?;
    Ok(ExpandedSource {
        source,
        files: expander.files,
    })
}

struct Expander {
    next_index: u32,
    chain: Vec<PathBuf>,
    files: HashSet<PathBuf>,
}

impl Expander {
    fn expand(&mut self, path: &Path, prefix: &str, index: u32) -> Result<String> {
        let source = fs::read_to_string(path).map_err(|err| {
            error!("Unable to open shader file {}: {}", path.display(), err);
            Error::ShaderFile(path.display().to_string(), err.to_string())
        })?;

        self.files.insert(path.to_owned());
        self.chain.push(path.to_owned());

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let has_version = source.contains("#version");
        let mut prefix_pending = !prefix.is_empty() && has_version;

        let mut out = String::with_capacity(source.len() + prefix.len());
        if !has_version {
            let _ = writeln!(out, "#line 1 {}", index);
        }

        for (n, line) in source.lines().enumerate() {
            let trimmed = line.trim_start();

            if trimmed.starts_with("#include") {
                let name = parse_include(path, trimmed)?;
                let include = normalize(&directory.join(name));

                if self.chain.contains(&include) {
                    warn!(
                        "Skipping cyclic include of {} in {}.",
                        include.display(),
                        path.display()
                    );

                    out.push('\n');
                    continue;
                }

                self.next_index += 1;
                let included = self.expand(&include, "", self.next_index)?;
                out.push_str(&included);
                let _ = writeln!(out, "#line {} {}", n + 2, index);
                continue;
            }

            out.push_str(line);
            out.push('\n');

            if prefix_pending && trimmed.starts_with("#version") {
                prefix_pending = false;
                self.next_index += 1;

                let _ = writeln!(out, "#line 1 {}", self.next_index);
                out.push_str(prefix);
                if !prefix.ends_with('\n') {
                    out.push('\n');
                }

                let _ = writeln!(out, "#line {} {}", n + 2, index);
            }
        }

        self.chain.pop();
        Ok(out)
    }
}

fn parse_include<'a>(path: &Path, directive: &'a str) -> Result<&'a str> {
    let malformed = |reason: &str| {
        error!(
            "Invalid #include directive in shader file {}: {}",
            path.display(),
            reason
        );
        Error::ShaderInclude(path.display().to_string(), reason.to_owned())
    };

    let rest = &directive["#include".len()..];
    let first = rest.find('"').ok_or_else(|| malformed("expected \""))?;
    let len = rest[first + 1..]
        .find('"')
        .ok_or_else(|| malformed("expected closing \""))?;

    if len == 0 {
        return Err(malformed("quotation marks empty"));
    }

    Ok(&rest[first + 1..first + 1 + len])
}

/// Resolves `.` and `..` lexically, so the same file is always recognized by the same path.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            v => out.push(v.as_os_str()),
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use std::env;

    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("glhelper-include-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn includes_and_prefix() {
        let dir = scratch("basic");
        fs::write(
            dir.join("main.comp"),
            "#version 450\n#include \"common.glsl\"\nvoid main() {}\n",
        )
        .unwrap();
        fs::write(dir.join("common.glsl"), "float common;\n").unwrap();

        let expanded = expand_file(dir.join("main.comp"), "#define FOO 1").unwrap();
        assert_eq!(
            expanded.source,
            "#version 450\n#line 1 1\n#define FOO 1\n#line 2 0\n\
             #line 1 2\nfloat common;\n#line 3 0\nvoid main() {}\n"
        );

        assert_eq!(expanded.files.len(), 2);
        assert!(expanded.files.contains(&normalize(&dir.join("common.glsl"))));
    }

    #[test]
    fn cycles_are_skipped() {
        let dir = scratch("cycle");
        fs::write(dir.join("a.glsl"), "#version 450\n#include \"b.glsl\"\n").unwrap();
        fs::write(dir.join("b.glsl"), "#include \"./a.glsl\"\nint b;\n").unwrap();

        let expanded = expand_file(dir.join("a.glsl"), "").unwrap();
        assert!(expanded.source.contains("int b;"));
        assert_eq!(expanded.source.matches("#version").count(), 1);
    }

    #[test]
    fn malformed() {
        let dir = scratch("malformed");
        fs::write(dir.join("a.glsl"), "#version 450\n#include \"\"\n").unwrap();
        assert!(expand_file(dir.join("a.glsl"), "").is_err());

        fs::write(dir.join("b.glsl"), "#version 450\n#include <b.glsl>\n").unwrap();
        assert!(expand_file(dir.join("b.glsl"), "").is_err());

        assert!(expand_file(dir.join("missing.glsl"), "").is_err());
    }

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize(Path::new("a/./b/../c.glsl")), PathBuf::from("a/c.glsl"));
    }
}
