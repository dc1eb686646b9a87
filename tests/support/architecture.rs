//! Source scanning for the layer contract tests.
//!
//! Only production code is inspected: a file is read up to its first
//! `#[cfg(test)]` attribute, and comment lines are skipped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level modules of the crate, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Domain,
    Port,
    Application,
    InboundAdapter,
    OutboundAdapter,
    Infrastructure,
    Testkit,
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::Domain,
        Layer::Port,
        Layer::Application,
        Layer::InboundAdapter,
        Layer::OutboundAdapter,
        Layer::Infrastructure,
        Layer::Testkit,
    ];

    /// Source directory, relative to the crate root.
    pub fn dir(self) -> &'static str {
        match self {
            Layer::Domain => "src/domain",
            Layer::Port => "src/port",
            Layer::Application => "src/application",
            Layer::InboundAdapter => "src/adapter/inbound",
            Layer::OutboundAdapter => "src/adapter/outbound",
            Layer::Infrastructure => "src/infrastructure",
            Layer::Testkit => "src/testkit",
        }
    }

    /// Layer addressed by a path following `crate::`. Root modules shared by
    /// every layer (`error`) map to `None`.
    fn of_path(path: &str) -> Option<Layer> {
        let mut segments = path.split("::");
        match (segments.next()?, segments.next()) {
            ("domain", _) => Some(Layer::Domain),
            ("port", _) => Some(Layer::Port),
            ("application", _) => Some(Layer::Application),
            ("adapter", Some("inbound")) => Some(Layer::InboundAdapter),
            ("adapter", Some("outbound")) => Some(Layer::OutboundAdapter),
            ("infrastructure", _) => Some(Layer::Infrastructure),
            ("testkit", _) => Some(Layer::Testkit),
            _ => None,
        }
    }
}

/// One reference from a layer's production code into another layer.
#[derive(Debug, Clone)]
pub struct CrossImport {
    pub file: String,
    pub line: usize,
    pub target: Layer,
}

impl fmt::Display for CrossImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} -> {:?}", self.file, self.line, self.target)
    }
}

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn relative_path(path: &Path) -> String {
    path.strip_prefix(root())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn rs_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries =
        fs::read_dir(dir).unwrap_or_else(|e| panic!("failed to read {}: {e}", dir.display()));
    for entry in entries {
        let path = entry
            .unwrap_or_else(|e| panic!("failed to read dir entry: {e}"))
            .path();
        if path.is_dir() {
            rs_files(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
}

/// `(file, line number, line)` for every production line of `layer`.
fn production_lines(layer: Layer) -> Vec<(String, usize, String)> {
    let mut files = Vec::new();
    rs_files(&root().join(layer.dir()), &mut files);
    files.sort();

    let mut lines = Vec::new();
    for file in files {
        let content = fs::read_to_string(&file)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", file.display()));
        let name = relative_path(&file);
        for (idx, line) in content.lines().enumerate() {
            let code = line.trim_start();
            if code.starts_with("#[cfg(test)]") {
                break;
            }
            if !code.starts_with("//") {
                lines.push((name.clone(), idx + 1, line.to_string()));
            }
        }
    }
    lines
}

/// Every `crate::` reference from `layer` into a different layer.
pub fn cross_imports(layer: Layer) -> Vec<CrossImport> {
    let mut found = Vec::new();
    for (file, line, text) in production_lines(layer) {
        for (at, _) in text.match_indices("crate::") {
            let path = &text[at + "crate::".len()..];
            match Layer::of_path(path) {
                Some(target) if target != layer => found.push(CrossImport {
                    file: file.clone(),
                    line,
                    target,
                }),
                _ => {}
            }
        }
    }
    found
}

/// Production lines of `layer` that name any of the external crates.
pub fn external_uses(layer: Layer, crates: &[&str]) -> Vec<(String, usize, String)> {
    production_lines(layer)
        .into_iter()
        .filter(|(_, _, text)| crates.iter().any(|name| text.contains(&format!("{name}::"))))
        .collect()
}

pub fn path_exists(relative_path: &str) -> bool {
    root().join(relative_path).exists()
}
