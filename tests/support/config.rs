use std::io::Write;

use tempfile::NamedTempFile;

pub use optivault::testkit::config::MINIMAL_TOML;

/// Write `contents` to a temp `.toml` file removed on drop.
pub fn temp_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("optivault-config-")
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

/// Write `contents` to a temp `.json` file removed on drop.
pub fn temp_json(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("optivault-positions-")
        .suffix(".json")
        .tempfile()
        .expect("create temp positions file");
    file.write_all(contents.as_bytes())
        .expect("write temp positions file");
    file
}

/// Minimal config plus a static ETH quote, as used by CLI risk runs.
pub fn config_with_quote() -> String {
    format!(
        "{MINIMAL_TOML}\n[workers]\ncount = 1\n\n\
         [[market.quotes]]\nunderlying = \"ETH\"\nprice = 2000\nvolatility = 0.6\n"
    )
}
