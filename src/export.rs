use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Rough estimate: GPT-style token ≈ 4 bytes (good enough for UI)
pub fn approx_tokens(bytes: u64) -> u64 {
    bytes / 4
}

/// Concatenates the selected files, each behind a `--- FILE: <path> ---`
/// header. Unreadable files are reported inline instead of aborting.
pub fn render_context(root: &Path, paths: &BTreeSet<String>) -> String {
    let mut out = String::new();
    for relative in paths {
        out.push_str(&format!("\n--- FILE: {relative} ---\n"));
        let full = root.join(relative);
        match fs::read(&full) {
            Ok(bytes) => out.push_str(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                warn!(path = ?full, error = %e, "Could not read selected file");
                out.push_str(&format!("(Error reading file: {e})\n"));
            }
        }
        out.push('\n');
    }
    out
}
