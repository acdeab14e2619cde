use anyhow::{Context, Result};
use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;
use tracing::debug;

/// Hidden argument that turns the process into a clipboard holder.
pub const HOLDER_FLAG: &str = "__punjado_clipboard_holder";

/// On Linux the clipboard content disappears with the process that set it,
/// so a detached copy of ourselves keeps serving it until replaced.
#[cfg(target_os = "linux")]
fn run_holder() -> Result<()> {
    let text = std::io::read_to_string(std::io::stdin())?;
    let mut clipboard = Clipboard::new()?;
    // `wait` blocks until another owner takes the selection over.
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Returns Ok(true) if this process was started as the clipboard holder and
/// has finished serving, Ok(false) for a normal invocation.
pub fn run_holder_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == HOLDER_FLAG) {
        return Ok(false);
    }
    #[cfg(target_os = "linux")]
    {
        run_holder()?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        eprintln!("Warning: {HOLDER_FLAG} is only meaningful on Linux. Ignoring.");
    }
    Ok(true)
}

pub fn copy_text_to_clipboard(text: String) -> Result<()> {
    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new().context("Could not open the clipboard")?;
        clipboard.set_text(text)?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(HOLDER_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()
            .context("Could not start clipboard holder")?;

        let mut stdin = child
            .stdin
            .take()
            .context("Clipboard holder has no stdin")?;
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
        debug!(pid = child.id(), bytes = text.len(), "Handed text to clipboard holder");
    }
    Ok(())
}
