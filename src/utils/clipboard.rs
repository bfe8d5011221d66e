use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Destination for "copy message" requests.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Clipboard backed by the platform's command-line helpers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), String> {
        #[cfg(target_os = "macos")]
        {
            return run_with_stdin("pbcopy", &[], text).await;
        }
        #[cfg(target_os = "windows")]
        {
            return run_with_stdin("cmd", &["/C", "clip"], text).await;
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            if run_with_stdin("wl-copy", &[], text).await.is_ok() {
                return Ok(());
            }
            if run_with_stdin("xclip", &["-selection", "clipboard"], text)
                .await
                .is_ok()
            {
                return Ok(());
            }
            if run_with_stdin("xsel", &["--clipboard", "--input"], text)
                .await
                .is_ok()
            {
                return Ok(());
            }
            Err("No clipboard command found (install wl-copy, xclip, or xsel)".to_string())
        }
    }
}

async fn run_with_stdin(cmd: &str, args: &[&str], input: &str) -> Result<(), String> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|_| format!("Clipboard command `{cmd}` not available"))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(input.as_bytes()).await {
            let _ = child.wait().await;
            return Err(format!("Clipboard command `{cmd}` did not accept the text: {err}"));
        }
    }
    match child.wait().await {
        Ok(status) if status.success() => Ok(()),
        _ => Err(format!("Clipboard command `{cmd}` failed")),
    }
}
