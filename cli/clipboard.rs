use log;
use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("No suitable clipboard command found (tried tmux, wl-copy, xsel, xclip, pbcopy, clip.exe, termux-clipboard-set)")]
    NoClipboardFound,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipboardProvider {
    Tmux,
    Wayland,
    Xsel,
    Xclip,
    MacOS,
    Wsl,
    Termux,
}

impl ClipboardProvider {
    /// Preference order.
    const ALL: [ClipboardProvider; 7] = [
        ClipboardProvider::Tmux,
        ClipboardProvider::Wayland,
        ClipboardProvider::Xsel,
        ClipboardProvider::Xclip,
        ClipboardProvider::MacOS,
        ClipboardProvider::Wsl,
        ClipboardProvider::Termux,
    ];

    fn program(self) -> &'static str {
        match self {
            Self::Tmux => "tmux",
            Self::Wayland => "wl-copy",
            Self::Xsel => "xsel",
            Self::Xclip => "xclip",
            Self::MacOS => "pbcopy",
            Self::Wsl => "clip.exe",
            Self::Termux => "termux-clipboard-set",
        }
    }

    fn args(self) -> &'static [&'static str] {
        match self {
            Self::Tmux => &["load-buffer", "-w", "-"],
            Self::Xsel => &["-b", "-i"],
            Self::Xclip => &["-selection", "clipboard", "-in"],
            Self::Wayland | Self::MacOS | Self::Wsl | Self::Termux => &[],
        }
    }

    fn is_available(self) -> bool {
        let program = self.program();
        // tmux is only useful from inside a session.
        if self == Self::Tmux && env::var_os("TMUX").is_none() {
            return false;
        }
        command_exists(program)
    }

    fn copy(self, text: &str) -> Result<(), ClipboardError> {
        pipe_to_command(self.program(), self.args(), text)
    }
}

fn pipe_to_command(program: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClipboardError::CommandFailed(format!("Failed to spawn {}: {}", program, e)))?;

    let written = match child.stdin.take() {
        // stdin is dropped at the end of this arm so the command sees EOF.
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Err(io::Error::other(format!("Failed to open stdin for {}", program))),
    };
    if let Err(e) = written {
        // Reap the child before reporting the write failure.
        let _ = child.kill();
        let _ = child.wait();
        return Err(ClipboardError::Io(e));
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(ClipboardError::CommandFailed(format!(
            "{} exited with status: {}",
            program, status
        )))
    }
}

/// Pipes `text` into the first clipboard command found on this system.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    let provider = ClipboardProvider::ALL
        .into_iter()
        .find(|p| p.is_available())
        .ok_or(ClipboardError::NoClipboardFound)?;
    log::debug!("Copying {} bytes with {:?}", text.len(), provider);
    provider.copy(text)
}

pub fn command_exists(command: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(command).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("nonexistentcommandxyz"));
    }

    #[test]
    #[cfg(unix)]
    fn pipe_to_command_waits_for_a_successful_reader() {
        assert!(pipe_to_command("cat", &[], "hello").is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn pipe_to_command_reports_nonzero_exit() {
        assert!(matches!(
            pipe_to_command("false", &[], "hello"),
            Err(ClipboardError::CommandFailed(_)) | Err(ClipboardError::Io(_))
        ));
    }

    #[test]
    #[cfg(unix)]
    fn pipe_to_command_reaps_child_when_write_fails() {
        // The reader exits without consuming stdin, so a large write hits a broken pipe.
        let text = "x".repeat(1 << 20);
        let result = pipe_to_command("sh", &["-c", "exit 0"], &text);
        assert!(matches!(result, Err(ClipboardError::Io(_))));
    }

    #[test]
    fn missing_program_is_a_spawn_failure() {
        assert!(matches!(
            pipe_to_command("nonexistentcommandxyz", &[], "hello"),
            Err(ClipboardError::CommandFailed(_))
        ));
    }

    #[test]
    fn providers_are_tried_in_preference_order() {
        let programs: Vec<&str> = ClipboardProvider::ALL
            .iter()
            .map(|p| p.program())
            .collect();
        assert_eq!(
            programs,
            vec![
                "tmux",
                "wl-copy",
                "xsel",
                "xclip",
                "pbcopy",
                "clip.exe",
                "termux-clipboard-set"
            ]
        );
    }
}
