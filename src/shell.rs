//! Shell integration: the command-not-found hook scripts.

use crate::error::{ErrorKind, Result};
use clap::ValueEnum;
use derive_more::Display;
use exn::OptionExt;
use rust_embed::Embed;
use std::borrow::Cow;
use std::path::Path;

#[derive(Embed)]
#[folder = "assets/"]
struct Handlers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, ValueEnum)]
pub enum Shell {
    #[display("bash")]
    Bash,
    #[display("zsh")]
    Zsh,
    #[display("fish")]
    Fish,
}
impl Shell {
    /// The user's shell, from `$SHELL`.
    pub fn detect() -> Result<Self> {
        let shell = std::env::var_os("SHELL").unwrap_or_default();
        Self::from_path(Path::new(&shell))
    }

    /// Identify a shell from its executable path, e.g. `/usr/bin/zsh`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        // Login shells are reported as `-zsh`.
        match name.trim_start_matches('-') {
            "bash" | "sh" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "fish" => Ok(Self::Fish),
            _ => exn::bail!(ErrorKind::UnsupportedShell(path.display().to_string())),
        }
    }

    pub fn handler_name(self) -> &'static str {
        match self {
            Self::Bash | Self::Zsh => "handler.sh",
            Self::Fish => "handler.fish",
        }
    }

    /// The hook script's contents.
    pub fn handler(self) -> Result<Cow<'static, [u8]>> {
        let name = self.handler_name();
        Handlers::get(name).map(|f| f.data).ok_or_raise(|| ErrorKind::UnsupportedShell(self.to_string()))
    }

    /// Lines to add to the shell's startup file.
    pub fn instructions(self) -> String {
        match self {
            Self::Bash | Self::Zsh => format!(
                "# To enable the whence command-not-found hook\n\
                 # add the following line to ~/.{self}rc\n\n\
                 eval \"$(whence init --shell {self})\"\n"
            ),
            Self::Fish => "# To enable the whence command-not-found hook\n\
                 # add the following line to ~/.config/fish/config.fish\n\n\
                 source (whence init --shell fish)\n"
                .to_string(),
        }
    }
}
