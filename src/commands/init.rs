use crate::cli::InitArgs;
use crate::error::{ErrorKind, Result};
use crate::shell::Shell;
use exn::ResultExt;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// On a terminal, explain how to enable the hook. Otherwise print what the
/// shell should evaluate: the script itself for bash and zsh, or the path of
/// a file to `source` for fish.
pub fn run(args: &InitArgs) -> Result<()> {
    let shell = match args.shell {
        Some(shell) => shell,
        None => Shell::detect()?,
    };
    let mut stdout = io::stdout().lock();
    let text = if stdout.is_terminal() {
        shell.instructions()
    } else {
        let data_dir = whence_config::data_dir().or_raise(|| ErrorKind::Config)?;
        hook(shell, &data_dir)?
    };
    stdout.write_all(text.as_bytes()).map_err(ErrorKind::Io)?;
    Ok(())
}

fn hook(shell: Shell, data_dir: &Path) -> Result<String> {
    let handler = shell.handler()?;
    match shell {
        Shell::Bash | Shell::Zsh => Ok(String::from_utf8_lossy(&handler).into_owned()),
        Shell::Fish => {
            let path = install_handler(data_dir, shell.handler_name(), &handler)?;
            Ok(format!("{}\n", path.display()))
        },
    }
}

/// Write `handler` into `data_dir`, leaving an identical copy untouched.
fn install_handler(data_dir: &Path, name: &str, handler: &[u8]) -> Result<PathBuf> {
    let path = data_dir.join(name);
    if fs::read(&path).is_ok_and(|existing| existing == handler) {
        return Ok(path);
    }
    fs::create_dir_all(data_dir).map_err(ErrorKind::Io)?;
    fs::write(&path, handler).map_err(ErrorKind::Io)?;
    tracing::debug!(path = %path.display(), "Installed shell handler");
    Ok(path)
}
