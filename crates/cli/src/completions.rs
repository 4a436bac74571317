// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf completions <shell>`
//!
//! Prints the script, or with `--dir` writes it under the file name the
//! shell looks for (`pf.bash`, `_pf`, `pf.fish`):
//!
//! ```bash
//! pf completions bash --dir ~/.local/share/bash-completion/completions
//! pf completions zsh --dir ~/.zfunc
//! ```
//!
//! Runs before any project is opened, so it works outside a paperflow root.

use clap::CommandFactory;
use clap_complete::{generate, generate_to, Shell};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script into this directory instead of stdout
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

/// Write the completion script for `C` to `out`
pub fn write_completions<C: CommandFactory>(shell: Shell, out: &mut dyn Write) {
    let mut cmd = C::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}

/// Install the completion script for `C` into `dir`, returning its path
pub fn install_completions<C: CommandFactory>(shell: Shell, dir: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut cmd = C::command();
    let name = cmd.get_name().to_string();
    generate_to(shell, &mut cmd, name, dir)
}

pub fn handle<C: CommandFactory>(args: &CompletionsArgs) -> io::Result<()> {
    match &args.dir {
        Some(dir) => {
            let path = install_completions::<C>(args.shell, dir)?;
            println!("Wrote {}", path.display());
        }
        None => write_completions::<C>(args.shell, &mut io::stdout()),
    }
    Ok(())
}

#[cfg(test)]
#[path = "completions_tests.rs"]
mod tests;
