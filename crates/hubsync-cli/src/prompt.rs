//! Terminal prompts.
//!
//! Uses dialoguer for input; every prompt has a flag that skips it so the
//! binary stays scriptable.

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};

/// Ask before deleting `name`. `yes` skips the prompt.
///
/// The user must type the repository name, then confirm.
pub fn confirm_delete(name: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !console::user_attended() {
        bail!("refusing to delete {name} without a terminal; pass --yes");
    }

    let theme = ColorfulTheme::default();
    println!(
        "{} This permanently deletes {} and its history.",
        style("⚠").yellow(),
        style(name).bold()
    );
    let typed: String = Input::with_theme(&theme)
        .with_prompt("Type the repository name to continue")
        .allow_empty(true)
        .interact_text()
        .context("failed to read confirmation")?;
    if typed.trim() != name {
        return Ok(false);
    }

    Confirm::with_theme(&theme)
        .with_prompt("Delete it now?")
        .default(false)
        .interact()
        .context("failed to read confirmation")
}

/// Read an access token without echoing it.
pub fn ask_token() -> Result<String> {
    if !console::user_attended() {
        bail!("no token given; pass it as an argument or set HUBSYNC_TOKEN");
    }
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Personal access token")
        .interact()
        .context("failed to read the token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_skips_the_prompt() {
        assert!(confirm_delete("demo", true).expect("should not prompt"));
    }
}
