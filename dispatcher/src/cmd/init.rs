//! `faucet-dispatcher init` — write a default TOML configuration file.

use std::fs;
use std::path::Path;

use crate::config::generate_default_config;
use crate::error::Error;

/// Execute the `init` command.
///
/// Refuses to overwrite an existing file unless `force` is `true`.
///
/// # Errors
///
/// Returns an error if the file already exists (without `--force`) or if
/// writing fails.
#[allow(clippy::print_stderr)]
pub fn run(output: &Path, force: bool) -> Result<(), Error> {
    if output.exists() && !force {
        return Err(Error::config(format!(
            "'{}' already exists, use --force to overwrite",
            output.display()
        )));
    }

    fs::write(output, generate_default_config())
        .map_err(|e| Error::config_with(format!("failed to write '{}'", output.display()), e))?;

    eprintln!("Config file written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_to_overwrite_without_force() {
        let path = std::env::temp_dir().join(format!(
            "faucet-dispatcher-init-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "keep me").expect("temp file writable");

        assert!(matches!(run(&path, false), Err(Error::Config(_))));
        assert_eq!(fs::read_to_string(&path).expect("readable"), "keep me");

        run(&path, true).expect("forced write succeeds");
        assert_eq!(
            fs::read_to_string(&path).expect("readable"),
            generate_default_config()
        );
        fs::remove_file(&path).ok();
    }
}
