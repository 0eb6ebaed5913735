//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use console::style;

use crate::crypto::RecoverySecret;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Display a recovery secret prominently.
///
/// This is the only time the secret is ever shown; it is not persisted
/// anywhere.
pub fn print_recovery_secret(secret: &RecoverySecret) {
    println!();
    warning("Write down this recovery secret and store it somewhere safe.");
    warning("It is shown only once and cannot be retrieved later.");
    println!();
    println!("    {}", style(secret.as_str()).cyan().bold());
    println!();
    tip("Anyone with this secret can reset your vault password.");
}
