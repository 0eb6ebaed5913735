use clap::Parser;
use notevault::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => notevault::cli::commands::init::execute(&cli),
        Commands::Status => notevault::cli::commands::status::execute(&cli),
        Commands::Unlock => notevault::cli::commands::unlock::execute(&cli),
        Commands::ChangePassword => notevault::cli::commands::change_password::execute(&cli),
        Commands::Recover => notevault::cli::commands::recover::execute(&cli),
        Commands::Completions { ref shell } => {
            notevault::cli::commands::completions::execute(shell)
        }
    };

    if let Err(e) = result {
        notevault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
