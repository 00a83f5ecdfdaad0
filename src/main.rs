use clap::Parser;
use secretvaults::cli::{commands, output, Cli, Commands};
use secretvaults::config::Settings;
use secretvaults::errors::Result;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        output::error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    secretvaults::logging::init(cli.verbose, &settings.log_filter);

    match cli.command {
        Commands::Keygen => commands::keygen::execute(),
        Commands::User { ref action } => commands::user::execute(cli, &settings, action),
        Commands::Vault { ref action } => commands::vault::execute(cli, &settings, action),
        Commands::Entry { ref action } => commands::entry::execute(cli, &settings, action),
        Commands::Secret { ref action } => commands::secret::execute(cli, &settings, action),
    }
}
