use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mc_mod_getter::commands;

#[derive(Parser)]
#[command(name = "mc-mod-getter")]
#[command(about = "Download the mods listed in a YAML file from Modrinth or CurseForge")]
#[command(version)]
struct Cli {
    /// Path to mod yaml file
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    mc_mod_getter::init_logging(cli.verbose);

    match commands::sync_from_file(&cli.file).await {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
