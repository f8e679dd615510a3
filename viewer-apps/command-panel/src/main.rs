mod args;

use std::process::ExitCode;

use command_panel::{logging::init_logging, CommandPanel};
use tracing::error;

use crate::args::process_cli_args;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match process_cli_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("command-panel: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("command-panel: {e}");
        return ExitCode::FAILURE;
    }

    match CommandPanel::new(config).start().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command panel failed: {e}");
            eprintln!("command-panel: {e}");
            ExitCode::FAILURE
        }
    }
}
