use GeochemBasis::Utils::task_loader::GeochemTask;
use log::{error, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::env;
use std::process::ExitCode;

const DEFAULT_TASK: &str = "data/task.txt";

pub fn main() -> ExitCode {
    let task_file = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_TASK.to_string());
    let task = match GeochemTask::from_file(&task_file) {
        Ok(task) => task,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = TermLogger::init(
        task.settings.log_level_filter(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("logger not initialised: {}", e);
    }

    match task.resolve() {
        Ok(resolver) => {
            resolver.model().pretty_print();
            info!("reduced model built from {}", task_file);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
