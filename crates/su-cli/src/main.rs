use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::{env, fs};

use su_core::{
    parse_program, parse_repl_line, AdapterRegistry, Engine, JobState, NullAdapter, StdPrint, DEFAULT_ADAPTER_TIMEOUT,
};

fn build_engine() -> Engine<StdPrint> {
    let mut adapters = AdapterRegistry::new(DEFAULT_ADAPTER_TIMEOUT);
    for language in ["lua", "py", "python", "go", "node"] {
        adapters.register(language, Box::new(NullAdapter::new(language)));
    }
    let jobs = su_core::JobManager::new(4, 64);
    Engine::new(adapters, jobs, StdPrint)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.get(1) {
        Some(path) => run_batch(path),
        None => run_repl(),
    }
}

fn run_batch(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error reading {path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let program = match parse_program(&source) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let mut engine = build_engine();
    match engine.run_program(&program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// A line-oriented REPL (spec.md §6.1/§6.3): reads one statement per line,
/// echoes its value when it has one, and polls background-job completions
/// between prompts (spec.md §4.M).
fn run_repl() -> ExitCode {
    let mut engine = build_engine();
    let stdin = io::stdin();
    let mut exit_code = ExitCode::SUCCESS;

    print!("su> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };

        for note in engine.poll_job_notifications() {
            report_job_notification(&note);
        }

        match parse_repl_line(&line) {
            Ok(Some(stmt)) => match engine.eval_repl_stmt(&stmt) {
                Ok(outcome) => {
                    if outcome.has_result {
                        println!("{}", outcome.value.display_repl());
                    }
                }
                Err(err) => {
                    eprintln!("{err}");
                    exit_code = ExitCode::FAILURE;
                }
            },
            Ok(None) => {}
            Err(err) => {
                eprintln!("{err}");
                exit_code = ExitCode::FAILURE;
            }
        }

        print!("su> ");
        let _ = io::stdout().flush();
    }
    exit_code
}

fn report_job_notification(note: &su_core::JobNotification) {
    match &note.state {
        JobState::Completed(value) => eprintln!("[job {}] completed: {value}", note.id),
        JobState::Failed(err) => eprintln!("[job {}] failed: {err}", note.id),
        JobState::Running => {}
    }
}
