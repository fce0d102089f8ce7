use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use cmdgraph_cli::cli_args::Args;
use cmdgraph_cli::runner;
use cmdgraph_core::output::ForwardingOutput;
use cmdgraph_core::shell::SystemRunner;

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let mut output = ForwardingOutput::std();
    let result = runner::run(&args, Rc::new(SystemRunner), &mut output);
    output.close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Graph errors were already written through the output.
            if e.graph_error().is_none() {
                eprintln!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}
