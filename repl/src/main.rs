use frame::Vm;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use colored::*;
use rustyline::error::ReadlineError;
use rustyline::{CompletionType, Config, Editor};
use structopt::StructOpt;

const PROMPT: &str = ">> ";

#[derive(StructOpt)]
struct Cli {
    /// Show elapsed time for each input
    #[structopt(short, long)]
    show_elapsed_time: bool,
    /// Scripts to interpret, in order, on one shared machine
    #[structopt(parse(from_os_str))]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli_options = Cli::from_args();
    let mut vm = interp::boot("minsky");

    if cli_options.inputs.is_empty() {
        repl(&mut vm, cli_options.show_elapsed_time)
    } else {
        exec_scripts(&mut vm, cli_options.inputs, cli_options.show_elapsed_time)
    }
}

// Script mode: every file runs on the same machine, so later scripts see
// what earlier ones built. The first failure stops the run with a nonzero
// exit; success ends with a full dump of the machine.
fn exec_scripts(
    vm: &mut Vm, inputs: Vec<PathBuf>, show_elapsed_time: bool,
) -> Result<(), Box<dyn Error>> {
    for path in inputs {
        let code = fs::read_to_string(&path)?;
        let start = Instant::now();
        if let Err(e) = interp::run(vm, &code[..]) {
            println!("{}: {}: {}", "error".red(), path.display(), e);
            process::exit(1);
        }
        if show_elapsed_time {
            println!("[{}: {:?}]", "elapsed time".green(), start.elapsed());
        }
    }
    println!("{}", vm.dump(true));
    Ok(())
}

// Interactive mode: errors report and the session carries on, state
// intact. Leaving with CTRL-D prints the same full dump script mode ends
// with.
fn repl(vm: &mut Vm, show_elapsed_time: bool) -> Result<(), Box<dyn Error>> {
    println!(
        "Hello {}!. This is the minsky frame machine!",
        whoami::username()
    );
    println!("Feel free to type in commands");
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::<()>::with_config(config);
    let _err = rl.load_history("history.txt");
    loop {
        let readline = rl.readline(PROMPT);
        match readline {
            Ok(line) => {
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line[..]);
                let start = Instant::now();
                match interp::run(vm, &line[..]) {
                    Err(e) => println!("{}: {}", "error".red(), e),
                    Ok(()) => {
                        println!("{}", vm.dump(false));
                        if show_elapsed_time {
                            println!("[{}: {:?}]", "elapsed time".green(), start.elapsed());
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history("history.txt")?;
    println!("{}", vm.dump(true));
    Ok(())
}
