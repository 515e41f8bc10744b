use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crossfill::{find_fill, load_structure, load_word_list, render_grid, FillOptions, Inference};

/// Fill a crossword structure with words from a word list.
#[derive(Parser, Debug)]
#[command(name = "crossfill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Structure file: one row per line, `_` for open cells and `#` for blocks
    structure: PathBuf,

    /// Word list: one word per line (an optional `;score` suffix is ignored)
    words: PathBuf,

    /// Also write the rendered fill to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pruning to perform after each choice
    #[arg(short, long, value_enum, default_value_t = InferenceArg::Forward)]
    inference: InferenceArg,

    /// Give up after visiting this many search states
    #[arg(long)]
    max_states: Option<u64>,

    /// Give up after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InferenceArg {
    None,
    Forward,
    Mac,
}

impl From<InferenceArg> for Inference {
    fn from(arg: InferenceArg) -> Inference {
        match arg {
            InferenceArg::None => Inference::None,
            InferenceArg::Forward => Inference::ForwardChecking,
            InferenceArg::Mac => Inference::MaintainArcConsistency,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug_enabled = cli.debug || std::env::var("CROSSFILL_DEBUG").is_ok();
    crossfill::logging::init_logger(debug_enabled);

    match try_main(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load the inputs, fill the grid, and print the result. Returns whether a fill was found.
fn try_main(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let structure = load_structure(&cli.structure)?;
    let vocabulary = load_word_list(&cli.words)?;

    let options = FillOptions {
        inference: cli.inference.into(),
        max_states: cli.max_states,
        time_limit: cli.time_limit_ms.map(Duration::from_millis),
    };

    match find_fill(&structure, &vocabulary, &options) {
        Ok(result) => {
            let display_grid = render_grid(&structure, &result.assignment);

            eprintln!("{:?}", result.statistics);
            println!("{}", display_grid);

            if let Some(output) = &cli.output {
                fs::write(output, display_grid + "\n")?;
                eprintln!("Wrote fill to {}", output.display());
            }

            Ok(true)
        }
        Err(failure) => {
            log::debug!("Fill failed: {failure}");
            println!("{}", failure);
            Ok(false)
        }
    }
}
