// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use poseviz::cli::args::Cli;
use poseviz::cli::run::run;

fn main() {
    let cli = Cli::parse();
    run(&cli);
}
