use clap::Parser;

use genecraft_lib::commands::Cli;

#[tokio::main]
async fn main() {
    let code = genecraft_lib::run(Cli::parse()).await;
    std::process::exit(code);
}
