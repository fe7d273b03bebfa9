mod aggregate;
mod bookvalue;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod kinds;
mod logging;
mod models;
mod notebook;
mod numbering;
mod resolver;
mod session;
mod settings;
mod signs;
mod visibility;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(&settings::load_settings());

    let result = match cli.command {
        None | Some(Commands::Status) => cli::status::run(),
        Some(Commands::Init {
            data_dir,
            fiscal_year,
        }) => cli::init::run(data_dir, fiscal_year),
        Some(Commands::Load { file, balance }) => cli::load::run(&file, balance.as_deref()),
        Some(Commands::Show { block, details }) => cli::show::run(block.as_deref(), details),
        Some(Commands::Toggle { block, switch }) => cli::toggle::rows(&block, switch),
        Some(Commands::Visibility { block, switch }) => cli::toggle::visibility(&block, switch),
        Some(Commands::AlwaysShow { block, switch }) => cli::toggle::always_show(&block, switch),
        Some(Commands::Edit { block }) => cli::edit::start(&block),
        Some(Commands::Set {
            block,
            variable,
            value,
            previous,
        }) => cli::edit::set(&block, &variable, &value, previous),
        Some(Commands::Approve { block }) => cli::edit::approve(&block),
        Some(Commands::Cancel { block }) => cli::edit::cancel(&block),
        Some(Commands::Undo { block }) => cli::edit::undo(&block),
        Some(Commands::Log { limit }) => cli::log::run(limit),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
