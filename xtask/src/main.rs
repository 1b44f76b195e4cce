// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Asset pipeline tasks for Khora packages
// Run with: cargo xtask <command>

mod commands;
mod helpers;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask", version, about = "Khora asset package tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a package from the source directories listed in Assets.toml
    Pack {
        /// Path to the asset configuration file
        #[arg(long, default_value = "Assets.toml")]
        config: PathBuf,
    },
    /// Load a package and print its catalog
    Inspect {
        /// A loose package directory or an archive file
        path: PathBuf,
        /// Also check every asset against its recorded checksum
        #[arg(long)]
        verify: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Pack { config } => commands::assets::pack(&config),
        Command::Inspect { path, verify } => commands::assets::inspect(&path, verify),
    };

    if let Err(e) = result {
        helpers::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
