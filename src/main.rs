// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! spacey-pack CLI - bundle runtime tooling

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use spacey_pack_runtime::bootstrap::{BrowserBootstrap, HostBindings, HostBootstrap};
use spacey_pack_runtime::config::{BrowserConfig, CONFIG_FILE_NAME};
use spacey_pack_runtime::globals::ShimSet;
use spacey_pack_runtime::probe::{self, PROBE_CHILD_COMMAND};
use spacey_pack_runtime::{ModuleTable, NativeFunction, PackConfig, RuntimeError, VERSION, Value};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "spacey-pack",
    about = "Runtime tooling for Spacey bundles",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the export names of a builtin module as a JSON array
    Probe {
        /// Builtin specifier, e.g. `timers` or `node:buffer`
        specifier: String,
    },

    /// Load a native addon from a file holding its base64 payload
    LoadAddon {
        /// Logical addon name
        name: String,
        /// File with the base64 payload
        payload: PathBuf,
    },

    /// Bootstrap a browser-variant bundle that exercises the shims
    RunShims {
        /// Arguments exposed as `process.argv`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(name = PROBE_CHILD_COMMAND, hide = true)]
    ProbeChild { specifier: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries command output
    let filter = if cli.verbose {
        "spacey_pack=debug,spacey_pack_runtime=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::ProbeChild { specifier } => match probe::run_child(&specifier) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        },
        Command::Probe { specifier } => {
            let program = std::env::current_exe()?;
            match probe::probe_exports(&program, &specifier) {
                Ok(names) => println!("{}", serde_json::to_string(&names)?),
                Err(RuntimeError::ProbeFailed {
                    status,
                    signal,
                    stderr,
                    ..
                }) => {
                    std::io::stderr().write_all(&stderr)?;
                    mirror_exit(status, signal);
                }
                Err(e) => fail(e),
            }
        }
        Command::LoadAddon { name, payload } => {
            let config = PackConfig::load_or_default(&cli.config)?;
            tracing::debug!("addon temp dir: {}", config.host.temp_dir.display());
            let payload = std::fs::read_to_string(&payload)?;
            load_addon(config, name, payload);
        }
        Command::RunShims { args } => run_shims(args),
    }

    Ok(())
}

fn load_addon(config: PackConfig, name: String, payload: String) {
    let mut table = ModuleTable::new();
    table.push(format!("<addon>/{}", name), move |scope| {
        scope.load_addon(&name, &payload)
    });

    match HostBootstrap::new(config.host).run(table) {
        Ok(runtime) => println!("{} {}", "Loaded".green().bold(), runtime.exports()),
        Err(e) => fail(e),
    }
}

fn run_shims(args: Vec<String>) {
    let shims = ShimSet::new(args);
    let mut table = ModuleTable::new();
    table.push("<run-shims>/index.js", |scope| {
        let context = scope.context();
        let console = context.get("console");
        let process = context.get("process");
        let greeting = format!(
            "spacey-pack v{} on {}-{}",
            VERSION,
            process.get("platform"),
            process.get("arch")
        );
        console.get("log").call(&[greeting.into()])?;

        let done = NativeFunction::new("done", move |_| {
            console.get("log").call(&[Value::from("timers drained")])
        });
        context
            .get("setTimeout")
            .call(&[done.into(), Value::Number(1.0)])?;
        Ok(())
    });
    let ids = shims.install(&mut table);

    let result = BrowserBootstrap::new(BrowserConfig { shims: ids })
        .run(table, HostBindings::default())
        .and_then(|_runtime| shims.timers().run_until_idle());
    if let Err(e) = result {
        fail(e);
    }
}

fn fail(e: RuntimeError) -> ! {
    eprintln!("{}: {}", "Error".red().bold(), e);
    std::process::exit(1);
}

/// Terminate the way the probe child did
fn mirror_exit(status: Option<i32>, signal: Option<i32>) -> ! {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, raise};

        if let Some(signal) = signal {
            if let Ok(sig) = Signal::try_from(signal) {
                let _ = raise(sig);
            }
            std::process::exit(128 + signal);
        }
    }
    std::process::exit(status.unwrap_or(1))
}
