//! oaslint binary entry point.
//! Wires the built-in collaborators into the orchestrator and maps the
//! verdict to the exit status.

use clap::Parser;
use oaslint::cli::Cli;
use oaslint::config::{self, FsConfigLoader};
use oaslint::entrypoints::FallbackResolver;
use oaslint::lint::BuiltinLinter;
use oaslint::orchestrator::Orchestrator;
use oaslint::output::Printer;
use oaslint::sink::{self, ActionSink};
use oaslint::utils;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("oaslint=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let entrypoints = cli.entrypoints_input();
    let eff = config::resolve_effective(
        cli.config.as_deref(),
        cli.config_file.as_deref(),
        entrypoints.as_deref(),
        cli.format.as_deref(),
        cli.max_problems.as_deref(),
        cli.on_load_error.as_deref(),
    );

    let cwd = std::env::current_dir()?;
    let color = utils::use_colors(eff.format.as_deref());
    let loader = FsConfigLoader { cwd: cwd.clone() };
    let linter = BuiltinLinter::new(cwd.clone());
    let printer = Printer::new(color, cwd);
    let orchestrator = Orchestrator {
        loader: &loader,
        resolver: &FallbackResolver,
        linter: &linter,
        formatter: &printer,
    };

    let mut sink = ActionSink::stdio(sink::in_github_actions(), color);
    let report = orchestrator.run(&eff, &mut sink);
    if report.failed {
        std::process::exit(1);
    }
    Ok(())
}
