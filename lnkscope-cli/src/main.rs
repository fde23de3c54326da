mod app;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::debug;

use lnkscope::encoding::{Codec, CodecFactory};
use lnkscope::output::{list, yaml, Level};
use lnkscope::Lnk;

use crate::app::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // lnkscope warnings and up on stderr; --verbose enables debug; RUST_LOG overrides
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let codec = resolve_codec(cli.codepage.as_deref());
    let level = if cli.all { Level::Debug } else { Level::Normal };
    // YAML is the default emitter
    let yaml_out = cli.yaml || !cli.list;

    let mut failed = false;
    for path in &cli.files {
        let name = path.display().to_string();
        let output = match parse_file(path) {
            Ok(output) => output,
            Err(err) => {
                eprintln!("{name}: {err}");
                failed = true;
                continue;
            }
        };
        let mut text = String::new();
        if yaml_out {
            yaml::dump(&mut text, &output, codec.as_deref(), &name, level)?;
        }
        if cli.list {
            list::dump(&mut text, &output, codec.as_deref(), level)?;
        }
        print!("{text}");
    }

    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn parse_file(path: &std::path::Path) -> lnkscope::Result<lnkscope::output::Stream> {
    let mut lnk = Lnk::open(path)?;
    lnk.parse()?;
    for warning in lnk.warnings() {
        debug!("{}: {warning}", path.display());
    }
    Ok(lnk.output())
}

fn resolve_codec(name: Option<&str>) -> Option<Arc<Codec>> {
    let name = name?;
    match CodecFactory::by_name(name) {
        Some(codec) => Some(codec),
        None => {
            eprintln!(
                "codepage '{name}' is unknown or ambiguous; strings are left undecoded.\n\
                 Known codepages:"
            );
            for label in Codec::labels() {
                eprintln!("  {label}");
            }
            None
        }
    }
}
