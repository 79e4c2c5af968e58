// SPDX-License-Identifier: AGPL-3.0

//! solmap - map EVM program counters back to Solidity source

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use solmap_build::{check_compiler_version, CompilerOutput};
use solmap_config::Config;
use solmap_logs::{init_tracing, set_color, warn_code, warn_unique, ErrorCode};
use solmap_mapper::{Bytecode, Explanation, Mapper, SourceMap};
use std::time::Instant;
use tracing::{debug, info};

mod report;

use report::{AddressReport, Exitcode, MainResult};

fn main() {
    let exitcode = match _main() {
        Ok(result) => result.exitcode,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            Exitcode::ConfigError as i32
        }
    };
    std::process::exit(exitcode)
}

fn _main() -> Result<MainResult> {
    let start_time = Instant::now();

    let config = Config::parse().with_config_file()?;
    if config.no_color {
        set_color(false);
    }
    init_tracing(config.verbose);
    config.validate()?;
    debug!("configuration: {:?}", config);

    let output_path = config
        .resolved_compiler_output()
        .context("Missing --compiler-output")?;
    let output = CompilerOutput::from_file(&output_path)?;
    let artifact = output.artifact(&config.contract)?;

    match &artifact.compiler_version {
        Some(version) => {
            check_compiler_version(version, &config.min_compiler_version);
        }
        None => warn_unique(&format!(
            "{} carries no compiler version, skipping the version check",
            artifact.key
        )),
    }

    let sources_dir = config.resolved_sources_dir();
    let sources = output.source_set(&artifact, sources_dir.as_deref());
    let forest = output.ast_forest();

    let bytecode = Bytecode::parse(&artifact.bytecode)
        .with_context(|| format!("Invalid runtime bytecode for {}", artifact.key))?;
    let source_map = SourceMap::parse(&artifact.source_map);
    info!(
        "{}: {} bytes of runtime bytecode, {} source map entries, {} source files",
        artifact.name,
        bytecode.len(),
        source_map.len(),
        sources.len()
    );

    let mapper = Mapper::new(&bytecode, &source_map, &forest)
        .with_sources(&sources)
        .with_literal(!config.no_literal);

    let mut result = MainResult::default();
    for address in &config.addresses {
        let mut expl = Explanation::new(config.explain);
        let report = AddressReport::new(address, mapper.map_hex_address_explained(address, &mut expl));
        // the trace goes out before the line it explains
        drop(expl);

        print_report(&report, config.json)?;
        result.record(&report);
    }

    if !config.json && config.addresses.len() > 1 {
        print_summary(&result, start_time);
    }

    Ok(result)
}

fn print_report(report: &AddressReport, json: bool) -> Result<()> {
    if let Some(mapped) = &report.result {
        if mapped.reconstructed && !json {
            warn_code(
                ErrorCode::ReconstructedSource,
                &format!(
                    "no source text for {}, code was reconstructed from the AST (line 0)",
                    mapped.file
                ),
                false,
            );
        }
    }

    if json {
        println!("{}", serde_json::to_string(report)?);
    } else if report.is_mapped() {
        println!("{}", report.render());
    } else {
        eprintln!("{}", report.render().red());
    }
    Ok(())
}

fn print_summary(result: &MainResult, start_time: Instant) {
    eprintln!(
        "\n{} {} {} {} {} ({}ms)",
        "Summary:".yellow().bold(),
        result.total_mapped.to_string().green(),
        "mapped".green(),
        result.total_failed.to_string().red(),
        "failed".red(),
        start_time.elapsed().as_millis()
    );
}
