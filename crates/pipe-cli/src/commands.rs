use anyhow::{Context, Result};
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use pipe_core::prepare;
use pipe_transform::DeriveFn;
use tracing::info_span;

use pipe_cli::runner::{build_pipeline, load_config, new_context, open_source, persist};

use crate::cli::RunArgs;
use crate::summary::{apply_table_style, print_chunk_plan, print_summary};

pub fn run_functions() {
    let mut table = Table::new();
    table.set_header(vec!["Function", "Arguments", "Description"]);
    apply_table_style(&mut table);
    for function in DeriveFn::ALL {
        table.add_row(vec![
            function.name(),
            function.signature(),
            function.description(),
        ]);
    }
    println!("{table}");
}

pub fn run_pipeline(args: &RunArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let ctx = new_context(&config, args.guid.as_deref())?;
    let span = info_span!("run", process = %ctx.process_name, guid = %ctx.guid);
    let _guard = span.enter();

    let source = open_source(&config)?;
    let pipeline = build_pipeline(config, ctx)?;
    let prepared = prepare(&pipeline, source).context("compose pipeline")?;

    if args.dry_run {
        println!("{}", prepared.optimized_plan());
        print_chunk_plan(prepared.chunk_plan());
        return Ok(());
    }

    let progress = ProgressBar::new(prepared.chunk_plan().chunk_count() as u64);
    progress.set_style(
        ProgressStyle::with_template("  Chunks {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    let persisted = persist(&pipeline, &prepared, |_| progress.inc(1));
    progress.finish_and_clear();

    let (summary, run_dir) = persisted?;
    print_summary(&summary, &run_dir);
    Ok(())
}
