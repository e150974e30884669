use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use volley::args::{LoadArgs, to_run_config};
use volley::config::{apply_config, load_config};
use volley::error::AppResult;
use volley::progress::ProgressOptions;
use volley::report::{summary_lines, write_report};
use volley::run::{RunContext, execute_run};
use volley::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

pub(crate) fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn parse_args() -> AppResult<(LoadArgs, ArgMatches)> {
    let matches = LoadArgs::command().get_matches_from(std::env::args_os());
    let args = LoadArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

async fn run_async(args: LoadArgs) -> AppResult<()> {
    let config = to_run_config(&args)?;
    let context = RunContext::with_reqwest(config)?.with_progress(ProgressOptions {
        enabled: !args.no_progress,
        no_color: args.no_color,
    });

    let (shutdown_tx, _) = shutdown_channel();
    let shutdown_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let report = execute_run(&context, &shutdown_tx).await;
    shutdown_handle.abort();
    if let Err(err) = shutdown_handle.await
        && !err.is_cancelled()
    {
        tracing::debug!("Signal handler task failed: {}", err);
    }
    let report = report?;

    let output_path = Path::new(&args.output);
    write_report(output_path, &report.output).await?;

    if !args.no_summary {
        for line in summary_lines(&report.summary) {
            println!("{}", line);
        }
    }
    println!("Results written to {}", output_path.display());
    Ok(())
}
