use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use impactmap::cli::{Cli, Commands};
use impactmap::config::{self, ParallelConfig, CONFIG_FILE_NAME};
use impactmap::core::types::DateRange;
use impactmap::engine::{CancelToken, EffectivenessFilters, Engine};
use impactmap::io::{create_writer, AnalysisReport, OutputFormat};
use impactmap::store::MemoryStore;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            facts,
            project,
            period,
            domain,
            stakeholder_group,
            from,
            to,
            as_of,
            format,
            output,
            no_parallel,
            jobs,
            timeout_ms,
        } => {
            let store = MemoryStore::from_json_file(&facts)
                .with_context(|| format!("failed to load facts from {}", facts.display()))?;
            let project = project.unwrap_or_else(|| store.project_id().to_string());

            let baseline = config::load_config();
            let mut parallel = if no_parallel {
                ParallelConfig::sequential()
            } else {
                baseline.parallel
            };
            if let Some(jobs) = jobs {
                parallel.max_threads = Some(jobs);
            }

            let mut engine = Engine::new(store, project.clone()).with_parallel(parallel);
            if let Some(period) = period {
                engine = engine.with_period(period);
            }
            if from.is_some() || to.is_some() {
                engine = engine.with_date_range(DateRange::new(from, to));
            }
            if let Some(as_of) = as_of {
                engine = engine.with_as_of(as_of);
            }
            if let Some(ms) = timeout_ms {
                engine = engine.with_cancel_token(CancelToken::with_timeout(
                    Duration::from_millis(ms),
                ));
            }
            engine.init()?;

            let filters = Some(EffectivenessFilters {
                domain,
                stakeholder_group,
            });
            let report = AnalysisReport {
                project,
                effectiveness: engine.channel_effectiveness(filters.clone())?,
                responsiveness: engine.stakeholder_responsiveness(domain)?,
                diagnostics: engine.objective_diagnostics()?,
                derived: engine.derived_metrics(filters)?,
                flags: engine.recommendation_flags()?,
            };

            write_report(&report, format, output)
        }
        Commands::Init { force } => init_config(force),
    }
}

fn write_report(
    report: &AnalysisReport,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let writer = create_writer(format);
    match output {
        Some(path) => {
            let mut file = fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            writer.write_report(report, &mut file)
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            writer.write_report(report, &mut lock)?;
            lock.flush()?;
            Ok(())
        }
    }
}

fn init_config(force: bool) -> Result<()> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!("{CONFIG_FILE_NAME} already exists (use --force to overwrite)");
    }
    fs::write(&path, config::loader::config_template())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {CONFIG_FILE_NAME}");
    Ok(())
}
