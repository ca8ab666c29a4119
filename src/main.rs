use clap::Parser;
use curriculum_etl::domain::model::StageReport;
use curriculum_etl::domain::ports::ConfigProvider;
use curriculum_etl::utils::error::{ErrorSeverity, EtlError};
use curriculum_etl::utils::logger;
use curriculum_etl::utils::validation::{parse_id_list, Validate};
use curriculum_etl::{BatchOrchestrator, CliConfig, HttpCourseApi, LocalStorage};
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting curriculum-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = cli.resolve().unwrap_or_else(|e| fail(&e));

    // 命令列與設定檔都沒有時才互動詢問
    if config.profile_ids.is_empty() {
        config.profile_ids = prompt_profile_ids()?;
    }
    if config.profile_ids.is_empty() {
        fail(&EtlError::MissingConfigError {
            field: "input.profile_ids".to_string(),
        });
    }

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let api = HttpCourseApi::from_config(&config).unwrap_or_else(|e| fail(&e));
    let storage = LocalStorage::new(config.output_path().to_string());
    let profile_ids = config.profile_ids.clone();
    let report_file = config.report_file.clone();
    let orchestrator = BatchOrchestrator::new(api, storage, config);

    let report = orchestrator.run(&profile_ids, !cli.skip_curriculums).await;

    log_stage(&report.taught_courses);
    if let Some(curriculums) = &report.curriculums {
        log_stage(curriculums);
    }

    if cli.report {
        match orchestrator.save_report(&report, &report_file).await {
            Ok(path) => tracing::info!("📁 Run report saved to: {}", path),
            Err(e) => tracing::error!("❌ Could not save run report: {}", e),
        }
    }

    let save_failed = std::iter::once(&report.taught_courses)
        .chain(report.curriculums.as_ref())
        .any(|stage| stage.save_error.is_some());

    if save_failed {
        eprintln!("❌ Some results could not be saved; see the log above");
        std::process::exit(1);
    }

    println!(
        "✅ Done in {}s with {} failed item(s)",
        (report.finished_at - report.started_at).num_seconds(),
        report.total_failures()
    );
    Ok(())
}

fn prompt_profile_ids() -> io::Result<Vec<String>> {
    print!("Enter profile IDs (comma-separated): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(parse_id_list(&line))
}

fn log_stage(stage: &StageReport) {
    tracing::info!(
        "📊 {}: {} succeeded, {} failed",
        stage.stage,
        stage.succeeded.len(),
        stage.failed.len()
    );
    for failure in &stage.failed {
        tracing::warn!("   {} ({:?}): {}", failure.id, failure.kind, failure.message);
    }
    if let Some(path) = stage.output_file.as_ref().filter(|_| stage.is_saved()) {
        println!("📁 {} saved to: {}", stage.stage, path);
    }
}

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
