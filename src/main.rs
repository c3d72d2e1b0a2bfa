use clap::Parser;
use floatchat::domain::model::Query;
use floatchat::utils::error::ErrorSeverity;
use floatchat::utils::{logger, validation::Validate};
use floatchat::{
    load_directory, CliConfig, FloatChatError, InMemoryStore, Interpretation, QueryContext,
    QueryEngine, QueryOutcome, TomlConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };

    // 初始化日誌
    let level = config.logging.level.as_deref();
    if cli.log_json || config.logging.json {
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }

    tracing::info!("Starting floatchat CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Query failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 重試錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig, config: &TomlConfig) -> floatchat::Result<()> {
    let catalog = Arc::new(config.catalog());
    let question = cli.question_text();

    let carry_region = match &cli.region {
        Some(name) => {
            let region = catalog
                .region(name)
                .ok_or_else(|| FloatChatError::InvalidConfigValueError {
                    field: "region".to_string(),
                    value: name.clone(),
                    reason: "Unknown region".to_string(),
                })?;
            Some(region.name.clone())
        }
        None => None,
    };
    let context = QueryContext { carry_region };

    if cli.interpret_only {
        // 只做解析，不需要載入資料
        let engine = QueryEngine::with_settings(
            Arc::new(InMemoryStore::default()),
            catalog,
            config.engine_settings(),
        );
        let interpretation = engine.interpret_query(&Query::new(question), &context);
        return print_interpretation(&interpretation, cli.json);
    }

    let data_dir = cli
        .data_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_directory());
    let store = tokio::task::spawn_blocking(move || load_directory(data_dir))
        .await
        .map_err(|e| FloatChatError::processing(format!("Loader task failed: {}", e)))??;

    let engine = QueryEngine::with_settings(Arc::new(store), catalog, config.engine_settings());
    let outcome = engine.run_with_context(&question, &context).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        QueryOutcome::Rejected {
            message,
            suggestions,
        } => {
            println!("🚫 {}", message);
            print_suggestions("Try one of these", suggestions);
        }
        QueryOutcome::Answered(response) => {
            println!("{}", response.insight);
            print_suggestions("Suggested follow-ups", &response.recommendations);
            println!(
                "\n🗺️ {} floats highlighted ({}, {} ms)",
                response.highlighted_float_ids.len(),
                response.query_id,
                response.processing_time_ms
            );
        }
    }

    Ok(())
}

fn print_interpretation(interpretation: &Interpretation, json: bool) -> floatchat::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(interpretation)?);
        return Ok(());
    }

    match interpretation {
        Interpretation::Rejected {
            message,
            suggestions,
        } => {
            println!("🚫 {}", message);
            print_suggestions("Try one of these", suggestions);
        }
        Interpretation::Accepted { parameters } => {
            println!("✅ Accepted");
            println!("{}", serde_json::to_string_pretty(parameters)?);
        }
    }
    Ok(())
}

fn print_suggestions(title: &str, suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for suggestion in suggestions {
        println!("  • {}", suggestion);
    }
}
