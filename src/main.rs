use clap::Parser;
use detection_history::{cli, config, error, render, response, scheduler, session, storage};
use cli::{Cli, Commands};
use config::Config;
use detection_history_common::{export, DetectionHistory, NoopScheduler, Scheduler, SystemClock};
use dialoguer::Confirm;
use error::{DetectionHistoryError, Result};
use tracing_subscriber::EnvFilter;

fn open_history(config: &Config, scheduler: Box<dyn Scheduler>) -> Result<DetectionHistory> {
    let data_dir = config.resolved_data_dir()?;
    let store = storage::FileStore::new(data_dir);
    Ok(DetectionHistory::new(
        Box::new(store),
        &config.storage_key,
        Box::new(SystemClock),
        scheduler,
    ))
}

fn confirm(question: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(question).default(false).interact()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::List => {
            let history = open_history(&config, Box::new(NoopScheduler))?;
            if history.history().is_empty() {
                println!("検出履歴はまだありません");
            }
            for (i, record) in history.history().iter().enumerate() {
                println!("{}", render::summary_line(i, record, history.preview(record.id)));
            }
        }

        Commands::Show { id } => {
            let history = open_history(&config, Box::new(NoopScheduler))?;
            let record = history
                .record(id)
                .ok_or(DetectionHistoryError::RecordNotFound(id))?;
            for line in render::detail_lines(record, history.preview(id)) {
                println!("{}", line);
            }
        }

        Commands::Add { response: response_path, image } => {
            let mut history = open_history(&config, Box::new(NoopScheduler))?;
            let imported = response::import_detection(&history, &response_path, &image, &config.date_format)?;
            let id = imported.record.id;
            history.add_detection(imported.record, imported.input_preview, imported.output_preview);
            println!("✔ 履歴に追加しました: {}", id);
        }

        Commands::Delete { id, yes } => {
            let mut history = open_history(&config, Box::new(NoopScheduler))?;
            if history.record(id).is_none() {
                println!("履歴にありません: {}", id);
                return Ok(());
            }
            if confirm("この検出を削除しますか？", yes)? {
                history.delete_detection(id);
                println!("✔ 削除しました: {}", id);
            }
        }

        Commands::Clear { yes } => {
            let mut history = open_history(&config, Box::new(NoopScheduler))?;
            if confirm("履歴をすべて削除しますか？", yes)? {
                let count = history.clear_history();
                println!("✔ {}件の履歴を削除しました", count);
            }
        }

        Commands::Export { id, format, output } => {
            let history = open_history(&config, Box::new(NoopScheduler))?;
            let record = history
                .record(id)
                .ok_or(DetectionHistoryError::RecordNotFound(id))?;

            let content = match format {
                cli::ExportFormat::Json => export::to_json(&record.detections)?,
                cli::ExportFormat::Csv => export::to_csv(&record.detections),
            };

            match output {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(format!("detections.{}", format.extension()))
                    } else {
                        path
                    };
                    std::fs::write(&path, content)?;
                    println!("✔ 出力: {}", path.display());
                }
                None => println!("{}", content),
            }
        }

        Commands::Session => {
            let (timer, expiries) = scheduler::TokioScheduler::channel();
            let history = open_history(&config, Box::new(timer))?;
            session::run_session(history, expiries, &config).await?;
        }

        Commands::Config { show, data_dir, storage_key } => {
            let mut config = config;
            let mut changed = false;

            if let Some(dir) = data_dir {
                config.data_dir = Some(dir);
                changed = true;
            }
            if let Some(key) = storage_key {
                config.storage_key = key;
                changed = true;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                println!("設定:");
                println!("  保存先: {}", config.resolved_data_dir()?.display());
                println!("  保存キー: {}", config.storage_key);
                println!("  日時フォーマット: {}", config.date_format);
            }
        }
    }

    Ok(())
}
