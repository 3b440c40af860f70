use std::{env, fs, path::Path};

mod runner;

#[tokio::main]
async fn main() {
    let config = util::config::AppConfig::global().clone();
    if let Err(e) = common::logger::init_logger(&config.log_level, "logs/migration.log") {
        eprintln!("Failed to initialise logger: {e}");
    }

    let db_path = config.database_path;
    let url = format!("sqlite://{}?mode=rwc", db_path);
    let args: Vec<String> = env::args().collect();

    let outcome = match args.get(1).map(|s| s.as_str()) {
        Some("clean") => remove_db_file(&db_path),
        Some("fresh") => remove_db_file(&db_path).and_then(|_| create_db_dir(&db_path)),
        _ => create_db_dir(&db_path),
    };

    if let Err(e) = outcome {
        log::error!("Failed to prepare database file {db_path}: {e}");
        std::process::exit(1);
    }

    if args.get(1).map(|s| s.as_str()) != Some("clean") {
        runner::run_all_migrations(&url).await;
    }
}

fn remove_db_file(path: &str) -> std::io::Result<()> {
    let db_path = Path::new(path);
    if db_path.exists() {
        fs::remove_file(db_path)?;
        log::info!("Deleted DB: {}", db_path.display());
    } else {
        log::info!("DB file does not exist: {}", db_path.display());
    }
    Ok(())
}

fn create_db_dir(path: &str) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
