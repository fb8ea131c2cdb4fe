//! CLI smoke and maintenance entry point.
//!
//! # Responsibility
//! - Verify `facultyhub_core` linkage (`ping`, version).
//! - When a database is configured, open it (running migrations) and print
//!   schema and catalog counts plus the photo directory.

use facultyhub_core::db::{migrations::latest_version, open_db};
use facultyhub_core::{
    init_logging_from_config, AssignmentStore, CatalogService, CoreConfig, SqliteAssignmentStore,
    SqliteCatalogRepository,
};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("facultyhub_core ping={}", facultyhub_core::ping());
    println!("facultyhub_core version={}", facultyhub_core::core_version());

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    if std::env::args().nth(1).as_deref() != Some("status") {
        return ExitCode::SUCCESS;
    }

    match print_status(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_status module=cli status=error error={}", err);
            eprintln!("status failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_status(config: &CoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(&config.db_path)?;
    let catalog = CatalogService::new(SqliteCatalogRepository::new(&conn));
    let departments = catalog.list_departments()?;
    let courses = catalog.list_courses()?;
    let store = SqliteAssignmentStore::new(&conn);
    let assignments = store.list_assignments()?;
    let drift = store.find_faculty_name_drift()?;

    println!("schema_version={}", latest_version());
    println!("departments={}", departments.len());
    println!("courses={} assigned={}", courses.len(), assignments.len());
    println!("faculty_name_drift={}", drift.len());

    let photos = config.photo_store();
    let root = photos.root();
    println!("photo_dir={} present={}", root.display(), root.is_dir());
    Ok(())
}
