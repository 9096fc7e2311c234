use crate::OutputMode;
use owo_colors::OwoColorize;
use recordstore::config::{default_config_path, ensure_gitignore, write_config};
use recordstore::demo::{self, Startup};
use recordstore::ui::{self, Icons};
use recordstore::{NewRecord, Record, RecordStore, StoreConfig};
use serde::Serialize;
use std::path::Path;

fn emit<T: Serialize>(command: &str, data: &T) -> anyhow::Result<()> {
    let envelope = serde_json::json!({
        "command": command,
        "ok": true,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("{} No records found.", Icons::EMPTY);
    } else {
        println!("{}", ui::records_table(records));
    }
}

pub fn run_init(
    output_mode: OutputMode,
    config_path: Option<&Path>,
    config: &StoreConfig,
    force: bool,
) -> anyhow::Result<()> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    write_config(&path, config, force)?;

    let root = std::env::current_dir()?;
    ensure_gitignore(&root)?;

    if output_mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
        if let Some(dir) = &config.data_dir {
            ui::info("Data directory", &dir.display().to_string());
        }
    } else {
        emit("init", &serde_json::json!({ "config": path, "store": config }))?;
    }
    Ok(())
}

pub async fn run_demo(output_mode: OutputMode, config: StoreConfig) -> anyhow::Result<()> {
    match demo::start(config).await? {
        Startup::Unavailable(reason) => {
            if output_mode.is_human() {
                ui::warn(&format!("Storage unavailable, nothing to do: {}", reason));
            } else {
                emit("demo", &serde_json::json!({ "unavailable": reason.to_string() }))?;
            }
        }
        Startup::Completed(report) => {
            if output_mode.is_human() {
                ui::header(&format!("Database opened at version {}", report.version));
                ui::record(Icons::NEW, &report.initial);
                ui::record(Icons::MOD, &report.edited);
                println!("{} deleted #{}", Icons::DEL, report.deleted_id.bold());
            } else {
                emit("demo", &report)?;
            }
        }
    }
    Ok(())
}

pub async fn run_add(
    output_mode: OutputMode,
    config: StoreConfig,
    second_id: i64,
    name: String,
) -> anyhow::Result<()> {
    let store = RecordStore::connect(config)?;
    let record = NewRecord::new(second_id, name);
    let id = store.add(record.clone()).await?;

    if output_mode.is_human() {
        ui::record(Icons::NEW, &record.with_id(id));
    } else {
        emit("add", &record.with_id(id))?;
    }
    Ok(())
}

pub async fn run_get(output_mode: OutputMode, config: StoreConfig, id: i64) -> anyhow::Result<()> {
    let store = RecordStore::connect(config)?;
    let record = store.get_by_id(id).await?;

    if output_mode.is_human() {
        match &record {
            Some(record) => ui::record(Icons::MAG, record),
            None => println!("{} No record with id {}", Icons::EMPTY, id),
        }
    } else {
        emit("get", &record)?;
    }
    Ok(())
}

pub async fn run_list(output_mode: OutputMode, config: StoreConfig) -> anyhow::Result<()> {
    let store = RecordStore::connect(config)?;
    let records = store.get_all().await?;

    if output_mode.is_human() {
        ui::section(&format!("{} {}", Icons::DATABASE, store.config().table));
        print_records(&records);
    } else {
        emit("list", &records)?;
    }
    Ok(())
}

pub async fn run_find(
    output_mode: OutputMode,
    config: StoreConfig,
    second_id: i64,
) -> anyhow::Result<()> {
    let store = RecordStore::connect(config)?;
    let records = store.get_all_by_second_id(second_id).await?;

    if output_mode.is_human() {
        ui::section(&format!("{} second_id = {}", Icons::MAG, second_id));
        print_records(&records);
    } else {
        emit("find", &records)?;
    }
    Ok(())
}

pub async fn run_edit(
    output_mode: OutputMode,
    config: StoreConfig,
    id: i64,
    second_id: i64,
    name: String,
) -> anyhow::Result<()> {
    let store = RecordStore::connect(config)?;
    let record = Record { id, second_id, name };
    store.edit(&record).await?;

    if output_mode.is_human() {
        ui::record(Icons::MOD, &record);
    } else {
        emit("edit", &record)?;
    }
    Ok(())
}

pub async fn run_delete(
    output_mode: OutputMode,
    config: StoreConfig,
    id: i64,
) -> anyhow::Result<()> {
    let store = RecordStore::connect(config)?;
    store.delete(id).await?;

    if output_mode.is_human() {
        ui::success(&format!("Deleted #{}", id));
    } else {
        emit("delete", &serde_json::json!({ "id": id }))?;
    }
    Ok(())
}
