use std::sync::Arc;

use anyhow::anyhow;
use env_logger::Env;
use log::{debug, error, info, warn};

use clap::Parser;

use crate::{
    editor::ProcessorTable,
    model::Model,
    project::{ProcessorDocument, StoredProcessor},
    settings::Cli,
    store::{FileStore, HttpStore, ProcessorStore},
    ui::EDITOR_WINDOW,
};

mod editor;
mod model;
mod project;
mod settings;
mod store;
mod ui;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level))
        .filter_module("egui_glow", log::LevelFilter::Warn)
        .filter_module("egui_winit", log::LevelFilter::Warn)
        .filter_module("eframe", log::LevelFilter::Warn)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .init();

    debug!("Started with settings: {:?}", cli);

    let store: Arc<dyn ProcessorStore> = match &cli.file_path {
        Some(path) => Arc::new(FileStore::new(path)),
        None => Arc::new(HttpStore::new(&cli.endpoint)),
    };

    if cli.headless_mode {
        info!("Running in headless mode");
        if let Err(e) = run_headless(&cli, store.as_ref()) {
            error!("{:#}", e);
            std::process::exit(1);
        }
    } else {
        info!("Running graphics mode; close the window to quit");
        let mut model = Model::new(store);
        model.request_load();

        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default().with_inner_size(EDITOR_WINDOW),
            ..Default::default()
        };
        if let Err(e) = eframe::run_native(
            "Output Processor Editor",
            options,
            Box::new(|_cc| Box::<Model>::new(model)),
        ) {
            error!("Failed to launch GUI: {}", e);
            std::process::exit(1);
        }
        info!("GUI ended; exit now...");
    }
}

/// List and validate the stored processors, or (with an import path) validate a
/// file and submit it as the new list.
fn run_headless(cli: &Cli, store: &dyn ProcessorStore) -> anyhow::Result<()> {
    let entries = match &cli.import_path {
        Some(path) => ProcessorDocument::load(path)?.entries(),
        None => store.load()?,
    };

    for (i, entry) in entries.iter().enumerate() {
        match entry {
            StoredProcessor::Known(processor) => info!("#{} {}", i + 1, processor),
            StoredProcessor::Invalid { form, .. } => {
                warn!("#{} {} with invalid settings", i + 1, form.processor_type())
            }
            StoredProcessor::Unrecognised { type_name, .. } => {
                warn!("#{} unknown type {}", i + 1, type_name)
            }
        }
    }

    let table = ProcessorTable::from_entries(entries);
    let processors = match table.collect() {
        Ok(p) => p,
        Err(report) => {
            for e in &report.0 {
                error!("{}", e);
            }
            return Err(anyhow!("{} problem(s) found", report.0.len()));
        }
    };
    info!("All {} output processors are valid", processors.len());

    if cli.import_path.is_some() {
        let saved = store.save(&processors)?;
        info!(
            "Submitted {} output processors to {}; {} now stored",
            processors.len(),
            store.describe(),
            saved.len()
        );
        warn!("Restart required for the new output processors to take effect");
    }

    Ok(())
}
