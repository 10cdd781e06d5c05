use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::spawn,
};

use log::{debug, error, info, warn};

use crate::{
    editor::{ProcessorTable, ValidationReport},
    project::{processor::OutputProcessor, StoredProcessor},
    store::{ProcessorStore, StoreError},
    ui::render_gui,
};

/// Result of a background request, delivered to the UI thread
pub enum StoreResponse {
    Loaded(Result<Vec<StoredProcessor>, StoreError>),
    Saved(Result<Vec<StoredProcessor>, StoreError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Short confirmation, shown in the status bar
    Info(String),
    /// Needs acknowledging; shown in its own window
    Error { title: String, message: String },
}

pub struct Model {
    pub table: ProcessorTable,
    pub store: Arc<dyn ProcessorStore>,
    pub notice: Option<Notice>,
    /// The output process must restart before saved changes take effect
    pub restart_required: bool,
    pub requests_in_flight: usize,
    response_tx: Sender<StoreResponse>,
    response_rx: Receiver<StoreResponse>,
}

impl eframe::App for Model {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        render_gui(self, ctx, frame);
    }
}

impl Model {
    pub fn new(store: Arc<dyn ProcessorStore>) -> Model {
        let (response_tx, response_rx) = mpsc::channel();
        Model {
            table: ProcessorTable::new(),
            store,
            notice: None,
            restart_required: false,
            requests_in_flight: 0,
            response_tx,
            response_rx,
        }
    }

    /// Fetch the list in the background; the table is replaced when it arrives
    pub fn request_load(&mut self) {
        info!("Loading output processors from {}", self.store.describe());
        let store = Arc::clone(&self.store);
        let tx = self.response_tx.clone();
        self.requests_in_flight += 1;
        spawn(move || {
            let result = store.load();
            if tx.send(StoreResponse::Loaded(result)).is_err() {
                warn!("Load finished after the editor closed");
            }
        });
    }

    /// Validate the whole table and, only if every row is valid, submit it in
    /// the background as a wholesale replace.
    pub fn request_save(&mut self) -> Result<(), ValidationReport> {
        let processors = match self.table.collect() {
            Ok(p) => p,
            Err(report) => {
                warn!("Not saving; {} problem(s) found", report.0.len());
                self.table
                    .select(report.0.first().map(|e| e.row().saturating_sub(1)));
                self.notice = Some(Notice::Error {
                    title: String::from("Output Processors"),
                    message: report.to_string(),
                });
                return Err(report);
            }
        };
        self.submit(processors);
        Ok(())
    }

    fn submit(&mut self, processors: Vec<OutputProcessor>) {
        info!(
            "Saving {} output processors to {}",
            processors.len(),
            self.store.describe()
        );
        let store = Arc::clone(&self.store);
        let tx = self.response_tx.clone();
        self.requests_in_flight += 1;
        spawn(move || {
            let result = store.save(&processors);
            if tx.send(StoreResponse::Saved(result)).is_err() {
                warn!("Save finished after the editor closed");
            }
        });
    }

    /// Apply any responses that have arrived, in arrival order
    pub fn update(&mut self) {
        while let Ok(response) = self.response_rx.try_recv() {
            self.apply_response(response);
        }
    }

    pub fn apply_response(&mut self, response: StoreResponse) {
        self.requests_in_flight = self.requests_in_flight.saturating_sub(1);
        match response {
            StoreResponse::Loaded(Ok(entries)) => {
                debug!("Rendering {} loaded output processors", entries.len());
                self.table = ProcessorTable::from_entries(entries);
            }
            StoreResponse::Loaded(Err(e)) => {
                error!("Error loading output processors: {}", e);
                self.notice = Some(Notice::Error {
                    title: String::from("Load Output Processors Table"),
                    message: String::from("Load Failed"),
                });
            }
            StoreResponse::Saved(Ok(entries)) => {
                self.table = ProcessorTable::from_entries(entries);
                self.restart_required = true;
                self.notice = Some(Notice::Info(String::from(
                    "Output Processors Table saved",
                )));
                warn!("Output processors changed; restart required to apply");
            }
            StoreResponse::Saved(Err(e)) => {
                error!("Error saving output processors: {}", e);
                self.notice = Some(Notice::Error {
                    title: String::from("Save Output Processors Table"),
                    message: String::from("Save Failed"),
                });
            }
        }
    }

    /// Replace the table with a list read from a file; nothing is written to the
    /// store until the next save.
    pub fn import_from(&mut self, path: &str) -> anyhow::Result<()> {
        let document = match crate::project::ProcessorDocument::load(path) {
            Ok(d) => d,
            Err(e) => {
                self.notice = Some(Notice::Error {
                    title: String::from("Import Output Processors"),
                    message: format!("Could not import \"{}\": {}", path, e),
                });
                return Err(e);
            }
        };
        self.table = ProcessorTable::from_entries(document.entries());
        self.notice = Some(Notice::Info(format!(
            "Imported {} output processors",
            self.table.len()
        )));
        Ok(())
    }

    /// Write the current (validated) table to a file
    pub fn export_to(&mut self, path: &str) -> anyhow::Result<()> {
        let processors = self.table.collect()?;
        let document = crate::project::ProcessorDocument::from_processors(&processors)?;
        crate::project::ProcessorDocument::save(path, &document)?;
        self.notice = Some(Notice::Info(format!(
            "Exported {} output processors",
            processors.len()
        )));
        Ok(())
    }
}
