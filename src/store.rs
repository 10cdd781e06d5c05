use std::path::Path;

use log::{debug, info, warn};
use thiserror::Error;

use crate::project::{processor::OutputProcessor, ProcessorDocument, StoredProcessor};

const GET_COMMAND: &str = "getOutputProcessors";
const SET_COMMAND: &str = "setOutputProcessors";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request to configuration endpoint failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid output processor document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output processor file error: {0}")]
    File(#[from] anyhow::Error),
}

/// Where the output processor list lives. Both operations move the whole list;
/// there is no partial update.
pub trait ProcessorStore: Send + Sync {
    fn load(&self) -> Result<Vec<StoredProcessor>, StoreError>;

    /// Replace the stored list, returning it as the store now holds it
    fn save(&self, processors: &[OutputProcessor]) -> Result<Vec<StoredProcessor>, StoreError>;

    /// Short human-readable location, for the title bar and logs
    fn describe(&self) -> String;
}

/// The controller's JSON configuration endpoint
pub struct HttpStore {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpStore {
    pub fn new(endpoint: &str) -> Self {
        HttpStore {
            endpoint: String::from(endpoint),
            client: reqwest::blocking::Client::new(),
        }
    }
}

/// The write command wants the document wrapped in one more pair of braces,
/// which the endpoint strips before decoding.
fn set_command_data(document: &ProcessorDocument) -> Result<String, serde_json::Error> {
    Ok(format!("{{ {} }}", serde_json::to_string(document)?))
}

impl ProcessorStore for HttpStore {
    fn load(&self) -> Result<Vec<StoredProcessor>, StoreError> {
        debug!("GET {} command={}", &self.endpoint, GET_COMMAND);
        let text = self
            .client
            .get(&self.endpoint)
            .query(&[("command", GET_COMMAND)])
            .send()?
            .error_for_status()?
            .text()?;
        let document = serde_json::from_str::<ProcessorDocument>(&text)?;
        info!(
            "Loaded {} output processors from {}",
            document.output_processors.len(),
            &self.endpoint
        );
        Ok(document.entries())
    }

    fn save(&self, processors: &[OutputProcessor]) -> Result<Vec<StoredProcessor>, StoreError> {
        let document = ProcessorDocument::from_processors(processors)?;
        let data = set_command_data(&document)?;
        debug!("POST {} command={} data={}", &self.endpoint, SET_COMMAND, data);
        let text = self
            .client
            .post(&self.endpoint)
            .form(&[("command", SET_COMMAND), ("data", data.as_str())])
            .send()?
            .error_for_status()?
            .text()?;
        let saved = serde_json::from_str::<ProcessorDocument>(&text)?;
        info!(
            "Saved {} output processors to {}",
            processors.len(),
            &self.endpoint
        );
        Ok(saved.entries())
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

/// A JSON file on disk holding the same document the endpoint serves
pub struct FileStore {
    path: String,
}

impl FileStore {
    pub fn new(path: &str) -> Self {
        FileStore {
            path: String::from(path),
        }
    }
}

impl ProcessorStore for FileStore {
    fn load(&self) -> Result<Vec<StoredProcessor>, StoreError> {
        if !Path::new(&self.path).exists() {
            warn!(
                "No output processor file at \"{}\" yet; starting empty",
                &self.path
            );
            return Ok(Vec::new());
        }
        Ok(ProcessorDocument::load(&self.path)?.entries())
    }

    fn save(&self, processors: &[OutputProcessor]) -> Result<Vec<StoredProcessor>, StoreError> {
        let document = ProcessorDocument::from_processors(processors)?;
        ProcessorDocument::save(&self.path, &document)?;
        Ok(document.entries())
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

#[cfg(test)]
pub mod testing {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        sync::Mutex,
        thread::{self, JoinHandle},
    };

    use super::*;

    /// Answers a single HTTP request on a local port with the given status line
    /// and JSON body. Joining the handle yields the raw request as received.
    pub fn serve_once(status: &'static str, body: String) -> (HttpStore, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/fppjson.php", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                    let length = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                    if request.len() >= header_end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8(request).unwrap()
        });

        let store = HttpStore {
            endpoint,
            client: reqwest::blocking::Client::builder()
                .no_proxy()
                .build()
                .unwrap(),
        };
        (store, handle)
    }

    /// Keeps the list in memory and records every write it receives
    #[derive(Default)]
    pub struct MemoryStore {
        pub entries: Mutex<Vec<StoredProcessor>>,
        pub writes: Mutex<Vec<Vec<OutputProcessor>>>,
        pub fail_saves: bool,
    }

    impl MemoryStore {
        pub fn with_entries(entries: Vec<StoredProcessor>) -> Self {
            MemoryStore {
                entries: Mutex::new(entries),
                ..Default::default()
            }
        }

        pub fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }
    }

    impl ProcessorStore for MemoryStore {
        fn load(&self) -> Result<Vec<StoredProcessor>, StoreError> {
            Ok(self.entries.lock().unwrap().clone())
        }

        fn save(
            &self,
            processors: &[OutputProcessor],
        ) -> Result<Vec<StoredProcessor>, StoreError> {
            self.writes.lock().unwrap().push(processors.to_vec());
            if self.fail_saves {
                return Err(StoreError::File(anyhow::anyhow!("disk full")));
            }
            let entries: Vec<StoredProcessor> = processors
                .iter()
                .cloned()
                .map(StoredProcessor::Known)
                .collect();
            *self.entries.lock().unwrap() = entries.clone();
            Ok(entries)
        }

        fn describe(&self) -> String {
            String::from("memory")
        }
    }
}
