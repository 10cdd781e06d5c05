use clap::Parser;

pub const DEFAULT_ENDPOINT: &str = "http://localhost/fppjson.php";

/// Longest description the controller keeps for a processor
pub const DESCRIPTION_MAX_CHARS: usize = 64;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = "Output Processor Editor")]
pub struct Cli {
    /// Flag to enable headless (no GUI) mode: list and validate the stored
    /// output processors, then exit
    #[arg(long = "headless")]
    pub headless_mode: bool,

    /// Path of a processor list file to validate and submit (headless only)
    #[arg(long = "headless.import")]
    pub import_path: Option<String>,

    /// URL of the controller's JSON configuration endpoint
    #[arg(long = "endpoint", default_value_t=String::from(DEFAULT_ENDPOINT))]
    pub endpoint: String,

    /// Edit a JSON file on disk instead of talking to the controller
    #[arg(long = "file")]
    pub file_path: Option<String>,

    #[arg(long = "loglevel",default_value_t=String::from("info"))]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["output-processor-editor"]);
        assert!(!cli.headless_mode);
        assert_eq!(cli.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cli.file_path, None);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn dotted_flags() {
        let cli = Cli::parse_from([
            "output-processor-editor",
            "--headless",
            "--headless.import",
            "backup.json",
            "--endpoint",
            "http://10.0.0.20/fppjson.php",
        ]);
        assert!(cli.headless_mode);
        assert_eq!(cli.import_path.as_deref(), Some("backup.json"));
        assert_eq!(cli.endpoint, "http://10.0.0.20/fppjson.php");
    }
}
