use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use crate::config::Config;
use crate::proxy::ProxyConfig;
use crate::transcript::{fetch_transcript, TranscriptResult};
use crate::youtube::{ApiFactory, YouTubeApiFactory};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "transcript-fetcher",
    version,
    about = "Fetch a YouTube transcript and write it as JSON"
)]
pub struct Cli {
    /// YouTube video id (the `v=` part of the URL)
    #[arg(allow_hyphen_values = true)]
    pub video_id: String,

    /// File to write the JSON result to
    #[arg(allow_hyphen_values = true)]
    pub output_file: PathBuf,

    /// JSON object with `proxy_username` and `proxy_password` for Webshare
    pub proxy_config: Option<String>,

    #[arg(hide = true)]
    pub extra: Vec<String>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma-separated language codes to try, in order (overrides config)
    #[arg(short, long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,
}

/// Run the command line with the real YouTube client. Returns the exit code.
pub fn run<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    run_with(args, |config| Box::new(YouTubeApiFactory::new(config)))
}

/// Same as [`run`], with the transcript client factory supplied by the caller.
pub fn run_with<I, T, F>(args: I, make_factory: F) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce(&Config) -> Box<dyn ApiFactory>,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout and are not failures.
            let _ = err.print();
            return if err.use_stderr() {
                EXIT_FAILURE
            } else {
                EXIT_SUCCESS
            };
        }
    };

    match execute(cli, make_factory) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            EXIT_FAILURE
        }
    }
}

fn execute<F>(cli: Cli, make_factory: F) -> anyhow::Result<()>
where
    F: FnOnce(&Config) -> Box<dyn ApiFactory>,
{
    if !cli.extra.is_empty() {
        tracing::debug!("Ignoring extra arguments: {:?}", cli.extra);
    }

    let proxy = match cli.proxy_config.as_deref() {
        Some(raw) => {
            let proxy = ProxyConfig::from_json_arg(raw)?;
            if proxy.is_none() {
                tracing::warn!(
                    "Proxy configuration lacks proxy_username or proxy_password, fetching directly"
                );
            }
            proxy
        }
        None => None,
    };

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(languages) = cli.languages {
        config.youtube.languages = languages;
    }

    let factory = make_factory(&config);
    let result = fetch_transcript(factory.as_ref(), &cli.video_id, proxy.as_ref());

    write_result(&result, &cli.output_file).with_context(|| {
        format!(
            "Error writing to output file {}",
            cli.output_file.display()
        )
    })?;
    println!("Transcript data written to {}", cli.output_file.display());
    Ok(())
}

/// Write the result as pretty-printed UTF-8 JSON. Non-ASCII text is kept as is.
pub fn write_result(result: &TranscriptResult, path: &Path) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(result)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_required_positionals() {
        let cli = Cli::try_parse_from(["transcript-fetcher", "abc123", "out.json"]).unwrap();
        assert_eq!(cli.video_id, "abc123");
        assert_eq!(cli.output_file, PathBuf::from("out.json"));
        assert!(cli.proxy_config.is_none());
        assert!(cli.extra.is_empty());
    }

    #[test]
    fn test_parse_proxy_positional() {
        let cli = Cli::try_parse_from([
            "transcript-fetcher",
            "abc123",
            "out.json",
            r#"{"proxy_username":"u","proxy_password":"p"}"#,
        ])
        .unwrap();
        assert_eq!(
            cli.proxy_config.as_deref(),
            Some(r#"{"proxy_username":"u","proxy_password":"p"}"#)
        );
    }

    #[test]
    fn test_parse_extra_positionals_are_collected() {
        let cli =
            Cli::try_parse_from(["transcript-fetcher", "abc123", "out.json", "{}", "x", "y"])
                .unwrap();
        assert_eq!(cli.extra, vec!["x", "y"]);
    }

    #[test]
    fn test_parse_languages_flag() {
        let cli = Cli::try_parse_from([
            "transcript-fetcher",
            "abc123",
            "out.json",
            "--languages",
            "de,en",
        ])
        .unwrap();
        assert_eq!(
            cli.languages,
            Some(vec!["de".to_string(), "en".to_string()])
        );
    }

    #[test]
    fn test_parse_video_id_starting_with_hyphen() {
        let cli = Cli::try_parse_from(["transcript-fetcher", "-FcYmXkZ0Qw", "out.json"]).unwrap();
        assert_eq!(cli.video_id, "-FcYmXkZ0Qw");
        assert_eq!(cli.output_file, PathBuf::from("out.json"));
    }

    #[test]
    fn test_parse_missing_output_file_errors() {
        let err = Cli::try_parse_from(["transcript-fetcher", "abc123"]).unwrap_err();
        assert!(err.use_stderr());
        assert!(err.to_string().contains("Usage"));
    }

    #[test]
    fn test_parse_empty_video_id_passes_through() {
        let cli = Cli::try_parse_from(["transcript-fetcher", "", "out.json"]).unwrap();
        assert_eq!(cli.video_id, "");
    }

    #[test]
    fn test_write_result_pretty_prints() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        let result = TranscriptResult::success("abc123", Vec::new());
        write_result(&result, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"video_id\": \"abc123\""));
    }

    #[test]
    fn test_write_result_to_missing_directory_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("missing").join("out.json");
        let result = TranscriptResult::success("abc123", Vec::new());
        assert!(write_result(&result, &path).is_err());
    }
}
