//! Subcommand handlers.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use jwplatform_client::Client;
use jwplatform_upload::{
    HttpTransport, MediaFile, MediaRequest, MediaUploader, ResumeOutcome, UploadConfig,
    UploadContext,
};
use serde_json::{Value, json};
use tracing::info;

use crate::config::{AppConfig, Command, MediaCommand, TransferArgs};

pub async fn run(config: &AppConfig, command: Command) -> Result<()> {
    let client = Client::with_host(&config.api_secret, &config.api_host)
        .context("building API client")?;

    match command {
        Command::Upload {
            file,
            title,
            context_out,
            transfer,
        } => {
            let uploader = uploader(client, config, &transfer)?;
            let site_id = config.site_id()?;
            let mut media = MediaFile::open(&file)
                .await
                .with_context(|| format!("opening {}", file.display()))?;

            let context = uploader
                .create_media_and_get_upload_context(
                    &mut media,
                    media_body(&file, title.as_deref()),
                    &[],
                    site_id,
                )
                .await
                .context("creating media")?;
            if let Some(path) = &context_out {
                save_context(path, &context)?;
            }

            uploader
                .upload(&mut media, &context)
                .await
                .with_context(|| format!("uploading {}", file.display()))?;
            println!("uploaded {} ({} upload)", file.display(), context.upload_method());
        }

        Command::Resume {
            file,
            context: context_path,
            restart,
            title,
            transfer,
        } => {
            let uploader = uploader(client, config, &transfer)?;
            let context = load_context(&context_path)?;
            let request = if restart {
                Some(MediaRequest {
                    site_id: config.site_id()?.to_string(),
                    body: media_body(&file, title.as_deref()),
                    query_params: Vec::new(),
                })
            } else {
                None
            };

            let mut media = MediaFile::open(&file)
                .await
                .with_context(|| format!("opening {}", file.display()))?;
            let outcome = uploader
                .resume(&mut media, Some(&context), request.as_ref())
                .await
                .with_context(|| format!("resuming {}", file.display()))?;

            match outcome {
                ResumeOutcome::Resumed => println!("resumed and finished {}", file.display()),
                ResumeOutcome::Restarted(new_context) => {
                    save_context(&context_path, &new_context)?;
                    println!("restarted {} as a new media", file.display());
                }
            }
        }

        Command::Media { command } => {
            let site_id = config.site_id()?;
            match command {
                MediaCommand::List { page, page_length } => {
                    let query = [
                        ("page".to_string(), page.to_string()),
                        ("page_length".to_string(), page_length.to_string()),
                    ];
                    let resp = client
                        .media()
                        .list(site_id, &query)
                        .await
                        .context("listing media")?;
                    for item in resp.resources("media") {
                        println!("{}", media_line(item));
                    }
                }
                MediaCommand::Get { id } => {
                    let resp = client
                        .media()
                        .get(site_id, &id)
                        .await
                        .with_context(|| format!("fetching media {id}"))?;
                    let body = resp.json_body.unwrap_or(Value::Null);
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
            }
        }
    }

    Ok(())
}

fn uploader(client: Client, config: &AppConfig, transfer: &TransferArgs) -> Result<MediaUploader> {
    let upload_config = UploadConfig::default()
        .with_target_part_size(transfer.part_size)
        .with_retry_count(transfer.retry_count)
        .with_upload_host(&config.upload_host);
    upload_config.validate()?;

    let mut uploader = MediaUploader::new(client, upload_config);
    if let Some(secs) = transfer.timeout {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(secs))
            .build()
            .context("building storage client")?;
        uploader = uploader.with_transport(HttpTransport::with_client(http));
    }
    Ok(uploader)
}

/// Create-media body titled after `title` or the file name.
fn media_body(file: &Path, title: Option<&str>) -> Value {
    let title = title.map(str::to_string).unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".into())
    });
    json!({ "metadata": { "title": title } })
}

fn media_line(item: &Value) -> String {
    let field = |key: &str| item.get(key).and_then(Value::as_str).unwrap_or("-");
    let title = item
        .pointer("/metadata/title")
        .and_then(Value::as_str)
        .unwrap_or("-");
    format!("{}\t{}\t{}", field("id"), field("status"), title)
}

fn save_context(path: &Path, context: &UploadContext) -> Result<()> {
    let json = serde_json::to_string_pretty(context)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "upload context saved");
    Ok(())
}

fn load_context(path: &Path) -> Result<UploadContext> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}
