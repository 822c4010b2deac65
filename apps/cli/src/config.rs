//! Command line arguments with environment fallbacks.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use jwplatform_client::{JWPLATFORM_API_HOST, JWPLATFORM_UPLOAD_HOST};
use jwplatform_upload::{DEFAULT_RETRY_COUNT, MIN_PART_SIZE};

pub const ENV_API_SECRET: &str = "JWPLATFORM_API_SECRET";
pub const ENV_SITE_ID: &str = "JWPLATFORM_SITE_ID";
pub const ENV_API_HOST: &str = "JWPLATFORM_API_HOST";
pub const ENV_UPLOAD_HOST: &str = "JWPLATFORM_UPLOAD_HOST";

#[derive(Parser, Debug)]
#[command(author, version, about = "Upload and manage JW Platform media")]
pub struct Args {
    /// API secret (overrides JWPLATFORM_API_SECRET)
    #[arg(long, global = true)]
    pub api_secret: Option<String>,

    /// Site (property) id (overrides JWPLATFORM_SITE_ID)
    #[arg(long, global = true)]
    pub site_id: Option<String>,

    /// API host (overrides JWPLATFORM_API_HOST)
    #[arg(long, global = true)]
    pub api_host: Option<String>,

    /// Upload host for multipart uploads (overrides JWPLATFORM_UPLOAD_HOST)
    #[arg(long, global = true)]
    pub upload_host: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a media and upload a file to it
    Upload {
        file: PathBuf,

        /// Media title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,

        /// Where to save the upload context for `resume`
        #[arg(long)]
        context_out: Option<PathBuf>,

        #[command(flatten)]
        transfer: TransferArgs,
    },

    /// Finish an interrupted upload from a saved context
    Resume {
        file: PathBuf,

        /// Upload context saved by `upload --context-out`
        #[arg(long)]
        context: PathBuf,

        /// Start over as a new media when the upload can't be resumed
        #[arg(long)]
        restart: bool,

        /// Title of the new media when restarting
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        transfer: TransferArgs,
    },

    /// Inspect media
    Media {
        #[command(subcommand)]
        command: MediaCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum MediaCommand {
    /// List media of the site
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_length: u32,
    },

    /// Show one media as JSON
    Get { id: String },
}

#[derive(clap::Args, Debug, Clone)]
pub struct TransferArgs {
    /// Part size in bytes; smaller files are uploaded in one request
    #[arg(long, default_value_t = MIN_PART_SIZE)]
    pub part_size: u64,

    /// Attempts per part before giving up
    #[arg(long, default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry_count: u32,

    /// Timeout per storage request, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Connection settings merged from arguments and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_secret: String,
    pub site_id: Option<String>,
    pub api_host: String,
    pub upload_host: String,
}

impl AppConfig {
    /// Arguments win over the environment, read through `env`.
    pub fn from_args(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let Some(api_secret) = args.api_secret.clone().or_else(|| env(ENV_API_SECRET)) else {
            bail!("missing API secret: pass --api-secret or set {ENV_API_SECRET}");
        };

        Ok(Self {
            api_secret,
            site_id: args.site_id.clone().or_else(|| env(ENV_SITE_ID)),
            api_host: args
                .api_host
                .clone()
                .or_else(|| env(ENV_API_HOST))
                .unwrap_or_else(|| JWPLATFORM_API_HOST.into()),
            upload_host: args
                .upload_host
                .clone()
                .or_else(|| env(ENV_UPLOAD_HOST))
                .unwrap_or_else(|| JWPLATFORM_UPLOAD_HOST.into()),
        })
    }

    pub fn site_id(&self) -> Result<&str> {
        match self.site_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => bail!("missing site id: pass --site-id or set {ENV_SITE_ID}"),
        }
    }
}
