//! Continuum memory daemon entrypoint.
//!
//! Serves one project's memory document over a Unix socket so agents can
//! read recent activity and append their own notes. Requests are single
//! lines of JSON; see `continuum-protocol` for the schema.

use clap::Parser;
use fs_err as fs;
use std::env;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use continuum_core::{Config, ContinuumError, JsonFileStore, MemoryDocument, StorageConfig};
use continuum_protocol::{ErrorInfo, Request, Response, MAX_REQUEST_BYTES};

mod handlers;
mod state;

use state::SharedState;

const SOCKET_ENV: &str = "CONTINUUM_SOCKET";
const READ_TIMEOUT_SECS: u64 = 2;
const READ_CHUNK_SIZE: usize = 4096;

type FileState = SharedState<JsonFileStore<MemoryDocument>>;

#[derive(Parser)]
#[command(name = "continuum-daemon")]
#[command(about = "Serves Continuum project memory over a local socket")]
#[command(version)]
struct Cli {
    /// Project root whose memory document is served (default: current directory)
    #[arg(long, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Config file (default: ~/.continuum/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Socket path (default: ~/.continuum/sockets/<project hash>.sock)
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load config");
            std::process::exit(1);
        }
    };

    let storage = match resolve_storage(cli.project, &config) {
        Ok(storage) => storage,
        Err(err) => {
            error!(error = %err, "Failed to resolve project storage");
            std::process::exit(1);
        }
    };

    let socket_path = cli
        .socket
        .or_else(|| env::var_os(SOCKET_ENV).map(PathBuf::from))
        .unwrap_or_else(|| storage.socket_path());

    if let Err(err) = prepare_socket_dir(&socket_path) {
        error!(error = %err, "Failed to prepare daemon socket directory");
        std::process::exit(1);
    }

    if let Err(err) = remove_existing_socket(&socket_path) {
        error!(error = %err, path = %socket_path.display(), "Failed to remove existing socket");
        std::process::exit(1);
    }

    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, path = %socket_path.display(), "Failed to bind daemon socket");
            std::process::exit(1);
        }
    };

    let shared_state: Arc<FileState> = Arc::new(SharedState::new(JsonFileStore::new(
        storage.memory_file(),
    )));

    info!(
        socket = %socket_path.display(),
        project = %storage.project_root().display(),
        memory_file = %storage.memory_file().display(),
        "Continuum daemon started"
    );

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let state = Arc::clone(&shared_state);
                thread::spawn(move || handle_connection(stream, &state));
            }
            Err(err) => {
                warn!(error = %err, "Failed to accept daemon connection");
            }
        }
    }
}

fn init_logging() {
    let debug_enabled = env::var("CONTINUUM_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_storage(project: Option<PathBuf>, config: &Config) -> Result<StorageConfig, ContinuumError> {
    let requested = match project {
        Some(path) => path,
        None => env::current_dir().map_err(|e| ContinuumError::Io {
            context: "Failed to read current directory".to_string(),
            source: e,
        })?,
    };
    let project_root = fs::canonicalize(&requested)
        .map_err(|_| ContinuumError::ProjectRootNotFound(requested.clone()))?;
    if !project_root.is_dir() {
        return Err(ContinuumError::ProjectRootNotFound(requested));
    }
    StorageConfig::new(project_root, config.files.clone())
}

fn prepare_socket_dir(socket_path: &Path) -> Result<(), String> {
    let parent = socket_path
        .parent()
        .ok_or_else(|| "Socket path has no parent".to_string())?;
    fs::create_dir_all(parent).map_err(|err| format!("Failed to create socket directory: {}", err))
}

fn remove_existing_socket(socket_path: &Path) -> Result<(), String> {
    if socket_path.exists() {
        fs::remove_file(socket_path)
            .map_err(|err| format!("Failed to remove existing socket: {}", err))?;
    }
    Ok(())
}

fn handle_connection(mut stream: UnixStream, state: &FileState) {
    let request = match read_request(&mut stream) {
        Ok(request) => request,
        Err(err) => {
            warn!(code = %err.code, message = %err.message, "Failed to read request");
            let response = Response::error_with_info(None, err);
            let _ = write_response(&mut stream, response);
            return;
        }
    };

    tracing::debug!(method = ?request.method, id = ?request.id, "Daemon request received");
    let response = handlers::handle_request(request, state);
    let _ = write_response(&mut stream, response);
}

fn read_request(stream: &mut UnixStream) -> Result<Request, ErrorInfo> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(READ_TIMEOUT_SECS)));

    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > MAX_REQUEST_BYTES {
                    return Err(ErrorInfo::new(
                        "request_too_large",
                        "request exceeded maximum size",
                    ));
                }
                if chunk[..n].contains(&b'\n') {
                    break;
                }
            }
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                return Err(ErrorInfo::new("read_timeout", "request timed out"));
            }
            Err(err) => {
                return Err(ErrorInfo::new(
                    "read_error",
                    format!("failed to read request: {}", err),
                ));
            }
        }
    }

    let request_bytes = match buffer.iter().position(|b| *b == b'\n') {
        Some(index) => &buffer[..index],
        None => buffer.as_slice(),
    };

    if request_bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ErrorInfo::new("empty_request", "request body was empty"));
    }

    serde_json::from_slice(request_bytes).map_err(|err| {
        ErrorInfo::new(
            "invalid_json",
            format!("request was not valid JSON: {}", err),
        )
    })
}

fn write_response(stream: &mut UnixStream, response: Response) -> std::io::Result<()> {
    serde_json::to_writer(&mut *stream, &response)?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    Ok(())
}
