//! CLI commands

use anyhow::{Context as _, Result, bail};
use clap::Subcommand;
use reqwest::Method;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tether_frontend_common::{Latency, TodoStore};
use tether_http::{
    CredentialStore, FileCredentialStore, FilePart, Gateway, LogNavigator, RequestDescriptor,
};
use tracing::{debug, info};

use crate::config;

/// Settings shared by every command
pub struct Context {
    pub data_dir: PathBuf,
    pub config_file: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Context {
    fn credentials(&self) -> FileCredentialStore {
        FileCredentialStore::in_dir(&self.data_dir)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a token pair obtained elsewhere
    Login {
        /// Access token
        #[arg(long)]
        access: String,

        /// Refresh token
        #[arg(long)]
        refresh: String,
    },

    /// Forget the stored tokens
    Logout,

    /// Show which tokens are stored
    Tokens,

    /// Send an authenticated request
    Request {
        /// HTTP method
        method: String,

        /// Path relative to the API (or file) base
        path: String,

        /// Body as a JSON object
        #[arg(long)]
        data: Option<String>,

        /// Query parameter, repeatable
        #[arg(long = "param", value_parser = config::parse_pair)]
        params: Vec<(String, String)>,

        /// Extra header, repeatable
        #[arg(long = "header", value_parser = config::parse_pair)]
        headers: Vec<(String, String)>,

        /// Send as multipart/form-data to the file base
        #[arg(long)]
        file: bool,

        /// Attach a file part as key=path, repeatable
        #[arg(long = "attach", value_parser = config::parse_pair)]
        attachments: Vec<(String, String)>,
    },

    /// Todo list operations
    Todos {
        #[command(subcommand)]
        command: TodoCommands,
    },
}

#[derive(Subcommand)]
pub enum TodoCommands {
    /// Run fetch, add, update and delete against the in-memory store
    Demo {
        /// Skip the simulated latency
        #[arg(long)]
        fast: bool,
    },
}

impl Commands {
    pub async fn execute(self, context: Context) -> Result<()> {
        match self {
            Commands::Login { access, refresh } => login(&context, &access, &refresh),
            Commands::Logout => logout(&context),
            Commands::Tokens => show_tokens(&context),
            Commands::Request {
                method,
                path,
                data,
                params,
                headers,
                file,
                attachments,
            } => {
                let descriptor =
                    build_descriptor(&method, path, data, params, headers, file, attachments)
                        .await?;
                send_request(&context, descriptor).await
            }
            Commands::Todos { command } => command.execute().await,
        }
    }
}

impl TodoCommands {
    pub async fn execute(self) -> Result<()> {
        match self {
            TodoCommands::Demo { fast } => {
                let latency = if fast { Latency::none() } else { Latency::default() };
                todo_demo(TodoStore::with_latency(latency)).await
            }
        }
    }
}

fn login(context: &Context, access: &str, refresh: &str) -> Result<()> {
    let store = context.credentials();
    store
        .save(access, refresh)
        .with_context(|| format!("saving credentials to {}", store.path().display()))?;
    println!("Stored credentials at: {}", store.path().display());
    Ok(())
}

fn logout(context: &Context) -> Result<()> {
    let store = context.credentials();
    store
        .clear()
        .with_context(|| format!("removing {}", store.path().display()))?;
    println!("Cleared credentials at: {}", store.path().display());
    Ok(())
}

fn show_tokens(context: &Context) -> Result<()> {
    let store = context.credentials();
    let tokens = store.get();
    let summary = serde_json::json!({
        "path": store.path().display().to_string(),
        "access": tokens.access_token.is_some(),
        "refresh": tokens.refresh_token.is_some(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn build_descriptor(
    method: &str,
    path: String,
    data: Option<String>,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    file: bool,
    attachments: Vec<(String, String)>,
) -> Result<RequestDescriptor> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{method}'"))?;

    let body = match data {
        Some(raw) => parse_body(&raw)?,
        None => Map::new(),
    };

    let mut descriptor = RequestDescriptor::new(path)
        .method(method)
        .data(body)
        .file(file);

    for (name, value) in params {
        descriptor = descriptor.param(name, value);
    }
    for (name, value) in headers {
        descriptor = descriptor.header(name, value);
    }
    for (key, path) in attachments {
        let part = read_attachment(PathBuf::from(path)).await?;
        descriptor = descriptor.attach(key, part);
    }

    Ok(descriptor)
}

fn parse_body(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("--data must be JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--data must be a JSON object, got {other}"),
    }
}

async fn read_attachment(path: PathBuf) -> Result<FilePart> {
    let content = tokio::fs::read(&path)
        .await
        .with_context(|| format!("reading attachment {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(FilePart::new(file_name, content))
}

async fn send_request(context: &Context, descriptor: RequestDescriptor) -> Result<()> {
    let endpoints = config::load_endpoints(context.config_file.as_deref())?;

    let mut builder = Gateway::builder()
        .endpoints(endpoints)
        .credentials(Arc::new(context.credentials()))
        .navigator(Arc::new(LogNavigator))
        .user_agent(concat!("tether-cli/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = context.timeout {
        builder = builder.timeout(timeout);
    }
    let gateway = builder.build()?;

    let descriptor = descriptor.on_upload_progress(|progress| {
        debug!(loaded = progress.loaded, total = ?progress.total, "Upload progress");
    });

    let response = gateway.send(&descriptor).await?;
    let status = response.status();
    let body = response.text().await?;

    info!(%status, "Request finished");
    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

async fn todo_demo(store: TodoStore) -> Result<()> {
    info!("Fetching todos");
    store.fetch_todos().await;
    print_todos(&store);

    let added = store.add_todo("Try the todo store").await;
    info!(id = added.id, "Added todo");

    let mut done = added.clone();
    done.completed = true;
    store.update_todo(done).await;
    info!(id = added.id, "Marked todo as completed");
    print_todos(&store);

    store.delete_todo(added.id).await;
    info!(id = added.id, "Deleted todo");
    print_todos(&store);

    Ok(())
}

fn print_todos(store: &TodoStore) {
    for todo in store.todos() {
        let mark = if todo.completed { "x" } else { " " };
        println!("[{mark}] {:>14} {}", todo.id, todo.title);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_must_be_an_object() {
        assert!(parse_body(r#"{"a": [1, 2]}"#).is_ok());
        assert!(parse_body("[1, 2]").is_err());
        assert!(parse_body("not json").is_err());
    }

    #[tokio::test]
    async fn descriptor_from_arguments() {
        let descriptor = build_descriptor(
            "put",
            "items/1".to_string(),
            Some(r#"{"name": "x"}"#.to_string()),
            vec![("q".to_string(), "1".to_string())],
            vec![("X-Trace".to_string(), "abc".to_string())],
            false,
            Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(descriptor.method, Method::PUT);
        assert_eq!(descriptor.url, "items/1");
        assert_eq!(descriptor.data.get("name"), Some(&Value::from("x")));
        assert_eq!(descriptor.params, vec![("q".to_string(), "1".to_string())]);
        assert!(!descriptor.file);
    }

    #[tokio::test]
    async fn attachments_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, b"hello").unwrap();

        let descriptor = build_descriptor(
            "post",
            "upload/".to_string(),
            None,
            Vec::new(),
            Vec::new(),
            false,
            vec![("doc".to_string(), path.display().to_string())],
        )
        .await
        .unwrap();

        assert!(descriptor.file);
        assert_eq!(descriptor.attachments.len(), 1);
        assert_eq!(descriptor.attachments[0].0, "doc");
        assert_eq!(descriptor.attachments[0].1.file_name, "note.txt");
        assert_eq!(&descriptor.attachments[0].1.content[..], b"hello");
    }
}
