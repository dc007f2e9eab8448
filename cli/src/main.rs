//! Command-line front end for the todo store.
//!
//! Opens a store against `TODO_API_URL` (which performs the initial load),
//! runs one command, and prints the resulting status line and collection.
//! A failed initial load does not stop the command; only `toggle` needs the
//! local copy of an item.

use std::process::ExitCode;

use anyhow::{bail, Context};
use todo_sync::{
    ReqwestTransport, Settings, StoreSnapshot, TodoClient, TodoDraft, TodoId, TodoStatus,
    TodoStore, Transport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: todo-cli [list | add <title> [description] | remove <id> | toggle <id> | summarize]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Add(TodoDraft),
    Remove(TodoId),
    Toggle(TodoId),
    Summarize,
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let command = match args {
        [] => Command::List,
        [cmd] if cmd == "list" => Command::List,
        [cmd] if cmd == "summarize" => Command::Summarize,
        [cmd, title] if cmd == "add" => Command::Add(TodoDraft::new(title.as_str())),
        [cmd, title, description] if cmd == "add" => {
            Command::Add(TodoDraft::new(title.as_str()).with_description(description.as_str()))
        }
        [cmd, id] if cmd == "remove" => Command::Remove(parse_id(id)?),
        [cmd, id] if cmd == "toggle" => Command::Toggle(parse_id(id)?),
        _ => bail!(USAGE),
    };
    Ok(command)
}

fn parse_id(raw: &str) -> anyhow::Result<TodoId> {
    let id = raw.parse().with_context(|| format!("invalid todo id {raw:?}"))?;
    Ok(TodoId(id))
}

fn render(snapshot: &StoreSnapshot) -> String {
    let mut out = String::new();
    if !snapshot.status.is_empty() {
        let prefix = if snapshot.status.is_error() { "error: " } else { "" };
        out.push_str(&format!("{prefix}{}\n", snapshot.status));
    }
    if snapshot.todos.is_empty() {
        out.push_str("No todos available.\n");
    }
    for todo in &snapshot.todos {
        let mark = match todo.status {
            TodoStatus::Completed => 'x',
            TodoStatus::Pending => ' ',
        };
        let id = todo.id.map(|id| id.to_string()).unwrap_or_default();
        out.push_str(&format!("[{mark}] {id:>4}  {}", todo.title));
        if let Some(description) = todo.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(" ({description})"));
        }
        out.push('\n');
    }
    out
}

async fn run(command: Command, settings: Settings) -> anyhow::Result<bool> {
    let client = TodoClient::new(&settings.base_url);
    let store = TodoStore::open(client, ReqwestTransport::new(), settings.store).await;
    execute(&store, command).await
}

/// `Ok(false)` when the status slot ends up holding an error.
async fn execute<T: Transport>(store: &TodoStore<T>, command: Command) -> anyhow::Result<bool> {
    let outcome = match command {
        Command::List => Ok(()),
        Command::Add(draft) => store.create(draft).await.map(|_| ()),
        Command::Remove(id) => store.remove(id).await,
        Command::Toggle(id) => match store.snapshot().get(id).cloned() {
            Some(item) => store.toggle_status(&item).await.map(|_| ()),
            None => bail!("no todo with id {id}"),
        },
        Command::Summarize => store.summarize().await.map(|_| ()),
    };

    print!("{}", render(&store.snapshot()));
    match outcome {
        Ok(()) => Ok(!store.status().is_error()),
        Err(err) if err.is_validation() => bail!(err),
        Err(_) => Ok(false),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_sync=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = parse_args(&args)
        .and_then(|command| Ok((command, Settings::from_env()?)));
    let (command, settings) = match result {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(2);
        }
    };

    match run(command, settings).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
