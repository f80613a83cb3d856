pub mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::Instrument;

use cli::{Cli, Command};
use common::logger::{TraceId, init_logger, root_span};
use session::config::StoreConfig;
use session::db::{ConnectionProvider, Db};
use session::{Backend, BackendKind, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logger("sessionctl", cli.json_logs);

    let cfg = StoreConfig::from_env();
    let backend = cfg.backend()?;
    let db = Db::connect(&cfg.database_url, cfg.max_connections)
        .await
        .with_context(|| format!("connecting to {}", cfg.database_url))?;
    let store = SessionStore::new(backend, Arc::new(cfg.locking_enabled));

    let trace_id = TraceId::default();
    let span = root_span(cli.command.name(), &trace_id);
    if let Some(sid) = cli.command.session_id() {
        span.record("session_id", tracing::field::display(sid));
    }

    run(&db, &store, cli.command).instrument(span).await
}

async fn run(
    db: &Db,
    store: &SessionStore<BackendKind>,
    command: Command,
) -> anyhow::Result<ExitCode> {
    match command {
        Command::Init => {
            db.bootstrap(store.backend()).await?;
            println!("sessions table ready ({})", store.backend().name());
        }

        Command::Show { session_id, json } => {
            let mut conn = db.acquire().await?;
            match store.find_by_session_id(&mut conn, &session_id, false).await? {
                Some(rec) if json => println!("{}", serde_json::to_string_pretty(&rec)?),
                Some(rec) => {
                    println!("id:           {}", rec.id().unwrap_or_default());
                    println!("session_id:   {}", rec.session_id());
                    println!("updated_at:   {}", rec.updated_at());
                    println!("lock_version: {}", rec.lock_version());
                    println!("data:         {}", rec.data());
                }
                None => {
                    eprintln!("session {session_id} not found");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Put {
            session_id,
            data,
            optimistic: false,
        } => {
            // locked read-modify-write; the row lock lives until commit
            let mut tx = db.pool.begin().await?;
            let mut rec = match store.find_by_session_id(&mut tx, &session_id, true).await? {
                Some(rec) => rec,
                None => store.create(session_id.as_str(), ""),
            };
            rec.set_data(data);
            store.save(&mut tx, &mut rec).await?;
            tx.commit().await?;

            println!(
                "saved id={} lock_version={}",
                rec.id().unwrap_or_default(),
                rec.lock_version()
            );
        }

        Command::Put {
            session_id,
            data,
            optimistic: true,
        } => {
            let mut conn = db.acquire().await?;
            let Some(mut rec) = store.find_by_session_id(&mut conn, &session_id, false).await?
            else {
                // nothing to race against yet
                let mut rec = store.create(session_id.as_str(), data);
                store.save(&mut conn, &mut rec).await?;
                println!("created id={}", rec.id().unwrap_or_default());
                return Ok(ExitCode::SUCCESS);
            };

            rec.set_data(data);
            if store.save_optimistic(&mut conn, &mut rec).await? {
                println!("saved lock_version={}", rec.lock_version());
            } else {
                eprintln!("conflict: session {session_id} changed concurrently");
                return Ok(ExitCode::from(2));
            }
        }

        Command::Touch { session_id } => {
            let mut conn = db.acquire().await?;
            match store.find_by_session_id(&mut conn, &session_id, false).await? {
                Some(rec) => store.touch(&mut conn, &rec).await?,
                None => {
                    eprintln!("session {session_id} not found");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Delete { session_id } => {
            let mut conn = db.acquire().await?;
            let rec = store.create(session_id.as_str(), "");
            let removed = store.destroy(&mut conn, &rec).await?;
            println!("removed {removed} row(s)");
        }

        Command::Purge { condition } => {
            let mut conn = db.acquire().await?;
            let removed = store.delete_all(&mut conn, condition.as_deref()).await?;
            tracing::info!(removed, "purged sessions");
            println!("removed {removed} row(s)");
        }
    }

    Ok(ExitCode::SUCCESS)
}
