mod cli;

use std::io;
use std::sync::Arc;

use clap::Parser;
use cli::{GlobalOpts, Opts};
use serde_json::json;
use shelfgate_client::error::{InitError, LoginError};
use shelfgate_client::{Client, Credentials};
use shelfgate_core::token::{self, TokenDecodeError};
use shelfgate_store::{RedbStorage, SessionStore, StoreError};
use shelfgate_util_error::WhateverResult;
use snafu::{FromString, ResultExt, Snafu, Whatever};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const PROJECT_NAME: &str = "shelfgate";
pub const LOG_TARGET: &str = "shelfgate::cli";

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Initialization error: {source}"))]
    Init { source: InitError },
    #[snafu(display("Login error: {source}"))]
    Login { source: LoginError },
    #[snafu(display("Local storage error: {source}"))]
    Store { source: StoreError },
    #[snafu(display("Token error: {source}"))]
    Token { source: TokenDecodeError },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    let v = handle_cmd(opts).await?;
    println!("{}", serde_json::to_string_pretty(&v).expect("Can't fail"));
    Ok(())
}

fn open_store(global: &GlobalOpts) -> CliResult<SessionStore> {
    let path = RedbStorage::mk_db_path(global.data_dir()).context(StoreSnafu)?;
    let storage = RedbStorage::open(path).context(StoreSnafu)?;
    Ok(SessionStore::new(Arc::new(storage)))
}

fn make_client(global: &GlobalOpts) -> CliResult<Client> {
    Client::builder()
        .store(open_store(global)?)
        .api_url(global.api_url.clone())
        .timeout(global.timeout())
        .build()
        .context(InitSnafu)
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    Ok(match opts.cmd {
        cli::OptsCmd::Login { username, password } => {
            let client = make_client(&opts.global)?;
            let session = client
                .login(&Credentials { username, password })
                .await
                .context(LoginSnafu)?;

            serde_json::to_value(session).expect("Can't fail")
        }
        cli::OptsCmd::Logout => {
            open_store(&opts.global)?.clear().context(StoreSnafu)?;
            info!(target: LOG_TARGET, "Session cleared");

            serde_json::Value::Bool(true)
        }
        cli::OptsCmd::Status => {
            let store = open_store(&opts.global)?;
            let session = store.try_get().context(StoreSnafu)?;
            let token = store.token().context(StoreSnafu)?;

            json!({
                "session": session,
                "memberId": session.member_id(),
                "tokenIdentity": token.as_deref().and_then(token::identity_from_token),
            })
        }
        cli::OptsCmd::Routes => {
            let client = make_client(&opts.global)?;

            serde_json::to_value(client.routes()).expect("Can't fail")
        }
        cli::OptsCmd::Navigate {
            payment_success,
            paths,
        } => {
            let client = make_client(&opts.global)?;
            if payment_success {
                client.bypass().set().context(StoreSnafu)?;
            }

            let mut out = vec![];
            for path in paths {
                let navigation = client.navigate(&path).await;
                let verdict = navigation.outcome.verdict();
                out.push(json!({
                    "path": navigation.target.path,
                    "route": navigation.target.name,
                    "verdict": verdict,
                    "redirect": verdict.and_then(|v| v.redirect()),
                    "title": client.guard().title(),
                }));
            }

            serde_json::Value::Array(out)
        }
        cli::OptsCmd::Dev(cmd) => match cmd {
            cli::DevCmd::DecodeToken { token } => {
                let payload = token::try_decode(&token).context(TokenSnafu)?;

                json!({
                    "memberId": token::extract_identity(&payload),
                    "payload": payload,
                })
            }
            cli::DevCmd::Resolve { member_id } => {
                let client = make_client(&opts.global)?;

                serde_json::Value::Bool(client.resolver().resolve_member(member_id).await)
            }
        },
    })
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| {
            Whatever::without_source(format!("Failed to initialize {PROJECT_NAME} logging"))
        })?;

    Ok(())
}
