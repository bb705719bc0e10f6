//! Push contacts to a CardDAV address book, a softphone database, or a `.vcf` file.
//!
//! # Usage
//!
//! ```text
//! contacts-sync export  --json contacts.json [--output contacts.vcf]
//! contacts-sync carddav --json contacts.json --url <collection> --username <user>   (password from CARDDAV_PASSWORD)
//! contacts-sync local   --vcf contacts.vcf [--db friends.db] [--sip-domain sip.example.net]
//! ```

use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use contacts_sync::client::Client;
use contacts_sync::config::Config;
use contacts_sync::destination::{AddressBook, LocalTable, VcfFile};
use contacts_sync::source::{JsonFileSource, VcfFileSource};
use contacts_sync::sync::sync_progress::{feedback_channel, SyncEvent, SyncProgress};
use contacts_sync::sync::{second_factor_channel, Orchestrator};
use contacts_sync::traits::{ContactSource, Reconciler};
use contacts_sync::SyncResult;

#[derive(Parser, Debug)]
#[command(
    name = "contacts-sync",
    version,
    about = "Replace the content of an address book with contacts from a cloud export",
    long_about = None,
)]
struct Cli {
    /// Configuration file (defaults to ~/.contacts-sync.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store the non-secret settings of this invocation in the configuration file
    #[arg(long, global = true)]
    remember: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Only write a .vcf file
    Export {
        #[command(flatten)]
        source: SourceArgs,
        /// Defaults to the configured export path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Replace every contact of a CardDAV collection
    Carddav {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long, env = "CARDDAV_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Replace every friend of a local softphone database
    Local {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        sip_domain: Option<String>,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// A JSON export of the cloud contacts
    #[arg(long)]
    json: Option<PathBuf>,
    /// An existing .vcf file
    #[arg(long)]
    vcf: Option<PathBuf>,
}

impl SourceArgs {
    fn into_source(self) -> Box<dyn ContactSource> {
        match (self.json, self.vcf) {
            (Some(json), _) => Box::new(JsonFileSource::new(json)),
            (None, Some(vcf)) => Box::new(VcfFileSource::new(vcf)),
            (None, None) => unreachable!("clap requires one source"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Invalid configuration file: {}. Using a default configuration", err);
            Config::default()
        }
    };
    if cli.remember {
        config.remember = true;
    }

    let (source, destination) = match prepare(cli.command, &mut config) {
        Ok(prepared) => prepared,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = config.save(&config_path) {
        log::warn!("Unable to save the configuration: {}", err);
    }

    run(source, destination).await
}

fn prepare(command: Commands, config: &mut Config) -> SyncResult<(Box<dyn ContactSource>, Box<dyn Reconciler>)> {
    match command {
        Commands::Export { source, output } => {
            if let Some(output) = output {
                config.export_path = output;
            }
            Ok((source.into_source(), Box::new(VcfFile::new(&config.export_path))))
        },
        Commands::Carddav { source, url, username, password } => {
            if let Some(url) = url { config.carddav.url = url; }
            if let Some(username) = username { config.carddav.username = username; }
            if let Some(password) = password { config.carddav.password = password; }
            if config.carddav.url.is_empty() {
                return Err(contacts_sync::SyncError::setup("no CardDAV URL configured (use --url)"));
            }
            let client = Client::new(&config.carddav.url, &config.carddav.username, &config.carddav.password, config.http_timeout())?;
            Ok((source.into_source(), Box::new(AddressBook::new(client))))
        },
        Commands::Local { source, db, sip_domain } => {
            if let Some(db) = db { config.local_table.db_path = db; }
            if let Some(domain) = sip_domain { config.local_table.sip_domain = domain; }
            let table = LocalTable::open(&config.local_table.db_path, &config.local_table.sip_domain)?;
            Ok((source.into_source(), Box::new(table)))
        },
    }
}

async fn run(source: Box<dyn ContactSource>, destination: Box<dyn Reconciler>) -> ExitCode {
    let (code_sender, code_receiver) = second_factor_channel();
    let (feedback_sender, mut feedback) = feedback_channel();

    let orchestrator = Orchestrator::new(source).with_second_factor(code_receiver);
    let handle = orchestrator.run_in_background(destination, SyncProgress::new_with_feedback_channel(feedback_sender));

    let mut code_sender = Some(code_sender);
    while feedback.changed().await.is_ok() {
        let event = feedback.borrow().clone();
        match event {
            SyncEvent::AwaitingSecondFactor => {
                let code = prompt("Verification code: ");
                if let Some(sender) = code_sender.take() {
                    let _ = sender.send(code);
                }
            },
            SyncEvent::InProgress{ .. } => log::debug!("{}", event),
            other => println!("{}", other),
        }
    }

    match handle.await {
        Ok((_, Ok(report))) => {
            contacts_sync::utils::print_report(&report);
            if report.errors.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(2) }
        },
        Ok((_, Err(err))) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        },
        Err(err) => {
            eprintln!("The sync task panicked: {}", err);
            ExitCode::FAILURE
        },
    }
}

fn prompt(question: &str) -> String {
    let mut stdout = stdout();
    let _ = stdout.write_all(question.as_bytes());
    let _ = stdout.flush();
    let mut answer = String::new();
    if let Err(err) = stdin().read_line(&mut answer) {
        log::error!("Unable to read the answer: {}", err);
    }
    answer.trim().to_string()
}
