//! `bloodwise` - terminal client for the blood-test scan flow

mod console;

use anyhow::{bail, Context};
use bloodwise_core::{
    AppConfig, AuthContext, Measurement, ScanSession, SignUpOutcome, SubmissionReport,
};
use bloodwise_remote::RemoteServices;
use clap::{Arg, ArgAction, ArgMatches, Command};
use console::{init_tracing, ConsoleNotifier};
use std::process::ExitCode;
use std::sync::Arc;

fn cli() -> Command {
    let email = Arg::new("email")
        .long("email")
        .env("BLOODWISE_EMAIL")
        .required(true)
        .help("Account email");
    let password = Arg::new("password")
        .long("password")
        .env("BLOODWISE_PASSWORD")
        .hide_env_values(true)
        .required(true)
        .help("Account password");

    let mut scan = Command::new("scan")
        .about("Analyze blood test values and save the result")
        .arg(email.clone())
        .arg(password.clone())
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the result as JSON"),
        );
    for field in Measurement::ALL {
        scan = scan.arg(
            Arg::new(field.key())
                .long(field.key())
                .value_name(field.unit())
                .help(format!("{} (normal range: {})", field.display_name(), field.normal_range())),
        );
    }

    Command::new("bloodwise")
        .version(bloodwise_core::VERSION)
        .about("BloodWise anemia screening client")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .help("TOML configuration file; environment variables take precedence"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account")
                .arg(email)
                .arg(password),
        )
        .subcommand(scan)
        .subcommand(Command::new("config").about("Print the resolved configuration"))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<AppConfig> {
    let base = match matches.get_one::<String>("config") {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::new(),
    };
    Ok(base.overlay(|key| std::env::var(key).ok())?)
}

fn services(config: &AppConfig) -> anyhow::Result<RemoteServices> {
    RemoteServices::from_config(config).context("failed to set up remote services")
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map_or("", String::as_str)
}

async fn signup(config: &AppConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let auth = AuthContext::new(services(config)?.auth);
    match auth.sign_up(arg(args, "email"), arg(args, "password")).await? {
        SignUpOutcome::ConfirmationRequired(_) => {
            println!("Account created! Please check your email for verification.");
        }
        SignUpOutcome::SignedIn(session) => {
            println!("Account created for {}.", session.identity.email);
            auth.sign_out().await?;
        }
    }
    Ok(())
}

async fn scan(config: &AppConfig, args: &ArgMatches) -> anyhow::Result<SubmissionReport> {
    let remote = services(config)?;
    let auth = Arc::new(AuthContext::new(remote.auth));
    auth.sign_in(arg(args, "email"), arg(args, "password"))
        .await
        .context("sign-in failed")?;

    let session = ScanSession::new(
        auth.clone(),
        remote.predictor,
        remote.store,
        Arc::new(ConsoleNotifier),
    );
    for field in Measurement::ALL {
        session.set_field(field, arg(args, field.key()));
    }

    let report = session.submit().await;
    if let Some(view) = session.presented() {
        if args.get_flag("json") {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            println!("{}", view.render_text());
        }
    }

    if let Err(e) = auth.sign_out().await {
        tracing::warn!(error = %e, "sign-out failed");
    }
    Ok(report)
}

async fn run(matches: ArgMatches) -> anyhow::Result<bool> {
    let config = load_config(&matches)?;
    tracing::debug!(?config, "configuration resolved");

    match matches.subcommand() {
        Some(("signup", args)) => {
            signup(&config, args).await?;
            Ok(true)
        }
        Some(("scan", args)) => Ok(scan(&config, args).await?.computation.is_ok()),
        Some(("config", _)) => {
            println!("Inference endpoint: {}", config.inference.predict_url());
            println!("Inference timeout:  {}ms", config.inference.timeout_ms);
            println!("Backend URL:        {}", config.backend.url);
            println!(
                "Backend key:        {}",
                if config.backend.anon_key.is_some() { "set" } else { "missing" }
            );
            Ok(true)
        }
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(matches).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
