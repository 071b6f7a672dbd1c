//! `zoo-admin` command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use zoo_api::{build_service, init_logging, run_server, AppConfig, BackendKind, LogFormat};

fn cli() -> Command {
    Command::new("zoo-admin")
        .version(zoo_api::VERSION)
        .about("Zoo chatbot administration backend")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .value_parser(value_parser!(BackendKind))
                .env("ZOO_ADMIN_BACKEND")
                .help("Storage backend: memory or dynamodb"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .value_parser(value_parser!(LogFormat))
                .env("ZOO_ADMIN_LOG_FORMAT")
                .help("Log output: compact or json"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP API")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .env("ZOO_ADMIN_HOST")
                        .help("Bind host"),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .value_parser(value_parser!(u16))
                        .env("ZOO_ADMIN_PORT")
                        .help("Bind port"),
                ),
        )
        .subcommand(
            Command::new("cleanup-sandboxes")
                .about("Delete expired sandbox assistants once and exit"),
        )
        .subcommand(
            Command::new("tables")
                .about("Print the resolved table configuration")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn resolve_config(matches: &ArgMatches) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::from_env()?;
    if let Some(backend) = matches.get_one::<BackendKind>("backend") {
        config = config.with_backend(*backend);
    }
    if let Some(format) = matches.get_one::<LogFormat>("log-format") {
        config = config.with_log_format(*format);
    }
    if let Some(("serve", args)) = matches.subcommand() {
        if let Some(host) = args.get_one::<String>("host") {
            config = config.with_host(host.clone());
        }
        if let Some(port) = args.get_one::<u16>("port") {
            config = config.with_port(*port);
        }
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = resolve_config(&matches)?;
    init_logging(config.log_format).map_err(|e| anyhow::anyhow!(e))?;

    match matches.subcommand() {
        Some(("serve", _)) => run_server(&config).await?,
        Some(("cleanup-sandboxes", _)) => {
            let service = build_service(&config).await?;
            let removed = service
                .sandboxes()
                .cleanup_expired_sandboxes()
                .await
                .context("sandbox cleanup failed")?;
            println!("Removed {removed} expired sandboxes");
        }
        Some(("tables", args)) => {
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&config.tables)?);
            } else {
                println!("{:<14} {:<32} {}", "ENTITY", "TABLE", "PRIMARY KEY");
                for (kind, table) in config.tables.iter() {
                    println!("{:<14} {:<32} {}", kind.as_str(), table.table_name, table.primary_key);
                }
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let matches = cli()
            .try_get_matches_from(["zoo-admin", "--backend", "memory", "serve", "--port", "9090"])
            .unwrap();
        let config = resolve_config(&matches).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.backend, BackendKind::Memory);
    }
}
