use anyhow::Context;
use routebook::{
    ApiRouter, Handlers, Metrics, Server, SystemGroup,
    cli::{
        Cli, Commands,
        init::{self, InitConfig, InitResult},
        output::{Output, column_widths},
    },
    utils::toml_config::RoutebookConfig,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match run(cli, &output).await {
        Ok(code) => code,
        Err(e) => {
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<ExitCode> {
    // A missing .env is normal.
    dotenvy::dotenv().ok();

    match cli.command {
        Some(Commands::Init { path, force }) => {
            return Ok(match init::run(InitConfig { path, force }, output) {
                InitResult::Success => ExitCode::SUCCESS,
                InitResult::AlreadyExists | InitResult::Error(_) => ExitCode::FAILURE,
            });
        }
        Some(Commands::Routes) => {
            let api = assemble()?;
            print_routes(&api, output);
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Serve { .. }) | None => {}
    }

    let mut config = RoutebookConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    config.apply_env_overrides()?;
    if let Some(Commands::Serve { host, port }) = cli.command {
        if let Some(host) = host {
            config.server.host = host;
        }
        if let Some(port) = port {
            config.server.port = port;
        }
        config.validate()?;
    }

    init_tracing(&config, cli.verbose);

    let api = assemble().context("invalid route table")?;
    Server::new(config.server)
        .run(api.into_router())
        .await
        .context("server error")?;
    Ok(ExitCode::SUCCESS)
}

fn assemble() -> routebook::Result<ApiRouter> {
    Handlers::new()
        .add(SystemGroup::new())
        .assemble(Arc::new(Metrics::new()))
}

fn init_tracing(config: &RoutebookConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn print_routes(api: &ApiRouter, output: &Output) {
    let header = ["METHOD", "PATH", "GROUP", "NAME"];
    let rows: Vec<Vec<&str>> = api
        .routes()
        .iter()
        .map(|r| {
            vec![
                r.method.as_str(),
                r.path.as_str(),
                r.group.as_deref().unwrap_or("-"),
                r.name.as_str(),
            ]
        })
        .collect();
    let widths = column_widths(&header, &rows);

    output.section("Routes");
    output.table_header(&header, &widths);
    for row in &rows {
        output.table_row(row, &widths);
    }
    output.newline();
    output.field("total", &rows.len().to_string());
}
