use std::net::{IpAddr, SocketAddr};

use clap::{CommandFactory, Parser};
use monodash::{
    cli::{MonodashArgs, MonodashSubcommand},
    config::MonodashConfig,
    models::{ActionRequest, CreateInstanceRequest, MetricsQuery, UpdateInstanceRequest},
    server,
    service::Monodash,
    MonodashError, MonodashResult,
};
use serde::Serialize;

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> MonodashResult<()> {
    dotenvy::dotenv().ok();

    let args = MonodashArgs::parse();
    let Some(subcommand) = args.subcommand else {
        MonodashArgs::command().print_help()?;
        return Ok(());
    };

    let mut config = MonodashConfig::load(args.config.as_deref()).await?;
    let _guard = monodash::init_tracing(
        args.verbose,
        config.get_log().get_level().as_deref(),
        config.log_dir().as_deref(),
    )?;

    if let MonodashSubcommand::Serve { host, port } = &subcommand {
        let mut server_config = config.get_server().clone();
        if let Some(host) = host {
            server_config.set_host(host.clone());
        }
        if let Some(port) = port {
            server_config.set_port(*port);
        }
        config.set_server(server_config);
        config.validate()?;
    }

    let service = Monodash::from_config(&config).await?;

    match subcommand {
        MonodashSubcommand::Serve { .. } => {
            let host: IpAddr = config.get_server().get_host().parse().map_err(|e| {
                MonodashError::InvalidConfig(format!(
                    "server.host '{}' is not an IP address: {}",
                    config.get_server().get_host(),
                    e
                ))
            })?;
            let addr = SocketAddr::new(host, *config.get_server().get_port());
            tracing::trace!("starting server: addr={addr}");
            server::serve(service, addr).await?;
        }
        MonodashSubcommand::Overview => print_json(&service.dashboard_overview().await?)?,
        MonodashSubcommand::Host { refresh } => {
            let snapshot = if refresh {
                service.refresh_host_telemetry().await?
            } else {
                service.host_telemetry().await?
            };
            print_json(&snapshot)?;
        }
        MonodashSubcommand::List => print_json(&service.list_instances().await?)?,
        MonodashSubcommand::Show { handle } => print_json(&service.get_instance(handle).await?)?,
        MonodashSubcommand::Create {
            handle,
            name,
            kind,
            cores,
            memory,
            disk,
        } => {
            let request = CreateInstanceRequest {
                handle,
                name,
                kind,
                cpu_cores: cores,
                memory_allocated: memory,
                disk_size: disk,
            };
            print_json(&service.create_instance(&request).await?)?;
        }
        MonodashSubcommand::Update {
            id,
            name,
            cores,
            memory,
            disk,
            expect_version,
        } => {
            let request = UpdateInstanceRequest {
                id,
                name,
                cpu_cores: cores,
                memory_allocated: memory,
                disk_size: disk,
                version: expect_version,
            };
            print_json(&service.update_instance(&request).await?)?;
        }
        MonodashSubcommand::Action { handle, action } => {
            tracing::trace!("performing action: handle={handle}, action={action}");
            let instance = service
                .perform_action(&ActionRequest { handle, action })
                .await?;
            print_json(&instance)?;
        }
        MonodashSubcommand::Record { handle } => {
            print_json(&service.record_metric_sample(handle).await?)?
        }
        MonodashSubcommand::Metrics { handle, hours } => {
            let samples = service
                .query_metric_samples(&MetricsQuery { handle, hours })
                .await?;
            print_json(&samples)?;
        }
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn print_json(value: &impl Serialize) -> MonodashResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
