#[macro_use] extern crate clap;

use clap::{App, ArgMatches};
use env_logger::{from_env, Env};
use std::{env, error::Error, net::SocketAddr, sync::Arc, time::Duration};
use updock::{
    server, DefaultRegistry, DigestComparison, DockerRuntime, FailurePolicy, RegistryClient,
    Resolver, UpdateChecker,
};

const PASSWORD_VAR: &str = "UPDOCK_PASSWORD";

#[tokio::main]
async fn main() {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).get_matches();

    let log_level = matches.value_of("log_level").unwrap_or("info");
    from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(err) = run(&matches).await {
        log::error!("{}", err);
        eprintln!("updock: {}", err);
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches<'_>) -> Result<(), Box<dyn Error>> {
    let checker = Arc::new(build_checker(matches)?);

    if matches.is_present("once") {
        let containers = checker.check_all().await?;
        println!("{}", serde_json::to_string_pretty(&containers)?);
        return Ok(());
    }

    let listen: SocketAddr = matches
        .value_of("listen")
        .unwrap_or("0.0.0.0:8000")
        .parse()
        .map_err(|err| format!("invalid listen address, {}", err))?;

    match checker.check_all().await {
        Ok(containers) => {
            for info in &containers {
                log::info!(
                    "{} ({}) running {}, updatable: {}",
                    info.name,
                    info.status,
                    info.image,
                    info.updatable
                );
            }
        }
        Err(err) => log::warn!("initial update check failed, {}", err),
    }

    server::serve(listen, checker).await?;
    Ok(())
}

fn build_checker(matches: &ArgMatches<'_>) -> Result<UpdateChecker, Box<dyn Error>> {
    let mut registry = DefaultRegistry::new();
    if let Some(url) = matches.value_of("registry_url") {
        registry.network_url = url.parse()?;
    }
    if let Some(url) = matches.value_of("auth_url") {
        registry.auth_realm = url.parse()?;
    }
    if let Some(service) = matches.value_of("auth_service") {
        registry.service = service.to_owned();
    }

    let mut client = RegistryClient::builder().registry(&registry);
    if let Some(username) = matches.value_of("username") {
        let password = matches
            .value_of("password")
            .map(str::to_owned)
            .or_else(|| env::var(PASSWORD_VAR).ok());
        client = client.login(username.to_owned(), password);
    }
    if let Some(seconds) = parsed_value::<u64>(matches, "timeout")? {
        client = client.request_timeout(Duration::from_secs(seconds));
    }
    if let Some(seconds) = parsed_value::<u64>(matches, "connect_timeout")? {
        client = client.connect_timeout(Duration::from_secs(seconds));
    }
    let resolver = Resolver::from_client(client.build()?);

    let comparison: DigestComparison = matches
        .value_of("compare")
        .unwrap_or("none-contains")
        .parse()?;
    let policy: FailurePolicy = matches.value_of("on_error").unwrap_or("abort").parse()?;
    let concurrency = parsed_value::<usize>(matches, "concurrency")?;

    let runtime = DockerRuntime::connect()?;
    let checker = UpdateChecker::builder()
        .comparison(comparison)
        .failure_policy(policy)
        .concurrency(concurrency)
        .build(Arc::new(runtime), resolver);
    log::debug!("{:?}", checker);
    Ok(checker)
}

fn parsed_value<T>(matches: &ArgMatches<'_>, name: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    matches
        .value_of(name)
        .map(|value| {
            value
                .parse()
                .map_err(|err| format!("invalid {} {:?}, {}", name.replace('_', "-"), value, err))
        })
        .transpose()
}
