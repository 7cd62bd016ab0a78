use std::time::Duration;

use resilient_probe::{
    host, ClientOptions, EnvConfig, Layered, ManagedService, MapConfig, ResilientClient,
};
use tokio_util::sync::CancellationToken;

fn load_live_target() -> Result<(String, String), String> {
    let base = std::env::var("PROBE_LIVE_BASE_ADDRESS")
        .map_err(|_| "PROBE_LIVE_BASE_ADDRESS is required".to_owned())?;
    let path = std::env::var("PROBE_LIVE_PATH").unwrap_or_else(|_| "api/people/1/".to_owned());
    if base.trim().is_empty() {
        return Err("PROBE_LIVE_BASE_ADDRESS is set but empty".to_owned());
    }
    Ok((base, path))
}

#[tokio::test]
async fn live_endpoint_reaches_terminal_outcome() {
    let (base, path) = match load_live_target() {
        Ok(values) => values,
        Err(_) => {
            eprintln!("skipping live test: PROBE_LIVE_BASE_ADDRESS not set");
            return;
        }
    };

    let options = ClientOptions {
        timeout_ms: 10_000,
        max_attempts: 3,
        backoff_unit_ms: 100,
        ..ClientOptions::default()
    };
    let client = ResilientClient::with_options(&base, &options).expect("client must build");
    let config = Layered::new(
        [("PROBE_PATH", path.as_str())]
            .into_iter()
            .collect::<MapConfig>(),
        EnvConfig::new(),
    );
    let service = ManagedService::new(client, config, "PROBE_PATH");

    let done = service
        .execute(&CancellationToken::new())
        .await
        .expect("configured service must run");

    assert!(done.attempts >= 1 && done.attempts <= 3);
    eprintln!("live outcome after {} attempt(s): {}", done.attempts, done.outcome);
}

#[tokio::test]
async fn live_host_shuts_down_cleanly() {
    let (base, path) = match load_live_target() {
        Ok(values) => values,
        Err(_) => {
            eprintln!("skipping live test: PROBE_LIVE_BASE_ADDRESS not set");
            return;
        }
    };

    let client = ResilientClient::new(&base).expect("client must build");
    let config: MapConfig = [("PROBE_PATH", path)].into_iter().collect();
    let service = ManagedService::new(client, config, "PROBE_PATH");

    host::run_until(&service, tokio::time::sleep(Duration::from_millis(200)))
        .await
        .expect("host must stop cleanly");
}
