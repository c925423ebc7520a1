#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use timeline_scheduler::{
        EngineConfig, JsonlChangeLog, Schedule, TimelineSnapshot, http_api,
        load_snapshot_from_json, logging,
    };

    logging::init(false);

    let addr: SocketAddr = std::env::var("TIMELINE_SCHEDULER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let config = EngineConfig::from_env()?;

    let snapshot = match std::env::args().nth(1) {
        Some(path) => load_snapshot_from_json(path)?,
        None => TimelineSnapshot::default(),
    };
    let mut schedule = Schedule::with_config(snapshot, &config)?;
    if let Ok(path) = std::env::var("TIMELINE_SCHEDULER_CHANGE_LOG") {
        schedule.set_sink(Box::new(JsonlChangeLog::new(path)));
    }

    println!("timeline-scheduler HTTP API listening on http://{addr}");
    http_api::serve(addr, schedule).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
