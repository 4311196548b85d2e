//! Command-line entry point: runs one availability discovery against the
//! scheduling API and prints the result as JSON.

use std::sync::Arc;

use appointment_scan::{CenterRef, DiscoverRequest, DiscoveryEngine, ResponseCache, ScanConfig};
use sched_api::SchedClient;

fn usage() -> ! {
    eprintln!("Usage: scan_cli <center-ids> <service-ids> <weeks>");
    eprintln!("  center-ids   comma-separated, in priority order (first = preferred)");
    eprintln!("  service-ids  comma-separated");
    eprintln!("  weeks        number of weeks to probe (1-4)");
    std::process::exit(2);
}

fn parse_request(args: &[String]) -> DiscoverRequest {
    if args.len() != 4 {
        usage();
    }

    let centers: Vec<CenterRef> = args[1]
        .split(',')
        .filter(|id| !id.is_empty())
        .enumerate()
        .map(|(index, id)| CenterRef {
            id: id.to_string(),
            priority: index as i32 + 1,
        })
        .collect();

    let services: Vec<String> = args[2]
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let weeks = match args[3].parse::<u32>() {
        Ok(weeks) => weeks,
        Err(_) => usage(),
    };

    DiscoverRequest {
        centers,
        services,
        weeks,
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args: Vec<String> = std::env::args().collect();
    let request = parse_request(&args);

    let config = match ScanConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            log::error!("💡 Set SCHED_API_BASE_URL and SCHED_API_KEY");
            std::process::exit(1);
        }
    };

    let api = match SchedClient::new(&config.api_base_url, &config.api_key) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to create scheduling API client: {}", e);
            std::process::exit(1);
        }
    };

    let cache = Arc::new(ResponseCache::with_ttl(config.cache_ttl));
    let engine = DiscoveryEngine::new(Arc::new(api), cache, &config);

    log::info!(
        "🔍 Discovering availability for {} centers over {} weeks",
        request.centers.len(),
        request.weeks
    );

    match engine.discover(&request).await {
        Ok(result) => {
            log::info!(
                "Found {} available dates in {} ms",
                result.available_dates.len(),
                result.processing_time_ms
            );
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    log::error!("Failed to serialize result: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            log::error!("❌ Discovery failed: {}", e);
            std::process::exit(1);
        }
    }
}
