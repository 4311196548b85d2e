use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, NaiveDate, Utc};
use futures_util::future::join_all;
use sched_api::{SchedulingApi, SlotData};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::aggregator;
use crate::config::ScanConfig;
use crate::probe::{BookingProbe, SlotFetcher};
use crate::rate_limit::RateLimitedClient;
use crate::response_cache::ResponseCache;
use crate::scan_types::{
    CenterDateAvailability, DateAvailability, DiscoverRequest, DiscoveryResult, PairError,
    ProvenanceLink, ScanError,
};
use crate::weekly;

/// Identifies one provisional-reservation attempt within a run. The service
/// set is fixed for a run, so (center, date) is sufficient.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProbeKey {
    center_id: String,
    date: NaiveDate,
}

/// One (center, date) pair queued for probing, with the chain of discoveries
/// that led to it.
#[derive(Debug, Clone)]
struct FrontierPair {
    center_id: String,
    priority: i32,
    date: NaiveDate,
    provenance: Vec<ProvenanceLink>,
}

/// Outcome of probing and fetching one frontier pair.
struct PairOutcome {
    pair: FrontierPair,
    result: Result<(String, SlotData), ScanError>,
}

/// Orchestrates probing across an expanding, deduplicated frontier of
/// (center, date) pairs.
///
/// The frontier is processed in generations: every pair of generation k
/// completes, success or failure, before any pair of generation k+1 is
/// dispatched. Concurrency within and across generations is bounded only by
/// the shared semaphore in [`RateLimitedClient`]. Hinted dates outside the
/// horizon are dropped at enqueue time, which bounds the run to
/// centers x dates-within-horizon probes.
pub struct DiscoveryEngine {
    probe: BookingProbe,
    fetcher: SlotFetcher,
    horizon_days: i64,
}

impl DiscoveryEngine {
    /// Build an engine over the given upstream API and shared response cache.
    pub fn new(api: Arc<dyn SchedulingApi>, cache: Arc<ResponseCache>, config: &ScanConfig) -> Self {
        let limiter = Arc::new(RateLimitedClient::new(config.concurrency));

        Self {
            probe: BookingProbe::new(api.clone(), limiter.clone(), cache.clone()),
            fetcher: SlotFetcher::new(api, limiter, cache),
            horizon_days: config.horizon_days,
        }
    }

    /// Discover which dates within the horizon have open appointment slots.
    ///
    /// Per-pair probe or fetch failures are recorded in the result and never
    /// abort the run; the call itself only fails on invalid input.
    pub async fn discover(&self, request: &DiscoverRequest) -> Result<DiscoveryResult, ScanError> {
        request
            .validate()
            .map_err(|e| ScanError::Validation(e.to_string()))?;

        let started = Instant::now();
        let today = Utc::now().date_naive();
        let horizon_end = today + Duration::days(self.horizon_days);

        let mut frontier = self.initial_frontier(request, today, horizon_end);
        if frontier.is_empty() {
            info!("No probe candidates within the horizon");
            return Ok(DiscoveryResult::empty(started));
        }

        info!(
            "Starting discovery for {} centers, {} initial pairs",
            request.centers.len(),
            frontier.len()
        );

        // Processed-or-pending keys; a key is never enqueued twice, which
        // keeps provenance chains acyclic and guarantees termination.
        let mut seen: HashSet<ProbeKey> = HashSet::new();
        let mut outcomes: Vec<PairOutcome> = Vec::new();
        let mut generation = 0u32;

        while !frontier.is_empty() {
            let current: Vec<FrontierPair> = std::mem::take(&mut frontier)
                .into_iter()
                .filter(|pair| {
                    seen.insert(ProbeKey {
                        center_id: pair.center_id.clone(),
                        date: pair.date,
                    })
                })
                .collect();

            if current.is_empty() {
                break;
            }
            debug!(
                "Processing generation {} with {} pairs",
                generation,
                current.len()
            );

            let results = join_all(
                current
                    .into_iter()
                    .map(|pair| self.process_pair(pair, &request.services)),
            )
            .await;

            for outcome in results {
                if let Ok((booking_id, data)) = &outcome.result {
                    for hint in &data.future_days {
                        if !hint.is_available {
                            continue;
                        }
                        // Horizon clamp: a hint outside the requested window
                        // never grows the frontier
                        if hint.day < today || hint.day > horizon_end {
                            debug!("Dropping out-of-horizon hint {}", hint.day);
                            continue;
                        }

                        let key = ProbeKey {
                            center_id: outcome.pair.center_id.clone(),
                            date: hint.day,
                        };
                        if seen.contains(&key)
                            || frontier
                                .iter()
                                .any(|p| p.center_id == key.center_id && p.date == key.date)
                        {
                            continue;
                        }

                        let mut provenance = outcome.pair.provenance.clone();
                        provenance.push(ProvenanceLink {
                            date: outcome.pair.date,
                            booking_id: booking_id.clone(),
                        });

                        frontier.push(FrontierPair {
                            center_id: outcome.pair.center_id.clone(),
                            priority: outcome.pair.priority,
                            date: hint.day,
                            provenance,
                        });
                    }
                }
                outcomes.push(outcome);
            }

            generation += 1;
        }

        info!(
            "Discovery finished after {} generations, {} pairs probed",
            generation,
            outcomes.len()
        );

        Ok(Self::assemble(outcomes, started))
    }

    /// Cartesian product of centers and week-start dates, clamped to the
    /// horizon. The first week starts today so the run never probes the past.
    fn initial_frontier(
        &self,
        request: &DiscoverRequest,
        today: NaiveDate,
        horizon_end: NaiveDate,
    ) -> Vec<FrontierPair> {
        let mut frontier = Vec::new();

        for center in &request.centers {
            for week in 0..request.weeks {
                let date = today + Duration::days(7 * week as i64);
                if date <= horizon_end {
                    frontier.push(FrontierPair {
                        center_id: center.id.clone(),
                        priority: center.priority,
                        date,
                        provenance: Vec::new(),
                    });
                }
            }
        }

        frontier
    }

    /// Probe one pair and fetch its slots; failures are captured in the
    /// outcome, never raised.
    async fn process_pair(&self, pair: FrontierPair, services: &[String]) -> PairOutcome {
        let result: Result<(String, SlotData), ScanError> = async {
            let booking_id = self.probe.probe(&pair.center_id, pair.date, services).await?;
            let data = self.fetcher.fetch_slots(&booking_id, true).await?;
            Ok((booking_id, data))
        }
        .await;

        if let Err(e) = &result {
            warn!("Probe failed for {} on {}: {}", pair.center_id, pair.date, e);
        }

        PairOutcome { pair, result }
    }

    /// Fold pair outcomes into the per-date calendar view.
    fn assemble(outcomes: Vec<PairOutcome>, started: Instant) -> DiscoveryResult {
        let mut by_date: BTreeMap<NaiveDate, Vec<CenterDateAvailability>> = BTreeMap::new();
        let mut errors = Vec::new();

        for outcome in outcomes {
            match outcome.result {
                Ok((booking_id, data)) => {
                    let hourly_buckets = aggregator::aggregate(&data.slots);
                    let count: usize = hourly_buckets.iter().map(|b| b.count).sum();
                    if count == 0 {
                        continue;
                    }

                    by_date
                        .entry(outcome.pair.date)
                        .or_default()
                        .push(CenterDateAvailability {
                            id: outcome.pair.center_id,
                            date: outcome.pair.date,
                            booking_id,
                            priority: outcome.pair.priority,
                            count,
                            hourly_buckets,
                            provenance: outcome.pair.provenance,
                        });
                }
                Err(e) => errors.push(PairError {
                    center_id: outcome.pair.center_id,
                    date: outcome.pair.date,
                    message: e.to_string(),
                }),
            }
        }

        let mut date_availability = BTreeMap::new();
        for (date, mut centers) in by_date {
            // Stable sort: equal priorities keep encounter order
            centers.sort_by_key(|c| c.priority);
            let total: usize = centers.iter().map(|c| c.count).sum();

            date_availability.insert(
                date,
                DateAvailability {
                    has_slots: total > 0,
                    total_available_slots: total,
                    locations: centers,
                },
            );
        }

        let available_dates: Vec<NaiveDate> = date_availability.keys().copied().collect();
        let weekly_availability = weekly::index_by_week(&available_dates);

        DiscoveryResult {
            date_availability,
            available_dates,
            weekly_availability,
            errors,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}
