//! Research runs: fan out the connectors for each keyword, ingest the
//! hits as signals, score and aggregate them into leaders, and persist the
//! run with its evidence.
//!
//! Connector failures are contained here: a failed source contributes zero
//! hits and is never fatal to the run. Storage failures are.

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use trendlens_connectors::{geo_for_region, Connectors, RawHit};
use trendlens_core::{map_entity, EntityType, MappedEntity, Source};

use crate::error::EngineError;
use crate::ingest::ingest_hits;

/// Seed keywords when a run is triggered without any.
pub const DEFAULT_KEYWORDS: &[&str] =
    &["trenchcoat", "loafers", "quiet luxury", "beige", "red shoes"];

const LEADER_URL_CAP: usize = 6;
const LEADER_LIMIT: usize = 20;
const RISING_BULLETS: usize = 6;
const MIN_LEADERS_BEFORE_FILLERS: usize = 3;
const FILLED_LEADER_CAP: usize = 6;

/// Hit window caps: video and community sources only stay fresh for
/// about two weeks.
const SHORT_WINDOW_DAYS: u32 = 14;

/// One aggregated entity from a research run.
#[derive(Debug, Clone, Serialize)]
pub struct Leader {
    pub entity: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub volume: f64,
    pub trend: f64,
    pub fresh: f64,
    pub score: f64,
    pub urls: Vec<String>,
}

/// Raw hit counts per connector label.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SourceCounts {
    pub trends: usize,
    pub youtube: usize,
    pub gdelt: usize,
    pub reddit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub entity: String,
    pub url: String,
}

/// What a research run returns to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    pub region: String,
    pub keywords: Vec<String>,
    pub leaders: Vec<Leader>,
    pub rising: Vec<String>,
    pub source_counts: SourceCounts,
    pub citations: Vec<Citation>,
    pub run_id: i64,
}

/// Lightweight per-hit score for display ranking: log-compressed volume,
/// saturated trend, source trust, and freshness.
#[must_use]
pub fn score_hit(hit: &RawHit) -> f64 {
    let w = Source::from_label(&hit.source).research_weight();
    let v = hit.volume.max(1.0).log10();
    let t = (hit.trend * 3.0).tanh();
    v + 0.7 * t + 0.3 * w + 0.3 * hit.fresh
}

/// A hit with its mapped entity and light score.
#[derive(Debug, Clone)]
pub struct MappedHit {
    pub hit: RawHit,
    pub mapped: Option<MappedEntity>,
    pub score: f64,
}

/// Aggregate mapped hits per (entity, type): volumes and trends sum,
/// freshness takes the max, scores sum, and up to six distinct URLs are
/// kept as evidence. Unmapped hits are excluded. Sorted by score
/// descending.
#[must_use]
pub fn aggregate_leaders(hits: &[MappedHit]) -> Vec<Leader> {
    use std::collections::BTreeMap;

    struct Acc {
        entity_type: EntityType,
        volume: f64,
        trend: f64,
        fresh: f64,
        score: f64,
        urls: Vec<String>,
    }

    let mut by_entity: BTreeMap<String, Acc> = BTreeMap::new();
    for mapped_hit in hits {
        let Some(mapped) = &mapped_hit.mapped else {
            continue;
        };
        let acc = by_entity.entry(mapped.entity.clone()).or_insert(Acc {
            entity_type: mapped.kind,
            volume: 0.0,
            trend: 0.0,
            fresh: 0.0,
            score: 0.0,
            urls: Vec::new(),
        });
        acc.volume += mapped_hit.hit.volume;
        acc.trend += mapped_hit.hit.trend;
        acc.fresh = acc.fresh.max(mapped_hit.hit.fresh);
        acc.score += mapped_hit.score;
        if let Some(url) = &mapped_hit.hit.url {
            if acc.urls.len() < LEADER_URL_CAP && !acc.urls.contains(url) {
                acc.urls.push(url.clone());
            }
        }
    }

    let mut leaders: Vec<Leader> = by_entity
        .into_iter()
        .map(|(entity, acc)| Leader {
            entity,
            entity_type: acc.entity_type,
            volume: acc.volume,
            trend: acc.trend,
            fresh: acc.fresh,
            score: acc.score,
            urls: acc.urls,
        })
        .collect();
    leaders.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity.cmp(&b.entity))
    });
    leaders
}

/// Pad a thin leaderboard with the query keywords themselves so the
/// caller always has something to show; capped at six entries.
#[must_use]
pub fn with_fillers(mut leaders: Vec<Leader>, keywords: &[String]) -> Vec<Leader> {
    if leaders.len() >= MIN_LEADERS_BEFORE_FILLERS {
        return leaders;
    }
    for keyword in keywords {
        let Some(mapped) = map_entity(keyword) else {
            continue;
        };
        if leaders.iter().any(|l| l.entity == mapped.entity) {
            continue;
        }
        leaders.push(Leader {
            entity: mapped.entity,
            entity_type: mapped.kind,
            volume: 0.0,
            trend: 0.0,
            fresh: 0.0,
            score: 0.1,
            urls: Vec::new(),
        });
    }
    leaders.truncate(FILLED_LEADER_CAP);
    leaders
}

/// Render the top leaders as display bullets.
#[must_use]
pub fn rising_bullets(leaders: &[Leader]) -> Vec<String> {
    leaders
        .iter()
        .take(RISING_BULLETS)
        .map(|leader| {
            let mut meta = Vec::new();
            if leader.trend != 0.0 {
                meta.push(format!("trend {:.0}%", leader.trend * 100.0));
            }
            if leader.volume != 0.0 {
                meta.push(format!("vol {:.0}", leader.volume));
            }
            if meta.is_empty() {
                format!("\u{2022} {} \u{2013} {}", leader.entity, leader.entity_type)
            } else {
                format!(
                    "\u{2022} {} \u{2013} {} ({})",
                    leader.entity,
                    leader.entity_type,
                    meta.join(", ")
                )
            }
        })
        .collect()
}

/// Run research for a region: fetch all connectors per keyword
/// (concurrently, join before continuing), ingest the hits as signals,
/// aggregate leaders, and persist the run plus its evidence.
///
/// # Errors
///
/// Returns [`EngineError::Db`] on storage failures. Connector failures are
/// logged and contribute zero hits.
pub async fn run_research(
    pool: &PgPool,
    connectors: &Connectors,
    region: &str,
    keywords: &[String],
    window_days: u32,
) -> Result<ResearchOutcome, EngineError> {
    let keywords: Vec<String> = if keywords.is_empty() {
        DEFAULT_KEYWORDS.iter().map(|k| (*k).to_string()).collect()
    } else {
        keywords.to_vec()
    };

    let geos = geo_for_region(region);
    let region_code = if geos.len() == 1 { Some(geos[0].clone()) } else { None };
    let short_window = window_days.min(SHORT_WINDOW_DAYS);

    let mut all_hits: Vec<MappedHit> = Vec::new();
    let mut counts = SourceCounts::default();

    for keyword in &keywords {
        // Fan out all four sources for this keyword and join before
        // continuing; no partial results are scored early.
        let (trends, youtube, gdelt, reddit) = tokio::join!(
            connectors.fetch_trends(keyword, region, window_days),
            connectors.fetch_youtube(keyword, short_window, region_code.as_deref()),
            connectors.fetch_gdelt(keyword, window_days),
            connectors.fetch_reddit(keyword, short_window),
        );

        let trends = absorb(trends, keyword, "trends");
        let youtube = absorb(youtube, keyword, "youtube");
        let gdelt = absorb(gdelt, keyword, "gdelt");
        let reddit = absorb(reddit, keyword, "reddit");

        counts.trends += trends.len();
        counts.youtube += youtube.len();
        counts.gdelt += gdelt.len();
        counts.reddit += reddit.len();

        let mut hits = trends;
        hits.extend(youtube);
        hits.extend(gdelt);
        hits.extend(reddit);

        ingest_hits(pool, &hits, keyword).await?;

        for hit in hits {
            let raw_entity = hit
                .entity_raw
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| keyword.clone());
            let mapped = map_entity(&raw_entity);
            let score = score_hit(&hit);
            all_hits.push(MappedHit { hit, mapped, score });
        }
    }

    let leaders = with_fillers(aggregate_leaders(&all_hits), &keywords);
    let rising = rising_bullets(&leaders);

    let content = serde_json::json!({
        "rising": rising,
        "sourceCounts": counts,
    });
    let run_id =
        insert_run_with_hits(pool, region, &keywords, content, &all_hits).await?;

    let citations = leaders
        .iter()
        .take(RISING_BULLETS)
        .flat_map(|leader| {
            leader.urls.iter().map(|url| Citation {
                entity: leader.entity.clone(),
                url: url.clone(),
            })
        })
        .collect();

    let mut leaders = leaders;
    leaders.truncate(LEADER_LIMIT);

    tracing::info!(
        region,
        keywords = keywords.len(),
        leaders = leaders.len(),
        trends = counts.trends,
        youtube = counts.youtube,
        gdelt = counts.gdelt,
        reddit = counts.reddit,
        "research run complete"
    );

    Ok(ResearchOutcome {
        region: region.to_string(),
        keywords,
        leaders,
        rising,
        source_counts: counts,
        citations,
        run_id,
    })
}

fn absorb(
    result: Result<Vec<RawHit>, trendlens_connectors::ConnectorError>,
    keyword: &str,
    source: &str,
) -> Vec<RawHit> {
    match result {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!(keyword, source, error = %e, "connector failed; counting zero hits");
            Vec::new()
        }
    }
}

async fn insert_run_with_hits(
    pool: &PgPool,
    region: &str,
    keywords: &[String],
    content: Value,
    hits: &[MappedHit],
) -> Result<i64, EngineError> {
    let run_id = trendlens_db::insert_research_run(
        pool,
        region,
        serde_json::json!(keywords),
        content,
        "done",
    )
    .await?;

    let now = chrono::Utc::now().to_rfc3339();
    for mapped_hit in hits {
        let (entity_mapped, entity_type) = match &mapped_hit.mapped {
            Some(mapped) => (mapped.entity.clone(), mapped.kind.as_str().to_string()),
            None => (String::new(), EntityType::Topic.as_str().to_string()),
        };
        let hit = &mapped_hit.hit;
        trendlens_db::insert_research_hit(
            pool,
            run_id,
            &trendlens_db::NewResearchHit {
                source: hit.source.clone(),
                entity_raw: hit.entity_raw.clone().unwrap_or_default(),
                entity_mapped,
                entity_type,
                ts_iso: hit.ts_iso.clone().unwrap_or_else(|| now.clone()),
                volume: hit.volume,
                trend: hit.trend,
                fresh: hit.fresh,
                score: mapped_hit.score,
                url: hit.url.clone(),
                metadata: hit.metadata.clone(),
            },
        )
        .await?;
    }

    Ok(run_id)
}
