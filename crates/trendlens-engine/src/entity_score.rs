//! Uploaded-dataset entity scoring — the second instance of the
//! normalize → weight → score pattern.
//!
//! Operates on parsed social-post batches instead of connector signals:
//! per (entity, type, week, region) it aggregates post count, summed
//! engagement, and median engagement rate, scores the current week against
//! that key's stored history, and upserts one row per key.

use std::collections::BTreeMap;

use serde::Deserialize;
use sqlx::PgPool;

use trendlens_core::{color_terms, day_from_iso, iso_week_str, item_terms, EntityType};
use trendlens_db::NewEntityScore;

use crate::error::EngineError;
use crate::stats::z_or_minmax;

/// Post-count growth factor over the previous week that earns the
/// breakout bonus.
const BONUS_GROWTH_FACTOR: f64 = 1.3;

const NORDIC_COUNTRIES: &[&str] = &["SE", "NO", "DK", "FI", "IS"];

/// One parsed social post from an uploaded dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub author_followers: i64,
    pub ts_iso: String,
    #[serde(default)]
    pub text: String,
    /// Pipe-separated hashtag list, e.g. `#trenchcoat|#ootd`.
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub share_count: i64,
    #[serde(default)]
    pub save_count: i64,
    #[serde(default)]
    pub geo_country: Option<String>,
}

/// Weekly aggregate for one (entity, type, week, region) key.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityWeekAggregate {
    pub entity: String,
    pub kind: EntityType,
    pub week: String,
    pub region: String,
    pub posts: i64,
    pub eng_sum: i64,
    pub eng_rate_median: f64,
}

/// A prior week of stored history for a key.
#[derive(Debug, Clone)]
pub struct HistoryPoint {
    pub week: String,
    pub posts: f64,
    pub eng_sum: f64,
    pub eng_rate_median: f64,
}

fn normalize_hashtags(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty() && *tag != "#")
        .map(|tag| {
            if tag.starts_with('#') {
                tag
            } else {
                format!("#{tag}")
            }
        })
        .collect()
}

/// Entities a post mentions: its hashtags, plus any tracked color or item
/// appearing as a whole word in the text. Deduplicated, first occurrence
/// order.
#[must_use]
pub fn extract_entities(post: &PostRecord) -> Vec<(String, EntityType)> {
    let mut seen = std::collections::HashSet::new();
    let mut entities = Vec::new();

    for tag in normalize_hashtags(&post.hashtags) {
        if seen.insert(tag.clone()) {
            entities.push((tag, EntityType::Hashtag));
        }
    }

    let text = post.text.to_lowercase();
    let words: std::collections::HashSet<&str> = text
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
        .filter(|w| !w.is_empty())
        .collect();

    for color in color_terms() {
        if words.contains(color) && seen.insert((*color).to_string()) {
            entities.push(((*color).to_string(), EntityType::Color));
        }
    }
    for item in item_terms() {
        if words.contains(item) && seen.insert((*item).to_string()) {
            entities.push(((*item).to_string(), EntityType::Item));
        }
    }

    entities
}

/// Map a post's country code onto a tracked region.
#[must_use]
pub fn region_from_country(country: Option<&str>) -> String {
    let cc = country.unwrap_or_default().to_uppercase();
    if NORDIC_COUNTRIES.contains(&cc.as_str()) {
        "Nordics".to_string()
    } else if cc == "FR" {
        "FR".to_string()
    } else {
        "Other".to_string()
    }
}

/// Aggregate a post batch per (entity, type, week, region).
///
/// Engagement is likes + comments + shares + saves; the engagement rate
/// divides by the author's follower count (floored to 1). The median is
/// the upper median of the sorted per-post rates. Posts with an
/// unparseable timestamp are skipped.
#[must_use]
pub fn aggregate_posts(posts: &[PostRecord]) -> Vec<EntityWeekAggregate> {
    struct Group {
        posts: i64,
        eng_sum: i64,
        eng_rates: Vec<f64>,
    }

    let mut groups: BTreeMap<(String, &'static str, String, String), Group> = BTreeMap::new();

    for post in posts {
        let Some(day) = day_from_iso(&post.ts_iso) else {
            tracing::debug!(ts = %post.ts_iso, "skipping post with unparseable timestamp");
            continue;
        };
        let week = iso_week_str(day);
        let region = region_from_country(post.geo_country.as_deref());

        let engagement = post.like_count + post.comment_count + post.share_count + post.save_count;
        #[allow(clippy::cast_precision_loss)]
        let eng_rate = engagement as f64 / post.author_followers.max(1) as f64;

        for (entity, kind) in extract_entities(post) {
            let group = groups
                .entry((entity, kind.as_str(), week.clone(), region.clone()))
                .or_insert(Group {
                    posts: 0,
                    eng_sum: 0,
                    eng_rates: Vec::new(),
                });
            group.posts += 1;
            group.eng_sum += engagement;
            group.eng_rates.push(eng_rate);
        }
    }

    groups
        .into_iter()
        .map(|((entity, kind, week, region), mut group)| {
            group
                .eng_rates
                .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let median = group.eng_rates[group.eng_rates.len() / 2];
            EntityWeekAggregate {
                entity,
                kind: match kind {
                    "hashtag" => EntityType::Hashtag,
                    "color" => EntityType::Color,
                    _ => EntityType::Item,
                },
                week,
                region,
                posts: group.posts,
                eng_sum: group.eng_sum,
                eng_rate_median: median,
            }
        })
        .collect()
}

/// Score one aggregate against its key's history.
///
/// `history` may include the aggregate's own week (reruns); it is
/// excluded from the baseline. Returns `(score, growth)` where growth is
/// `None` when no prior week exists.
#[must_use]
pub fn score_entity_week(
    history: &[HistoryPoint],
    agg: &EntityWeekAggregate,
) -> (f64, Option<f64>) {
    let hist: Vec<&HistoryPoint> = history.iter().filter(|p| p.week != agg.week).collect();

    let prev = hist
        .iter()
        .max_by(|a, b| a.week.cmp(&b.week))
        .map(|p| (*p).clone());

    let vols: Vec<f64> = hist.iter().map(|p| p.posts).collect();
    let engs: Vec<f64> = hist.iter().map(|p| p.eng_sum).collect();
    let vels: Vec<f64> = hist.iter().map(|p| p.eng_rate_median).collect();

    #[allow(clippy::cast_precision_loss)]
    let posts = agg.posts as f64;
    #[allow(clippy::cast_precision_loss)]
    let eng_sum = agg.eng_sum as f64;

    let bonus = match &prev {
        Some(prev) if posts > BONUS_GROWTH_FACTOR * prev.posts => 1.0,
        _ => 0.0,
    };

    let score = z_or_minmax(&vols, posts)
        + 0.5 * z_or_minmax(&engs, eng_sum)
        + 0.5 * z_or_minmax(&vels, agg.eng_rate_median)
        + bonus;

    let growth = prev.map(|prev| posts / prev.posts.max(1.0));

    (score, growth)
}

/// Aggregate, score, and upsert one uploaded post batch. Returns the rows
/// that were written.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if a history read or upsert fails.
pub async fn score_post_batch(
    pool: &PgPool,
    posts: &[PostRecord],
) -> Result<Vec<NewEntityScore>, EngineError> {
    let aggregates = aggregate_posts(posts);
    let mut written = Vec::with_capacity(aggregates.len());

    for agg in aggregates {
        let history: Vec<HistoryPoint> =
            trendlens_db::list_entity_history(pool, &agg.entity, agg.kind.as_str(), &agg.region)
                .await?
                .into_iter()
                .map(|row| {
                    #[allow(clippy::cast_precision_loss)]
                    let posts = row.posts as f64;
                    #[allow(clippy::cast_precision_loss)]
                    let eng_sum = row.eng_sum as f64;
                    HistoryPoint {
                        week: row.week,
                        posts,
                        eng_sum,
                        eng_rate_median: row.eng_rate_median,
                    }
                })
                .collect();

        let (score, growth) = score_entity_week(&history, &agg);

        let new_score = NewEntityScore {
            entity: agg.entity,
            entity_type: agg.kind.as_str().to_string(),
            week: agg.week,
            region: agg.region,
            posts: agg.posts,
            eng_sum: agg.eng_sum,
            eng_rate_median: agg.eng_rate_median,
            score,
            growth,
        };
        trendlens_db::upsert_entity_score(pool, &new_score).await?;
        written.push(new_score);
    }

    tracing::info!(rows = written.len(), "scored uploaded post batch");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str, hashtags: &str, likes: i64, followers: i64, country: &str) -> PostRecord {
        PostRecord {
            author_followers: followers,
            ts_iso: "2024-04-25T10:00:00Z".to_string(),
            text: text.to_string(),
            hashtags: hashtags.to_string(),
            like_count: likes,
            comment_count: 0,
            share_count: 0,
            save_count: 0,
            geo_country: Some(country.to_string()),
        }
    }

    fn history(points: &[(&str, f64)]) -> Vec<HistoryPoint> {
        points
            .iter()
            .map(|(week, posts)| HistoryPoint {
                week: (*week).to_string(),
                posts: *posts,
                eng_sum: 0.0,
                eng_rate_median: 0.0,
            })
            .collect()
    }

    fn aggregate(week: &str, posts: i64) -> EntityWeekAggregate {
        EntityWeekAggregate {
            entity: "#trenchcoat".to_string(),
            kind: EntityType::Hashtag,
            week: week.to_string(),
            region: "Nordics".to_string(),
            posts,
            eng_sum: 0,
            eng_rate_median: 0.0,
        }
    }

    #[test]
    fn hashtags_gain_prefix_and_lowercase() {
        let p = post("", "TrenchCoat|#OOTD | ", 0, 1, "SE");
        let entities = extract_entities(&p);
        let names: Vec<&str> = entities.iter().map(|(e, _)| e.as_str()).collect();
        assert_eq!(names, vec!["#trenchcoat", "#ootd"]);
        assert!(entities.iter().all(|(_, k)| *k == EntityType::Hashtag));
    }

    #[test]
    fn text_entities_match_whole_words_only() {
        // "trenchcoat" is in the item vocabulary as its own word; it must
        // not additionally match the substring "trench".
        let p = post("love this beige trenchcoat", "", 0, 1, "SE");
        let entities = extract_entities(&p);
        assert!(entities.contains(&("beige".to_string(), EntityType::Color)));
        assert!(entities.contains(&("trenchcoat".to_string(), EntityType::Item)));
        assert!(!entities.iter().any(|(e, _)| e == "trench"));
    }

    #[test]
    fn regions_map_from_country_codes() {
        assert_eq!(region_from_country(Some("se")), "Nordics");
        assert_eq!(region_from_country(Some("IS")), "Nordics");
        assert_eq!(region_from_country(Some("FR")), "FR");
        assert_eq!(region_from_country(Some("US")), "Other");
        assert_eq!(region_from_country(None), "Other");
    }

    #[test]
    fn aggregates_count_posts_and_sum_engagement() {
        let posts = vec![
            post("beige look", "", 10, 100, "SE"),
            post("beige again", "", 30, 100, "NO"),
        ];
        let aggs = aggregate_posts(&posts);
        assert_eq!(aggs.len(), 1);
        let agg = &aggs[0];
        assert_eq!(agg.entity, "beige");
        assert_eq!(agg.kind, EntityType::Color);
        assert_eq!(agg.region, "Nordics");
        assert_eq!(agg.week, "2024-W17");
        assert_eq!(agg.posts, 2);
        assert_eq!(agg.eng_sum, 40);
    }

    #[test]
    fn median_is_the_upper_median_of_sorted_rates() {
        // Rates: 0.1, 0.2, 0.3, 0.4 → index 4/2 = 2 → 0.3.
        let posts = vec![
            post("beige", "", 10, 100, "SE"),
            post("beige", "", 20, 100, "SE"),
            post("beige", "", 30, 100, "SE"),
            post("beige", "", 40, 100, "SE"),
        ];
        let aggs = aggregate_posts(&posts);
        assert!((aggs[0].eng_rate_median - 0.3).abs() < 1e-12);
    }

    #[test]
    fn unparseable_timestamps_are_skipped() {
        let mut p = post("beige", "", 10, 100, "SE");
        p.ts_iso = "whenever".to_string();
        assert!(aggregate_posts(&[p]).is_empty());
    }

    #[test]
    fn bonus_requires_strictly_more_than_the_growth_factor() {
        let hist = history(&[("2024-W16", 10.0)]);

        // 13 = 1.3 × 10 exactly: no bonus.
        let (score_at, _) = score_entity_week(&hist, &aggregate("2024-W17", 13));
        // 14 > 1.3 × 10: bonus applies.
        let (score_above, _) = score_entity_week(&hist, &aggregate("2024-W17", 14));
        assert!(
            score_above > score_at + 0.9,
            "bonus should add a full point: {score_at} vs {score_above}"
        );
    }

    #[test]
    fn growth_is_none_without_a_prior_week() {
        let (_, growth) = score_entity_week(&[], &aggregate("2024-W17", 5));
        assert!(growth.is_none());
    }

    #[test]
    fn growth_divides_by_previous_posts() {
        let hist = history(&[("2024-W15", 4.0), ("2024-W16", 8.0)]);
        let (_, growth) = score_entity_week(&hist, &aggregate("2024-W17", 12));
        // Previous week is W16 with 8 posts.
        assert!((growth.expect("growth") - 1.5).abs() < 1e-12);
    }

    #[test]
    fn own_week_is_excluded_from_the_baseline() {
        // A rerun sees its own earlier row; the baseline must ignore it.
        let hist = history(&[("2024-W16", 10.0), ("2024-W17", 999.0)]);
        let (_, growth) = score_entity_week(&hist, &aggregate("2024-W17", 20));
        assert!((growth.expect("growth") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn thin_history_scores_via_minmax() {
        // 1 historical point → min-max path: posts 20 vs history [10]
        // scales to 1.0; the engagement components are degenerate zeros.
        let hist = history(&[("2024-W16", 10.0)]);
        let (score, _) = score_entity_week(&hist, &aggregate("2024-W17", 20));
        // min-max(posts)=1.0 + 0 + 0 + bonus(20 > 13)=1.0
        assert!((score - 2.0).abs() < 1e-12);
    }
}
