//! PostgreSQL storage adapters
//!
//! Tables: `menu_items` (catalog + rolling statistics) and
//! `food_interactions` (append-only interaction log). Queries are built at
//! runtime so the attribute filters stay expressible without a fixed set
//! of prepared statements.

use super::{
    AvailabilityFilter, Catalog, InteractionQuery, InteractionStore, ItemFilter, ItemSort,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dining_gateway_core::error::DiningGatewayError;
use dining_gateway_core::models::{Interaction, ItemStats, MenuItem};
use dining_gateway_core::types::{DietaryTag, InteractionKind, SpiceLevel};
use dining_gateway_core::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const ITEM_COLUMNS: &str = "id, name, description, price_cents, category, cuisine, spice_level, \
     dietary_tags, preparation_minutes, availability, average_rating, total_ratings, \
     popularity_score, created_at, updated_at";

fn spice_to_str(level: SpiceLevel) -> &'static str {
    match level {
        SpiceLevel::Mild => "mild",
        SpiceLevel::Medium => "medium",
        SpiceLevel::Hot => "hot",
        SpiceLevel::VeryHot => "very_hot",
    }
}

fn spice_from_str(value: &str) -> SpiceLevel {
    match value {
        "mild" => SpiceLevel::Mild,
        "hot" => SpiceLevel::Hot,
        "very_hot" => SpiceLevel::VeryHot,
        _ => SpiceLevel::Medium,
    }
}

fn tag_to_str(tag: DietaryTag) -> &'static str {
    match tag {
        DietaryTag::Vegetarian => "vegetarian",
        DietaryTag::Vegan => "vegan",
        DietaryTag::Halal => "halal",
        DietaryTag::GlutenFree => "gluten_free",
        DietaryTag::DairyFree => "dairy_free",
    }
}

fn tag_from_str(value: &str) -> Option<DietaryTag> {
    match value {
        "vegetarian" => Some(DietaryTag::Vegetarian),
        "vegan" => Some(DietaryTag::Vegan),
        "halal" => Some(DietaryTag::Halal),
        "gluten_free" => Some(DietaryTag::GlutenFree),
        "dairy_free" => Some(DietaryTag::DairyFree),
        _ => None,
    }
}

fn kind_to_str(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::View => "view",
        InteractionKind::Order => "order",
        InteractionKind::Rating => "rating",
        InteractionKind::Favorite => "favorite",
    }
}

fn kind_from_str(value: &str) -> Option<InteractionKind> {
    match value {
        "view" => Some(InteractionKind::View),
        "order" => Some(InteractionKind::Order),
        "rating" => Some(InteractionKind::Rating),
        "favorite" => Some(InteractionKind::Favorite),
        _ => None,
    }
}

fn row_to_item(row: &PgRow) -> Result<MenuItem> {
    let spice: String = row.try_get("spice_level")?;
    let tags: Vec<String> = row.try_get("dietary_tags")?;
    let preparation: i32 = row.try_get("preparation_minutes")?;
    let total_ratings: i32 = row.try_get("total_ratings")?;

    Ok(MenuItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price_cents: row.try_get("price_cents")?,
        category: row.try_get("category")?,
        cuisine: row.try_get("cuisine")?,
        spice_level: spice_from_str(&spice),
        dietary_tags: tags.iter().filter_map(|tag| tag_from_str(tag)).collect(),
        preparation_minutes: preparation.max(0) as u32,
        availability: row.try_get("availability")?,
        average_rating: row.try_get("average_rating")?,
        total_ratings: total_ratings.max(0) as u32,
        popularity_score: row.try_get("popularity_score")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_interaction(row: &PgRow) -> Result<Option<Interaction>> {
    let kind: String = row.try_get("kind")?;
    let Some(kind) = kind_from_str(&kind) else {
        // Unknown kinds written by newer schema revisions are skipped
        return Ok(None);
    };
    let rating: Option<i16> = row.try_get("rating")?;
    let order_quantity: i32 = row.try_get("order_quantity")?;
    let timestamp: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Some(Interaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        item_id: row.try_get("item_id")?,
        kind,
        rating: rating.map(|r| r.clamp(0, u8::MAX as i16) as u8),
        order_quantity: order_quantity.max(1) as u32,
        timestamp,
    }))
}

fn push_item_filters(builder: &mut QueryBuilder<Postgres>, filter: &ItemFilter) {
    match filter.availability {
        AvailabilityFilter::Strict => {
            builder.push(" AND availability = TRUE");
        }
        AvailabilityFilter::Loose => {
            builder.push(" AND availability IS DISTINCT FROM FALSE");
        }
        AvailabilityFilter::Any => {}
    }
    if let Some(ref cuisines) = filter.cuisines {
        builder
            .push(" AND cuisine = ANY(")
            .push_bind(cuisines.clone())
            .push(")");
    }
    if let Some(ref categories) = filter.categories {
        builder
            .push(" AND category = ANY(")
            .push_bind(categories.clone())
            .push(")");
    }
    if let Some(ref spice_levels) = filter.spice_levels {
        let values: Vec<String> = spice_levels
            .iter()
            .map(|level| spice_to_str(*level).to_string())
            .collect();
        builder
            .push(" AND spice_level = ANY(")
            .push_bind(values)
            .push(")");
    }
    if let Some(ref dietary_tags) = filter.dietary_tags {
        let values: Vec<String> = dietary_tags
            .iter()
            .map(|tag| tag_to_str(*tag).to_string())
            .collect();
        builder.push(" AND dietary_tags && ").push_bind(values);
    }
}

fn push_item_order(builder: &mut QueryBuilder<Postgres>, sort: ItemSort) {
    builder.push(match sort {
        ItemSort::Popularity => {
            " ORDER BY popularity_score DESC, average_rating DESC, total_ratings DESC"
        }
        ItemSort::Rating => " ORDER BY average_rating DESC, total_ratings DESC",
        ItemSort::RatingRecency => " ORDER BY average_rating DESC, created_at DESC",
    });
}

fn push_interaction_filters(builder: &mut QueryBuilder<Postgres>, query: &InteractionQuery) {
    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(excluded) = query.exclude_user {
        builder.push(" AND user_id <> ").push_bind(excluded);
    }
    if let Some(item_id) = query.item_id {
        builder.push(" AND item_id = ").push_bind(item_id);
    }
    if let Some(kind) = query.kind {
        builder.push(" AND kind = ").push_bind(kind_to_str(kind));
    }
    if query.rated_only {
        builder.push(" AND rating IS NOT NULL");
    }
    if let Some((low, high)) = query.rating_range {
        builder.push(" AND rating >= ").push_bind(low as f64);
        builder.push(" AND rating <= ").push_bind(high as f64);
    }
    if let Some(since) = query.since {
        builder.push(" AND created_at >= ").push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND created_at < ").push_bind(until);
    }
}

/// PostgreSQL-backed menu catalog
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<MenuItem>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items WHERE 1 = 1"
        ));
        push_item_filters(&mut builder, filter);
        push_item_order(&mut builder, filter.sort);
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_item).collect()
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<MenuItem>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn find_items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MenuItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = ANY($1)"
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn count_available(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM menu_items WHERE availability = TRUE")
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }

    async fn update_item_stats(&self, id: Uuid, stats: ItemStats) -> Result<()> {
        let result = sqlx::query(
            "UPDATE menu_items \
             SET average_rating = $2, total_ratings = $3, popularity_score = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(stats.average_rating)
        .bind(stats.total_ratings as i32)
        .bind(stats.popularity_score)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DiningGatewayError::not_found("menu item"));
        }
        Ok(())
    }

    async fn apply_rating(&self, id: Uuid, rating: u8) -> Result<ItemStats> {
        // Single statement keeps the read-modify-write atomic per item
        let row = sqlx::query(
            "UPDATE menu_items \
             SET average_rating = (average_rating * total_ratings + $2) / (total_ratings + 1), \
                 total_ratings = total_ratings + 1, \
                 popularity_score = ((average_rating * total_ratings + $2) / (total_ratings + 1)) \
                     * ln(total_ratings + 2), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING average_rating, total_ratings, popularity_score",
        )
        .bind(id)
        .bind(rating as f32)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DiningGatewayError::not_found("menu item"))?;

        let total_ratings: i32 = row.try_get("total_ratings")?;
        Ok(ItemStats {
            average_rating: row.try_get("average_rating")?,
            total_ratings: total_ratings.max(0) as u32,
            popularity_score: row.try_get("popularity_score")?,
        })
    }
}

/// PostgreSQL-backed interaction log
#[derive(Clone)]
pub struct PgInteractionStore {
    pool: PgPool,
}

impl PgInteractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionStore for PgInteractionStore {
    async fn append(&self, interaction: Interaction) -> Result<()> {
        sqlx::query(
            "INSERT INTO food_interactions \
             (id, user_id, item_id, kind, rating, order_quantity, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(interaction.id)
        .bind(interaction.user_id)
        .bind(interaction.item_id)
        .bind(kind_to_str(interaction.kind))
        .bind(interaction.rating.map(|r| r as i16))
        .bind(interaction.order_quantity as i32)
        .bind(interaction.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(&self, query: &InteractionQuery) -> Result<Vec<Interaction>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, user_id, item_id, kind, rating, order_quantity, created_at \
             FROM food_interactions WHERE 1 = 1",
        );
        push_interaction_filters(&mut builder, query);
        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut interactions = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(interaction) = row_to_interaction(row)? {
                interactions.push(interaction);
            }
        }
        Ok(interactions)
    }

    async fn count(&self, query: &InteractionQuery) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) AS total FROM food_interactions WHERE 1 = 1",
        );
        push_interaction_filters(&mut builder, query);

        let row = builder.build().fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }

    async fn distinct_users(&self, query: &InteractionQuery) -> Result<Vec<Uuid>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT DISTINCT user_id FROM food_interactions WHERE 1 = 1",
        );
        push_interaction_filters(&mut builder, query);
        builder.push(" ORDER BY user_id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<Uuid, _>("user_id").map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_string_round_trips() {
        for level in [
            SpiceLevel::Mild,
            SpiceLevel::Medium,
            SpiceLevel::Hot,
            SpiceLevel::VeryHot,
        ] {
            assert_eq!(spice_from_str(spice_to_str(level)), level);
        }
        for kind in [
            InteractionKind::View,
            InteractionKind::Order,
            InteractionKind::Rating,
            InteractionKind::Favorite,
        ] {
            assert_eq!(kind_from_str(kind_to_str(kind)), Some(kind));
        }
        assert_eq!(tag_from_str("gluten_free"), Some(DietaryTag::GlutenFree));
        assert_eq!(tag_from_str("unknown"), None);
    }

    #[test]
    fn test_unknown_spice_defaults_to_medium() {
        assert_eq!(spice_from_str("volcanic"), SpiceLevel::Medium);
    }
}
