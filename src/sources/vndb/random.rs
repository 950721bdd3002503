//! Random character sampling.
//!
//! Instead of an OFFSET-based pick, each attempt draws a random id floor in
//! `[0, total characters)` and asks for the first qualifying character at or
//! above it. Sparse id ranges simply miss and trigger another draw.

use rand::Rng;

use super::VndbClient;
use crate::models::{CharacterRecord, FilterExpr};
use crate::sources::SourceError;

/// Which character roles are eligible for sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleGroup {
    /// `main` or `primary`
    #[default]
    Main,
    /// `side` or `appear`
    Side,
}

impl RoleGroup {
    /// Parse a user-supplied selector.
    ///
    /// Unrecognised selectors fall back to [`RoleGroup::Main`].
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "2" | "side" => RoleGroup::Side,
            _ => RoleGroup::Main,
        }
    }

    fn roles(&self) -> [&'static str; 2] {
        match self {
            RoleGroup::Main => ["main", "primary"],
            RoleGroup::Side => ["side", "appear"],
        }
    }

    /// `["or", ["role", "=", a], ["role", "=", b]]`
    pub fn filter(&self) -> Result<FilterExpr, SourceError> {
        FilterExpr::or(self.roles().map(|role| FilterExpr::eq("role", role)))
    }
}

/// Draw an id floor in `[0, total)`; an empty database always yields 0.
fn draw_floor(total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    rand::rng().random_range(0..total)
}

impl VndbClient {
    /// Characters whose VNs meet the configured vote count and rating
    fn quality_filter(&self) -> Result<FilterExpr, SourceError> {
        Ok(FilterExpr::eq(
            "vn",
            FilterExpr::and([
                FilterExpr::ge("votecount", self.sampler.min_votecount.to_string()),
                FilterExpr::ge("rating", self.sampler.min_rating.to_string()),
            ])?,
        ))
    }

    /// Full sampling filter for one attempt
    pub(crate) fn sample_filter(
        &self,
        role_group: RoleGroup,
        floor: u64,
    ) -> Result<FilterExpr, SourceError> {
        let id_filter = FilterExpr::and([
            FilterExpr::ge("id", format!("c{}", floor)),
            FilterExpr::eq(
                "vn",
                FilterExpr::ge("votecount", self.sampler.floor_votecount.to_string()),
            ),
        ])?;
        FilterExpr::and([self.quality_filter()?, role_group.filter()?, id_filter])
    }

    /// Pick an arbitrary well-rated character in `role_group`.
    ///
    /// Makes at most `sampler.attempts` tries. Only [`SourceError::NoContent`]
    /// triggers another draw; any other error ends sampling immediately.
    pub async fn sample_random(
        &self,
        role_group: RoleGroup,
    ) -> Result<CharacterRecord, SourceError> {
        let total = self.stats().await?.chars;

        for attempt in 1..=self.sampler.attempts {
            let floor = draw_floor(total);
            let filters = self.sample_filter(role_group, floor)?;

            match self.resolve(filters, None, 1).await {
                Ok(record) => return Ok(record),
                Err(SourceError::NoContent) => {
                    tracing::debug!(attempt, floor, "no character above random floor, redrawing");
                }
                Err(err) => return Err(err),
            }
        }

        Err(SourceError::NoContent)
    }
}
