//! Voice-actor join for resolved characters.

use std::collections::BTreeSet;

use super::VndbClient;
use crate::models::{
    CharacterRecord, FilterExpr, QueryRequest, ResponsePage, VnCreditRecord, UNRECORDED,
    VA_FIELDS,
};
use crate::sources::SourceError;

/// Distinct voice-actor names credited for `character_id`.
///
/// Credits for other characters in the same VNs are ignored. The original
/// script name is preferred over the display name. Returns the
/// [`UNRECORDED`] marker alone when nothing matches.
pub fn collect_voice_actors(character_id: &str, vns: &[VnCreditRecord]) -> Vec<String> {
    let names: BTreeSet<&str> = vns
        .iter()
        .flat_map(|vn| vn.va.iter())
        .filter(|credit| credit.character.id == character_id)
        .map(|credit| credit.staff.preferred_name())
        .collect();

    if names.is_empty() {
        return vec![UNRECORDED.to_string()];
    }
    names.into_iter().map(str::to_string).collect()
}

impl VndbClient {
    /// Fetch voice-actor credits for `character_id` and attach them to `record`.
    ///
    /// `record` is consumed and only returned once the join has succeeded.
    pub async fn enrich(
        &self,
        character_id: &str,
        mut record: CharacterRecord,
    ) -> Result<CharacterRecord, SourceError> {
        let filters = FilterExpr::eq("character", FilterExpr::eq("id", character_id));
        let request = QueryRequest::new(filters, VA_FIELDS.iter().copied())
            .results_limit(self.config.results_limit);

        let page: ResponsePage<VnCreditRecord> = self.query("/vn", &request).await?;
        if page.more {
            tracing::debug!(
                character_id,
                fetched = page.results.len(),
                "voice-actor credits truncated to the first page"
            );
        }
        let voice_actors = collect_voice_actors(character_id, &page.results);
        tracing::debug!(character_id, count = voice_actors.len(), "joined voice actors");

        record.voice_actors = voice_actors;
        Ok(record)
    }
}
