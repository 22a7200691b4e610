//! Seed entity catalog
//!
//! The fixed map of seed entities to their staging tables and expected CSV
//! column lists. The column lists must match the generator output exactly,
//! in order; ingestion validates the file header against them before any
//! row is streamed.

use std::path::PathBuf;

/// One of the five seed record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Plans,
    Providers,
    Members,
    Enrollments,
    Claims,
}

impl Entity {
    /// All entities, in load order.
    pub const ALL: [Entity; 5] = [
        Entity::Plans,
        Entity::Providers,
        Entity::Members,
        Entity::Enrollments,
        Entity::Claims,
    ];

    /// Entity name as it appears in seed file names and the ledger.
    pub fn name(self) -> &'static str {
        match self {
            Entity::Plans => "plans",
            Entity::Providers => "providers",
            Entity::Members => "members",
            Entity::Enrollments => "enrollments",
            Entity::Claims => "claims",
        }
    }

    /// Staging table name (unqualified; all staging tables live in the
    /// `staging` schema).
    pub fn table(self) -> &'static str {
        match self {
            Entity::Plans => "plans_raw",
            Entity::Providers => "providers_raw",
            Entity::Members => "members_raw",
            Entity::Enrollments => "enrollments_raw",
            Entity::Claims => "claims_raw",
        }
    }

    /// Expected CSV columns, in order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Entity::Plans => &[
                "plan_id",
                "name",
                "metal_tier",
                "monthly_premium",
                "deductible",
                "oop_max",
                "coinsurance_rate",
                "pcp_copay",
                "effective_year",
            ],
            Entity::Providers => &[
                "provider_id",
                "npi",
                "name",
                "specialty",
                "street",
                "city",
                "state",
                "zip",
                "phone",
            ],
            Entity::Members => &[
                "member_id",
                "first_name",
                "last_name",
                "dob",
                "gender",
                "email",
                "phone",
                "street",
                "city",
                "state",
                "zip",
                "fpl_ratio",
                "hios_id",
                "plan_network_access_type",
                "plan_metal",
                "age_group",
                "region",
                "enrollment_length_continuous",
                "clinical_segment",
                "general_agency_name",
                "broker_name",
                "sa_contracting_entity_name",
                "new_member_in_period",
                "member_used_app",
                "member_had_web_login",
                "member_visited_new_provider_ind",
                "high_cost_member",
                "mutually_exclusive_hcc_condition",
                "geographic_reporting",
                "year",
            ],
            Entity::Enrollments => &[
                "enrollment_id",
                "member_id",
                "plan_id",
                "start_date",
                "end_date",
                "premium_paid",
                "csr_variant",
            ],
            Entity::Claims => &[
                "claim_id",
                "member_id",
                "provider_id",
                "plan_id",
                "service_date",
                "claim_amount",
                "allowed_amount",
                "paid_amount",
                "status",
                "diagnosis_code",
                "procedure_code",
            ],
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate seed file for one entity, recomputed from filesystem state
/// each run.
#[derive(Debug, Clone)]
pub struct SeedFile {
    pub entity: Entity,
    pub path: PathBuf,
    /// Base name of the file; the ledger's idempotence key.
    pub file_name: String,
    /// 12-digit `YYYYMMDDHHMM` suffix, used only to pick the latest
    /// candidate per entity.
    pub timestamp: String,
}

/// Extract the 12-digit timestamp from a seed file name for the given
/// entity, e.g. `members_202401011230.csv`.
///
/// Returns `None` when the name does not belong to the entity or the
/// timestamp suffix does not parse.
pub fn parse_timestamp(file_name: &str, entity: Entity) -> Option<String> {
    let stem = file_name.strip_suffix(".csv")?;
    let rest = stem.strip_prefix(entity.name())?;
    let rest = rest.strip_prefix('_')?;
    // The timestamp is the segment after the last underscore.
    let ts = rest.rsplit('_').next()?;
    if ts.len() == 12 && ts.bytes().all(|b| b.is_ascii_digit()) {
        Some(ts.to_string())
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(Entity::Plans.table(), "plans_raw");
        assert_eq!(Entity::Claims.table(), "claims_raw");
    }

    #[test]
    fn test_column_counts() {
        assert_eq!(Entity::Plans.columns().len(), 9);
        assert_eq!(Entity::Providers.columns().len(), 9);
        assert_eq!(Entity::Members.columns().len(), 30);
        assert_eq!(Entity::Enrollments.columns().len(), 7);
        assert_eq!(Entity::Claims.columns().len(), 11);
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            parse_timestamp("members_202401011230.csv", Entity::Members),
            Some("202401011230".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp_wrong_entity() {
        assert_eq!(parse_timestamp("members_202401011230.csv", Entity::Plans), None);
    }

    #[test]
    fn test_parse_timestamp_bad_suffix() {
        assert_eq!(parse_timestamp("members_20240101.csv", Entity::Members), None);
        assert_eq!(parse_timestamp("members_notadate1230.csv", Entity::Members), None);
        assert_eq!(parse_timestamp("members.csv", Entity::Members), None);
    }

    #[test]
    fn test_parse_timestamp_extra_segment() {
        // Timestamp is taken from the last underscore-delimited segment.
        assert_eq!(
            parse_timestamp("members_backfill_202401011230.csv", Entity::Members),
            Some("202401011230".to_string())
        );
    }
}
