//! Typed records parsed from raw source rows.
//!
//! Every raw row either becomes a typed record or a [`SkippedRow`]; a bad row never fails
//! the batch. Duplicate rows for the same account are merged here, before any grant is
//! built.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use reward_core::fixed_point::add;
use reward_core::{Address, VestingSchedule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{DistributionError, RecordSource};

/// Identifies one record source, e.g. one input file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Holders,
    EarlyInvestors,
    FlightAcademy,
    Investment,
    Advisor,
    Contractor,
    Contributor,
    Test,
}

impl SourceKind {
    pub const ALL: [SourceKind; 8] = [
        SourceKind::Holders,
        SourceKind::EarlyInvestors,
        SourceKind::FlightAcademy,
        SourceKind::Investment,
        SourceKind::Advisor,
        SourceKind::Contractor,
        SourceKind::Contributor,
        SourceKind::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Holders => "holders",
            SourceKind::EarlyInvestors => "early_investors",
            SourceKind::FlightAcademy => "flight_academy",
            SourceKind::Investment => "investment",
            SourceKind::Advisor => "advisor",
            SourceKind::Contractor => "contractor",
            SourceKind::Contributor => "contributor",
            SourceKind::Test => "test",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderSnapshot {
    pub address: Address,
    pub raw_balance: u128,
    pub first_receive_timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyInvestorRecord {
    pub canonical_address: Address,
    pub legacy_address: Option<Address>,
    pub vesting_token_amount: u128,
    pub usdc_investment: u128,
    pub use_custody_exclusion: bool,
    /// First source row this record was read from.
    pub row: usize,
}

impl EarlyInvestorRecord {
    pub fn matches(&self, address: &Address) -> bool {
        self.canonical_address == *address || self.legacy_address.as_ref() == Some(address)
    }
}

/// What a participant row entitles its account to; the variant is fixed by the source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantTerms {
    /// Flight academy and contributor rows.
    Split {
        immediate_amount: u128,
        vesting_amount: u128,
    },
    /// Investment and advisor rows.
    Flat { amount: u128 },
    /// Contractor rows.
    Explicit {
        amount: u128,
        vesting: VestingSchedule,
    },
    /// Test rows; amounts come from the test policy.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub address: Address,
    pub terms: ParticipantTerms,
    pub row: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("malformed row: {message}")]
    MalformedRow { message: String },

    #[error("missing address")]
    MissingAddress,

    #[error("invalid address: {message}")]
    InvalidAddress { message: String },

    #[error("missing field {field}")]
    MissingField { field: &'static str },

    #[error("field {field} is not a non-negative integer: {value:?}")]
    InvalidAmount { field: &'static str, value: String },

    #[error("invalid vesting parameters: {message}")]
    InvalidVesting { message: String },

    #[error("custody exclusion")]
    CustodyExclusion,

    #[error("holder value ${dollar_value} is below recorded investment ${usdc_investment}")]
    BelowInvestment {
        dollar_value: String,
        usdc_investment: String,
    },
}

/// A source row that was left out of the distribution, with why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub source: SourceKind,
    pub row: usize,
    pub address: Option<String>,
    pub reason: SkipReason,
}

impl SkippedRow {
    pub fn new(
        source: SourceKind,
        row: usize,
        address: Option<String>,
        reason: SkipReason,
    ) -> Self {
        warn!(
            source = %source,
            row,
            address = address.as_deref().unwrap_or("-"),
            reason = %reason,
            "Skipping row"
        );
        Self {
            source,
            row,
            address,
            reason,
        }
    }
}

/// All records needed by the enabled categories, already merged per account.
#[derive(Debug, Clone, Default)]
pub struct Records {
    pub holders: Vec<HolderSnapshot>,
    pub early_investors: Vec<EarlyInvestorRecord>,
    pub participants: BTreeMap<SourceKind, Vec<ParticipantRecord>>,
    pub skipped: Vec<SkippedRow>,
}

impl Records {
    pub fn participants(&self, kind: SourceKind) -> &[ParticipantRecord] {
        self.participants
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// An integer cell that may be written as a JSON number or a decimal string. Numbers keep
/// their source text, so balances beyond `u64` survive intact.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
struct RawAmount(Value);

impl RawAmount {
    fn text(&self) -> String {
        match &self.0 {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHolder {
    address: Option<String>,
    raw_balance: Option<RawAmount>,
    first_receive_timestamp: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEarlyInvestor {
    #[serde(alias = "address")]
    canonical_address: Option<String>,
    legacy_address: Option<String>,
    vesting_token_amount: Option<RawAmount>,
    usdc_investment: Option<RawAmount>,
    #[serde(default)]
    use_custody_exclusion: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParticipant {
    address: Option<String>,
    amount: Option<RawAmount>,
    immediate_amount: Option<RawAmount>,
    vesting_amount: Option<RawAmount>,
    vesting_length: Option<RawAmount>,
    cliff_length: Option<RawAmount>,
    vesting_interval: Option<RawAmount>,
}

fn parse_amount(field: &'static str, raw: Option<RawAmount>) -> Result<u128, SkipReason> {
    match raw {
        None => Err(SkipReason::MissingField { field }),
        Some(raw) => {
            let text = raw.text();
            let trimmed = text.trim();
            if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
                return Err(SkipReason::InvalidAmount { field, value: text });
            }
            trimmed
                .parse()
                .map_err(|_| SkipReason::InvalidAmount { field, value: text })
        }
    }
}

fn parse_optional_amount(
    field: &'static str,
    raw: Option<RawAmount>,
) -> Result<u128, SkipReason> {
    match raw {
        None => Ok(0),
        raw => parse_amount(field, raw),
    }
}

fn parse_seconds(field: &'static str, raw: Option<RawAmount>) -> Result<u64, SkipReason> {
    let text = raw.as_ref().map(RawAmount::text).unwrap_or_default();
    let value = parse_amount(field, raw)?;
    u64::try_from(value).map_err(|_| SkipReason::InvalidAmount { field, value: text })
}

fn parse_address(raw: Option<&str>) -> Result<Address, SkipReason> {
    match raw.map(str::trim) {
        None | Some("") => Err(SkipReason::MissingAddress),
        Some(text) => text.parse().map_err(|err: reward_core::AddressError| {
            SkipReason::InvalidAddress {
                message: err.to_string(),
            }
        }),
    }
}

fn raw_address(row: &Value) -> Option<String> {
    ["address", "canonicalAddress"]
        .iter()
        .find_map(|key| row.get(key))
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
}

/// Converts each raw row with `convert`, collecting failures as skipped rows. Rows are
/// numbered from 1 in source order.
fn parse_rows<R, T>(
    kind: SourceKind,
    rows: Vec<Value>,
    skipped: &mut Vec<SkippedRow>,
    convert: impl Fn(R, usize) -> Result<T, SkipReason>,
) -> Vec<T>
where
    R: serde::de::DeserializeOwned,
{
    let mut parsed = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index + 1;
        let address = raw_address(&row);
        let result = serde_json::from_value::<R>(row)
            .map_err(|err| SkipReason::MalformedRow {
                message: err.to_string(),
            })
            .and_then(|raw| convert(raw, row_number));
        match result {
            Ok(record) => parsed.push(record),
            Err(reason) => skipped.push(SkippedRow::new(kind, row_number, address, reason)),
        }
    }
    parsed
}

fn holder_from_raw(raw: RawHolder, _row: usize) -> Result<HolderSnapshot, SkipReason> {
    Ok(HolderSnapshot {
        address: parse_address(raw.address.as_deref())?,
        raw_balance: parse_amount("rawBalance", raw.raw_balance)?,
        first_receive_timestamp: parse_seconds(
            "firstReceiveTimestamp",
            raw.first_receive_timestamp,
        )?,
    })
}

fn early_investor_from_raw(
    raw: RawEarlyInvestor,
    row: usize,
) -> Result<EarlyInvestorRecord, SkipReason> {
    let legacy_address = match raw.legacy_address.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(parse_address(Some(text))?),
    };
    Ok(EarlyInvestorRecord {
        canonical_address: parse_address(raw.canonical_address.as_deref())?,
        legacy_address,
        vesting_token_amount: parse_amount("vestingTokenAmount", raw.vesting_token_amount)?,
        usdc_investment: parse_amount("usdcInvestment", raw.usdc_investment)?,
        use_custody_exclusion: raw.use_custody_exclusion,
        row,
    })
}

fn participant_from_raw(
    kind: SourceKind,
    raw: RawParticipant,
    row: usize,
) -> Result<ParticipantRecord, SkipReason> {
    let address = parse_address(raw.address.as_deref())?;
    let terms = match kind {
        SourceKind::FlightAcademy | SourceKind::Contributor => ParticipantTerms::Split {
            immediate_amount: parse_optional_amount("immediateAmount", raw.immediate_amount)?,
            vesting_amount: parse_optional_amount("vestingAmount", raw.vesting_amount)?,
        },
        SourceKind::Investment | SourceKind::Advisor => ParticipantTerms::Flat {
            amount: parse_amount("amount", raw.amount)?,
        },
        SourceKind::Contractor => {
            let vesting = VestingSchedule::new(
                parse_seconds("vestingLength", raw.vesting_length)?,
                parse_seconds("cliffLength", raw.cliff_length)?,
                parse_seconds("vestingInterval", raw.vesting_interval)?,
            )
            .map_err(|err| SkipReason::InvalidVesting {
                message: err.to_string(),
            })?;
            ParticipantTerms::Explicit {
                amount: parse_amount("amount", raw.amount)?,
                vesting,
            }
        }
        SourceKind::Test => ParticipantTerms::Fixed,
        SourceKind::Holders | SourceKind::EarlyInvestors => {
            return Err(SkipReason::MalformedRow {
                message: format!("{kind} rows are not participant rows"),
            })
        }
    };
    Ok(ParticipantRecord {
        address,
        terms,
        row,
    })
}

/// Sums balances of duplicate snapshot rows, keeping the earliest first-receive time.
fn merge_holders(
    holders: Vec<HolderSnapshot>,
) -> Result<Vec<HolderSnapshot>, DistributionError> {
    let mut merged: IndexMap<Address, HolderSnapshot> = IndexMap::new();
    for holder in holders {
        match merged.get_mut(&holder.address) {
            Some(existing) => {
                debug!(address = %holder.address, "Merging duplicate holder snapshot");
                existing.raw_balance = add(existing.raw_balance, holder.raw_balance, "balance")
                    .map_err(DistributionError::arithmetic(SourceKind::Holders))?;
                existing.first_receive_timestamp = existing
                    .first_receive_timestamp
                    .min(holder.first_receive_timestamp);
            }
            None => {
                merged.insert(holder.address, holder);
            }
        }
    }
    Ok(merged.into_values().collect())
}

fn merge_early_investors(
    records: Vec<EarlyInvestorRecord>,
) -> Result<Vec<EarlyInvestorRecord>, DistributionError> {
    let arithmetic = || DistributionError::arithmetic(SourceKind::EarlyInvestors);
    let mut merged: IndexMap<Address, EarlyInvestorRecord> = IndexMap::new();
    for record in records {
        match merged.get_mut(&record.canonical_address) {
            Some(existing) => {
                existing.vesting_token_amount = add(
                    existing.vesting_token_amount,
                    record.vesting_token_amount,
                    "vesting token amount",
                )
                .map_err(arithmetic())?;
                existing.usdc_investment =
                    add(existing.usdc_investment, record.usdc_investment, "investment")
                        .map_err(arithmetic())?;
                existing.use_custody_exclusion |= record.use_custody_exclusion;
                if existing.legacy_address.is_none() {
                    existing.legacy_address = record.legacy_address;
                }
            }
            None => {
                merged.insert(record.canonical_address, record);
            }
        }
    }
    Ok(merged.into_values().collect())
}

fn merge_participants(
    kind: SourceKind,
    records: Vec<ParticipantRecord>,
) -> Result<Vec<ParticipantRecord>, DistributionError> {
    let arithmetic = || DistributionError::arithmetic(kind);
    let mut merged: IndexMap<Address, ParticipantRecord> = IndexMap::new();
    for record in records {
        let Some(existing) = merged.get_mut(&record.address) else {
            merged.insert(record.address, record);
            continue;
        };
        existing.terms = match (existing.terms, record.terms) {
            (
                ParticipantTerms::Split {
                    immediate_amount: a_immediate,
                    vesting_amount: a_vesting,
                },
                ParticipantTerms::Split {
                    immediate_amount: b_immediate,
                    vesting_amount: b_vesting,
                },
            ) => ParticipantTerms::Split {
                immediate_amount: add(a_immediate, b_immediate, "immediate amount")
                    .map_err(arithmetic())?,
                vesting_amount: add(a_vesting, b_vesting, "vesting amount")
                    .map_err(arithmetic())?,
            },
            (ParticipantTerms::Flat { amount: a }, ParticipantTerms::Flat { amount: b }) => {
                ParticipantTerms::Flat {
                    amount: add(a, b, "amount").map_err(arithmetic())?,
                }
            }
            (
                ParticipantTerms::Explicit {
                    amount: a,
                    vesting: a_vesting,
                },
                ParticipantTerms::Explicit {
                    amount: b,
                    vesting: b_vesting,
                },
            ) => {
                if a_vesting != b_vesting {
                    return Err(DistributionError::InconsistentRecordVesting {
                        account: record.address,
                        kind,
                    });
                }
                ParticipantTerms::Explicit {
                    amount: add(a, b, "amount").map_err(arithmetic())?,
                    vesting: a_vesting,
                }
            }
            (ParticipantTerms::Fixed, ParticipantTerms::Fixed) => ParticipantTerms::Fixed,
            (existing_terms, terms) => {
                return Err(DistributionError::Configuration(format!(
                    "{kind} records for {} mix terms {existing_terms:?} and {terms:?}",
                    record.address
                )))
            }
        };
    }
    Ok(merged.into_values().collect())
}

fn fetch_rows(
    source: &dyn RecordSource,
    kind: SourceKind,
) -> Result<Vec<Value>, DistributionError> {
    source
        .rows(kind)
        .map_err(|err| DistributionError::Source {
            kind,
            message: format!("{err:#}"),
        })?
        .ok_or(DistributionError::MissingSource(kind))
}

/// Loads and merges every source in `kinds`. A missing source is fatal; bad rows are not.
pub fn load_records(
    source: &dyn RecordSource,
    kinds: &BTreeSet<SourceKind>,
) -> Result<Records, DistributionError> {
    let mut records = Records::default();
    for kind in kinds {
        let rows = fetch_rows(source, *kind)?;
        let row_count = rows.len();
        match kind {
            SourceKind::Holders => {
                let holders = parse_rows(*kind, rows, &mut records.skipped, holder_from_raw);
                records.holders = merge_holders(holders)?;
            }
            SourceKind::EarlyInvestors => {
                let early_investors =
                    parse_rows(*kind, rows, &mut records.skipped, early_investor_from_raw);
                records.early_investors = merge_early_investors(early_investors)?;
            }
            participant_kind => {
                let participants = parse_rows(
                    *participant_kind,
                    rows,
                    &mut records.skipped,
                    |raw: RawParticipant, row| participant_from_raw(*participant_kind, raw, row),
                );
                records.participants.insert(
                    *participant_kind,
                    merge_participants(*participant_kind, participants)?,
                );
            }
        }
        debug!(source = %kind, rows = row_count, "Loaded records");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryRecordSource;
    use pretty_assertions::assert_eq;
    use reward_core::ONE_MONTH;
    use serde_json::json;

    const ALICE: &str = "0x00000000000000000000000000000000000000a1";
    const BOB: &str = "0x00000000000000000000000000000000000000b0";

    fn kinds(kinds: &[SourceKind]) -> BTreeSet<SourceKind> {
        kinds.iter().copied().collect()
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let source = InMemoryRecordSource::default().with_rows(
            SourceKind::Investment,
            vec![
                json!({"address": ALICE, "amount": "100"}),
                json!({"address": "not-an-address", "amount": "5"}),
                json!({"amount": "5"}),
                json!({"address": BOB, "amount": "12.5"}),
                json!({"address": BOB, "amount": {"nested": true}}),
                json!("just a string"),
            ],
        );
        let records = load_records(&source, &kinds(&[SourceKind::Investment])).unwrap();
        assert_eq!(records.participants(SourceKind::Investment).len(), 1);
        let reasons: Vec<_> = records.skipped.iter().map(|s| (s.row, &s.reason)).collect();
        assert_eq!(reasons.len(), 5);
        assert!(matches!(reasons[0], (2, SkipReason::InvalidAddress { .. })));
        assert!(matches!(reasons[1], (3, SkipReason::MissingAddress)));
        assert!(matches!(
            reasons[2],
            (4, SkipReason::InvalidAmount { field: "amount", .. })
        ));
        assert!(matches!(
            reasons[3],
            (5, SkipReason::InvalidAmount { field: "amount", .. })
        ));
        assert!(matches!(reasons[4], (6, SkipReason::MalformedRow { .. })));
        assert_eq!(records.skipped[0].address.as_deref(), Some("not-an-address"));
    }

    #[test]
    fn missing_required_source_is_fatal() {
        let source = InMemoryRecordSource::default();
        assert_eq!(
            load_records(&source, &kinds(&[SourceKind::Advisor])).unwrap_err(),
            DistributionError::MissingSource(SourceKind::Advisor)
        );
    }

    #[test]
    fn duplicate_rows_are_summed() {
        let source = InMemoryRecordSource::default()
            .with_rows(
                SourceKind::Contributor,
                vec![
                    json!({"address": ALICE, "immediateAmount": "10", "vestingAmount": 5}),
                    json!({"address": BOB, "immediateAmount": "1"}),
                    json!({"address": ALICE.to_uppercase().replace("0X", "0x"), "vestingAmount": "7"}),
                ],
            )
            .with_rows(
                SourceKind::Holders,
                vec![
                    json!({"address": ALICE, "rawBalance": "100", "firstReceiveTimestamp": 50}),
                    json!({"address": ALICE, "rawBalance": "11", "firstReceiveTimestamp": 20}),
                ],
            );
        let records = load_records(
            &source,
            &kinds(&[SourceKind::Contributor, SourceKind::Holders]),
        )
        .unwrap();
        let contributors = records.participants(SourceKind::Contributor);
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].address, ALICE.parse().unwrap());
        assert_eq!(
            contributors[0].terms,
            ParticipantTerms::Split {
                immediate_amount: 10,
                vesting_amount: 12
            }
        );
        assert_eq!(contributors[0].row, 1);
        assert_eq!(
            records.holders,
            vec![HolderSnapshot {
                address: ALICE.parse().unwrap(),
                raw_balance: 111,
                first_receive_timestamp: 20,
            }]
        );
    }

    #[test]
    fn conflicting_contractor_schedules_are_fatal() {
        let month = ONE_MONTH.to_string();
        let source = InMemoryRecordSource::default().with_rows(
            SourceKind::Contractor,
            vec![
                json!({"address": ALICE, "amount": "1", "vestingLength": month, "cliffLength": "0", "vestingInterval": month}),
                json!({"address": ALICE, "amount": "1", "vestingLength": "0", "cliffLength": "0", "vestingInterval": "0"}),
            ],
        );
        assert_eq!(
            load_records(&source, &kinds(&[SourceKind::Contractor])).unwrap_err(),
            DistributionError::InconsistentRecordVesting {
                account: ALICE.parse().unwrap(),
                kind: SourceKind::Contractor,
            }
        );
    }

    #[test]
    fn early_investor_rows_merge_by_canonical_address() {
        let source = InMemoryRecordSource::default().with_rows(
            SourceKind::EarlyInvestors,
            vec![
                json!({"canonicalAddress": ALICE, "vestingTokenAmount": "3", "usdcInvestment": "100"}),
                json!({"canonicalAddress": ALICE, "legacyAddress": BOB, "vestingTokenAmount": "4", "usdcInvestment": "50", "useCustodyExclusion": true}),
                json!({"canonicalAddress": BOB, "legacyAddress": "0x12", "vestingTokenAmount": "4", "usdcInvestment": "50"}),
            ],
        );
        let records = load_records(&source, &kinds(&[SourceKind::EarlyInvestors])).unwrap();
        assert_eq!(
            records.early_investors,
            vec![EarlyInvestorRecord {
                canonical_address: ALICE.parse().unwrap(),
                legacy_address: Some(BOB.parse().unwrap()),
                vesting_token_amount: 7,
                usdc_investment: 150,
                use_custody_exclusion: true,
                row: 1,
            }]
        );
        assert_eq!(records.skipped.len(), 1);
        assert!(records.early_investors[0].matches(&BOB.parse().unwrap()));
    }

    #[test]
    fn numeric_balances_beyond_u64_are_kept() {
        let rows: Vec<Value> = serde_json::from_str(&format!(
            r#"[
                {{"address": "{ALICE}", "rawBalance": 500000000000000000000, "firstReceiveTimestamp": 1700000000}},
                {{"address": "{BOB}", "rawBalance": 340282366920938463463374607431768211456, "firstReceiveTimestamp": 0}}
            ]"#
        ))
        .unwrap();
        let source = InMemoryRecordSource::default().with_rows(SourceKind::Holders, rows);
        let records = load_records(&source, &kinds(&[SourceKind::Holders])).unwrap();
        assert_eq!(
            records.holders,
            vec![HolderSnapshot {
                address: ALICE.parse().unwrap(),
                raw_balance: 500_000_000_000_000_000_000,
                first_receive_timestamp: 1_700_000_000,
            }]
        );
        // one past u128::MAX
        assert_eq!(records.skipped.len(), 1);
        assert!(matches!(
            records.skipped[0].reason,
            SkipReason::InvalidAmount {
                field: "rawBalance",
                ..
            }
        ));
    }

    #[test]
    fn fractional_and_negative_numbers_are_invalid_amounts() {
        let rows: Vec<Value> = serde_json::from_str(&format!(
            r#"[
                {{"address": "{ALICE}", "amount": 12.5}},
                {{"address": "{BOB}", "amount": -3}},
                {{"address": "{BOB}", "amount": true}}
            ]"#
        ))
        .unwrap();
        let source = InMemoryRecordSource::default().with_rows(SourceKind::Advisor, rows);
        let records = load_records(&source, &kinds(&[SourceKind::Advisor])).unwrap();
        assert!(records.participants(SourceKind::Advisor).is_empty());
        let values: Vec<_> = records
            .skipped
            .iter()
            .map(|skipped| match &skipped.reason {
                SkipReason::InvalidAmount { field, value } => (*field, value.as_str()),
                other => panic!("unexpected skip reason {other:?}"),
            })
            .collect();
        assert_eq!(
            values,
            vec![("amount", "12.5"), ("amount", "-3"), ("amount", "true")]
        );
    }

    #[test]
    fn mixed_participant_terms_are_a_configuration_error() {
        let address: Address = ALICE.parse().unwrap();
        let records = vec![
            ParticipantRecord {
                address,
                terms: ParticipantTerms::Flat { amount: 1 },
                row: 1,
            },
            ParticipantRecord {
                address,
                terms: ParticipantTerms::Fixed,
                row: 2,
            },
        ];
        assert!(matches!(
            merge_participants(SourceKind::Advisor, records),
            Err(DistributionError::Configuration(_))
        ));
    }
}
