//! Temporal and value resolution
//!
//! Resolves the latest dated value of a category or lab value, the normal
//! range that applies to a reading, and the timeframe window of a
//! requirement. Missing data is never an error here; callers get `None`.

use crate::error::{EvalError, EvalResult};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use octofhir_req_model::{
    age_on, ConceptKey, Gender, LabValueDefinition, LinkCategory, LinkedRecord, NormalRange, Patient,
    PatientLabValue, Requirement, RequirementLinks, TimeUnit,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Closed instant range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window `[now + min, now + max]` for offsets expressed in `unit`.
    ///
    /// Offsets may be negative. Month and year offsets must be whole numbers
    /// because they are applied with calendar arithmetic.
    pub fn from_offsets(
        requirement: &str,
        now: DateTime<Utc>,
        min: Decimal,
        max: Decimal,
        unit: TimeUnit,
    ) -> EvalResult<Self> {
        if min > max {
            return Err(EvalError::invalid_timeframe(
                requirement,
                format!("minimum offset {min} is greater than maximum offset {max}"),
            ));
        }
        let start = shift(requirement, now, min, unit)?;
        let end = shift(requirement, now, max, unit)?;
        Ok(Self { start, end })
    }

    /// Window described by a requirement's `numeric_value_min`,
    /// `numeric_value_max` and `unit`
    pub fn for_requirement(requirement: &Requirement, now: DateTime<Utc>) -> EvalResult<Self> {
        let (min, max, unit) = timeframe_offsets(requirement)?;
        Self::from_offsets(&requirement.name, now, min, max, unit)
    }

    /// Whether `instant` lies inside the window (bounds inclusive)
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Whether an optional timestamp lies inside the window; undated
    /// records never do
    pub fn contains_opt(&self, instant: Option<DateTime<Utc>>) -> bool {
        instant.is_some_and(|at| self.contains(at))
    }
}

/// Validated timeframe offsets of a requirement, independent of `now`
pub fn timeframe_offsets(requirement: &Requirement) -> EvalResult<(Decimal, Decimal, TimeUnit)> {
    let links = requirement.links();
    let (Some(min), Some(max)) = (links.numeric_value_min, links.numeric_value_max) else {
        return Err(EvalError::MissingTimeframeBound {
            requirement: requirement.name.clone(),
        });
    };
    let unit = timeframe_unit(requirement)?;
    if min > max {
        return Err(EvalError::invalid_timeframe(
            &requirement.name,
            format!("minimum offset {min} is greater than maximum offset {max}"),
        ));
    }
    if unit.is_calendar() && !(min.fract().is_zero() && max.fract().is_zero()) {
        return Err(EvalError::invalid_timeframe(
            &requirement.name,
            format!("{unit:?} offsets must be whole numbers"),
        ));
    }
    let reference = DateTime::<Utc>::default();
    shift(&requirement.name, reference, min, unit)?;
    shift(&requirement.name, reference, max, unit)?;
    Ok((min, max, unit))
}

/// The requirement's unit interpreted as a time unit
pub fn timeframe_unit(requirement: &Requirement) -> EvalResult<TimeUnit> {
    let links = requirement.links();
    let Some(unit) = links.unit.as_ref() else {
        return Err(EvalError::InvalidTimeframeUnit {
            requirement: requirement.name.clone(),
            unit: "<none>".to_string(),
        });
    };
    unit.time_unit().ok_or_else(|| EvalError::InvalidTimeframeUnit {
        requirement: requirement.name.clone(),
        unit: format!("'{}'", unit.key),
    })
}

fn shift(
    requirement: &str,
    now: DateTime<Utc>,
    offset: Decimal,
    unit: TimeUnit,
) -> EvalResult<DateTime<Utc>> {
    let out_of_range = || {
        EvalError::invalid_timeframe(
            requirement,
            format!("offset {offset} {unit:?} from {now} leaves the supported date range"),
        )
    };

    let millis_per_unit: i64 = match unit {
        TimeUnit::Minute => 60_000,
        TimeUnit::Hour => 3_600_000,
        TimeUnit::Day => 86_400_000,
        TimeUnit::Week => 604_800_000,
        TimeUnit::Month => return shift_months(requirement, now, offset, unit, 1),
        TimeUnit::Year => return shift_months(requirement, now, offset, unit, 12),
    };
    let millis = offset
        .checked_mul(Decimal::from(millis_per_unit))
        .and_then(|ms| ms.round().to_i64())
        .ok_or_else(out_of_range)?;
    let delta = Duration::try_milliseconds(millis).ok_or_else(out_of_range)?;
    now.checked_add_signed(delta).ok_or_else(out_of_range)
}

fn shift_months(
    requirement: &str,
    now: DateTime<Utc>,
    offset: Decimal,
    unit: TimeUnit,
    months_per_unit: i64,
) -> EvalResult<DateTime<Utc>> {
    let out_of_range = || {
        EvalError::invalid_timeframe(
            requirement,
            format!("offset {offset} {unit:?} from {now} leaves the supported date range"),
        )
    };

    if !offset.fract().is_zero() {
        return Err(EvalError::invalid_timeframe(
            requirement,
            format!("{unit:?} offsets must be whole numbers, got {offset}"),
        ));
    }
    let months = offset
        .to_i64()
        .and_then(|n| n.checked_mul(months_per_unit))
        .ok_or_else(out_of_range)?;
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?;
    let shifted = if months >= 0 {
        now.checked_add_months(Months::new(magnitude))
    } else {
        now.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(out_of_range)
}

/// Most recent dated member of a category
pub fn resolve_latest(links: &RequirementLinks, category: LinkCategory) -> Option<&LinkedRecord> {
    links
        .get(category)
        .iter()
        .filter(|record| record.timestamp.is_some())
        .max_by_key(|record| record.timestamp)
}

/// Which readings a lab operator may look at
#[derive(Debug, Clone, Copy)]
pub struct ReadingFilter<'w> {
    pub kind: ReadingKind,
    pub window: Option<&'w TimeWindow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Numeric,
    Categorical,
}

impl<'w> ReadingFilter<'w> {
    pub fn numeric(window: Option<&'w TimeWindow>) -> Self {
        Self {
            kind: ReadingKind::Numeric,
            window,
        }
    }

    pub fn categorical(window: Option<&'w TimeWindow>) -> Self {
        Self {
            kind: ReadingKind::Categorical,
            window,
        }
    }

    fn accepts(&self, reading: &PatientLabValue) -> bool {
        let has_value = match self.kind {
            ReadingKind::Numeric => reading.value.is_some(),
            ReadingKind::Categorical => reading.value_str.is_some(),
        };
        has_value && self.window.is_none_or(|w| w.contains(reading.datetime))
    }
}

/// Most recent reading of a lab value that passes the filter.
///
/// Readings recorded at the same instant resolve to the one supplied last.
pub fn latest_reading<'a>(
    readings: &[&'a PatientLabValue],
    key: &ConceptKey,
    filter: ReadingFilter<'_>,
) -> Option<&'a PatientLabValue> {
    readings
        .iter()
        .copied()
        .filter(|reading| reading.key() == key && filter.accepts(reading))
        .max_by_key(|reading| reading.datetime)
}

/// Patient attributes used to pick demographic normal ranges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demographics {
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
}

impl Demographics {
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            gender: patient.gender,
            birth_date: patient.birth_date,
        }
    }

    /// Age in completed years at `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<u32> {
        age_on(self.birth_date?, now.date_naive())
    }
}

/// Normal range that applies to `reading`.
///
/// A range the lab reported with the reading is used as is, including its
/// undefined bounds. Otherwise layers apply, lowest precedence first: the
/// definition's default range, the range for the patient's gender, the age
/// band containing the patient's age at `now`. Each layer only overrides the
/// bounds it defines.
pub fn normal_range(
    definition: &LabValueDefinition,
    reading: &PatientLabValue,
    demographics: &Demographics,
    now: DateTime<Utc>,
) -> NormalRange {
    if let Some(explicit) = reading.normal_range {
        return explicit;
    }
    let mut range = definition.default_normal_range;
    if let Some(gender_range) = demographics
        .gender
        .and_then(|gender| definition.gender_ranges.get(&gender))
    {
        range = range.overlay(gender_range);
    }
    if let Some(band) = demographics
        .age_at(now)
        .and_then(|age| definition.age_band(age))
    {
        range = range.overlay(&band.range);
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use octofhir_req_model::Unit;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_window_in_days() {
        let window = TimeWindow::from_offsets("r", now(), dec(-30), dec(0), TimeUnit::Day).unwrap();

        assert!(window.contains(now() - Duration::days(10)));
        assert!(window.contains(now() - Duration::days(30)));
        assert!(window.contains(now()));
        assert!(!window.contains(now() - Duration::days(31)));
        assert!(!window.contains(now() + Duration::seconds(1)));
        assert!(!window.contains_opt(None));
    }

    #[test]
    fn test_window_in_calendar_months() {
        let window = TimeWindow::from_offsets("r", now(), dec(-1), dec(0), TimeUnit::Month).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap());

        let years = TimeWindow::from_offsets("r", now(), dec(-2), dec(1), TimeUnit::Year).unwrap();
        assert_eq!(years.start, Utc.with_ymd_and_hms(2022, 6, 15, 12, 0, 0).unwrap());
        assert_eq!(years.end, Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_fractional_hours_are_allowed() {
        let window = TimeWindow::from_offsets("r", now(), Decimal::new(-15, 1), dec(0), TimeUnit::Hour).unwrap();
        assert_eq!(window.start, now() - Duration::minutes(90));
    }

    #[rstest]
    #[case(dec(0), dec(-1), TimeUnit::Day)]
    #[case(Decimal::new(-15, 1), dec(0), TimeUnit::Month)]
    fn test_invalid_windows(#[case] min: Decimal, #[case] max: Decimal, #[case] unit: TimeUnit) {
        let err = TimeWindow::from_offsets("r", now(), min, max, unit).unwrap_err();
        assert!(matches!(err, EvalError::InvalidTimeframe { .. }));
    }

    #[test]
    fn test_window_out_of_range() {
        let err = TimeWindow::from_offsets("r", now(), dec(-10_000_000), dec(0), TimeUnit::Year).unwrap_err();
        assert!(matches!(err, EvalError::InvalidTimeframe { .. }));
        assert!(err.is_configuration());

        let huge = Requirement::new("r").with_timeframe(dec(-10_000_000), dec(0), Unit::new("years"));
        assert!(matches!(timeframe_offsets(&huge), Err(EvalError::InvalidTimeframe { .. })));
    }

    #[test]
    fn test_window_for_requirement_validates_configuration() {
        let missing_unit = Requirement::new("r").with_link(LinkCategory::Events, ["stroke"]);
        let mut bounds_only = missing_unit.clone();
        bounds_only.links.numeric_value_min = Some(dec(-1));
        bounds_only.links.numeric_value_max = Some(dec(0));

        assert!(matches!(
            TimeWindow::for_requirement(&missing_unit, now()),
            Err(EvalError::MissingTimeframeBound { .. })
        ));
        assert!(matches!(
            TimeWindow::for_requirement(&bounds_only, now()),
            Err(EvalError::InvalidTimeframeUnit { .. })
        ));

        let non_temporal = Requirement::new("r").with_timeframe(dec(-1), dec(0), Unit::new("mg/dl"));
        assert!(matches!(
            TimeWindow::for_requirement(&non_temporal, now()),
            Err(EvalError::InvalidTimeframeUnit { .. })
        ));

        let fractional = Requirement::new("r").with_timeframe(Decimal::new(-5, 1), dec(0), Unit::new("months"));
        assert!(matches!(
            timeframe_offsets(&fractional),
            Err(EvalError::InvalidTimeframe { .. })
        ));

        let valid = Requirement::new("r").with_timeframe(dec(-7), dec(0), Unit::new("days"));
        assert!(TimeWindow::for_requirement(&valid, now()).is_ok());
    }

    #[test]
    fn test_resolve_latest_ignores_undated() {
        let links = RequirementLinks::new()
            .with(
                LinkCategory::Events,
                [
                    LinkedRecord::dated("a", Some(now() - Duration::days(5))),
                    LinkedRecord::dated("b", Some(now() - Duration::days(1))),
                    LinkedRecord::dated("c", None),
                ],
            );

        assert_eq!(resolve_latest(&links, LinkCategory::Events).map(|r| r.key.as_str()), Some("b"));
        assert!(resolve_latest(&links, LinkCategory::Diseases).is_none());
    }

    #[test]
    fn test_latest_reading_respects_filter() {
        let hb = Arc::new(LabValueDefinition::new("hemoglobin"));
        let old = PatientLabValue::numeric(hb.clone(), dec(11), now() - Duration::days(40));
        let recent = PatientLabValue::numeric(hb.clone(), dec(15), now() - Duration::days(2));
        let text = PatientLabValue::categorical(hb.clone(), "hemolytic", now() - Duration::days(1));
        let readings = vec![&old, &recent, &text];
        let key = ConceptKey::from("hemoglobin");

        let latest = latest_reading(&readings, &key, ReadingFilter::numeric(None)).unwrap();
        assert_eq!(latest.value, Some(dec(15)));

        let window = TimeWindow::from_offsets("r", now(), dec(-60), dec(-30), TimeUnit::Day).unwrap();
        let windowed = latest_reading(&readings, &key, ReadingFilter::numeric(Some(&window))).unwrap();
        assert_eq!(windowed.value, Some(dec(11)));

        let categorical = latest_reading(&readings, &key, ReadingFilter::categorical(None)).unwrap();
        assert_eq!(categorical.value_str.as_deref(), Some("hemolytic"));

        assert!(latest_reading(&readings, &ConceptKey::from("ferritin"), ReadingFilter::numeric(None)).is_none());
    }

    #[test]
    fn test_normal_range_precedence() {
        let definition = LabValueDefinition::new("hemoglobin")
            .with_normal_range(NormalRange::between(dec(12), dec(16)))
            .with_gender_range(Gender::Male, NormalRange::between(dec(13), dec(17)))
            .with_age_band(Some(0), Some(12), NormalRange::new(Some(dec(11)), None));
        let reading = PatientLabValue::numeric(Arc::new(definition.clone()), dec(14), now());

        let unknown = Demographics::default();
        assert_eq!(normal_range(&definition, &reading, &unknown, now()), NormalRange::between(dec(12), dec(16)));

        let man = Demographics {
            gender: Some(Gender::Male),
            birth_date: NaiveDate::from_ymd_opt(1980, 1, 1),
        };
        assert_eq!(normal_range(&definition, &reading, &man, now()), NormalRange::between(dec(13), dec(17)));

        let boy = Demographics {
            gender: Some(Gender::Male),
            birth_date: NaiveDate::from_ymd_opt(2018, 1, 1),
        };
        assert_eq!(normal_range(&definition, &reading, &boy, now()), NormalRange::between(dec(11), dec(17)));

        let explicit = reading.clone().with_normal_range(NormalRange::between(dec(10), dec(20)));
        assert_eq!(normal_range(&definition, &explicit, &boy, now()), NormalRange::between(dec(10), dec(20)));

        // a lab range with only an upper bound keeps its lower bound open
        let upper_only = reading.with_normal_range(NormalRange::new(None, Some(dec(20))));
        assert_eq!(normal_range(&definition, &upper_only, &man, now()), NormalRange::new(None, Some(dec(20))));
    }
}
