use std::convert::Infallible;

use chrono::{Datelike, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Weekly work-day bitmap, Monday is bit 0.
///
/// Persisted as a `TINYINT UNSIGNED`, exchanged on the wire as a list of
/// weekday names (`["Mon", "Tue", ...]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WorkDays(u8);

impl WorkDays {
    pub const MONDAY_TO_FRIDAY: WorkDays = WorkDays(0b001_1111);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 & 0b111_1111 == 0
    }
}

impl From<Vec<Weekday>> for WorkDays {
    fn from(days: Vec<Weekday>) -> Self {
        WorkDays(
            days.iter()
                .fold(0u8, |acc, d| acc | (1 << d.num_days_from_monday())),
        )
    }
}

impl From<WorkDays> for Vec<Weekday> {
    fn from(days: WorkDays) -> Self {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(|d| days.contains(*d))
        .collect()
    }
}

impl TryFrom<u8> for WorkDays {
    type Error = Infallible;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Ok(WorkDays(bits & 0b111_1111))
    }
}

/// `HH:MM` wall-clock times; `HH:MM:SS` is accepted on input.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn parse(value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom("time must be HH:MM"))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, de::Error};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom("time must be HH:MM")),
                None => Ok(None),
            }
        }
    }
}

/// Which bucket a schedule lookup targets, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleScope {
    Employee(u64),
    Position(u64),
    Department(u64),
    Global,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Office hours",
    "start_time": "09:00",
    "end_time": "18:00",
    "break_minutes": 60,
    "work_days": ["Mon", "Tue", "Wed", "Thu", "Fri"],
    "employee_id": null,
    "department_id": 10,
    "position_id": null,
    "is_default": true
}))]
pub struct WorkSchedule {
    pub id: u64,
    pub name: String,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "09:00")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "18:00")]
    pub end_time: NaiveTime,
    pub break_minutes: i32,
    #[sqlx(try_from = "u8")]
    #[schema(value_type = Vec<String>, example = json!(["Mon", "Tue", "Wed", "Thu", "Fri"]))]
    pub work_days: WorkDays,
    pub employee_id: Option<u64>,
    pub department_id: Option<u64>,
    pub position_id: Option<u64>,
    pub is_default: bool,
}

impl WorkSchedule {
    /// Hours expected on a work day: span between start and end less the break.
    pub fn expected_hours(&self) -> f64 {
        let span = (self.end_time - self.start_time).num_minutes() - self.break_minutes as i64;
        span as f64 / 60.0
    }

    pub fn applies_on(&self, date: chrono::NaiveDate) -> bool {
        self.work_days.contains(date.weekday())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.start_time >= self.end_time {
            return Err("start_time must be before end_time".into());
        }
        let span = (self.end_time - self.start_time).num_minutes();
        if self.break_minutes < 0 || self.break_minutes as i64 >= span {
            return Err("break_minutes must be between 0 and the scheduled span".into());
        }
        if self.work_days.is_empty() {
            return Err("work_days must contain at least one day".into());
        }
        let scopes = [self.employee_id, self.department_id, self.position_id]
            .iter()
            .filter(|s| s.is_some())
            .count();
        if scopes > 1 {
            return Err(
                "a schedule is scoped to at most one of employee, department or position".into(),
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWorkSchedule {
    #[schema(example = "Office hours")]
    pub name: String,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "09:00")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "18:00")]
    pub end_time: NaiveTime,
    #[schema(example = 60)]
    #[serde(default)]
    pub break_minutes: i32,
    #[schema(
        value_type = Option<Vec<String>>,
        example = json!(["Mon", "Tue", "Wed", "Thu", "Fri"])
    )]
    pub work_days: Option<WorkDays>,
    pub employee_id: Option<u64>,
    #[schema(example = 10)]
    pub department_id: Option<u64>,
    pub position_id: Option<u64>,
    #[serde(default)]
    pub is_default: bool,
}

impl CreateWorkSchedule {
    pub fn into_schedule(self) -> WorkSchedule {
        WorkSchedule {
            id: 0,
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            break_minutes: self.break_minutes,
            work_days: self.work_days.unwrap_or(WorkDays::MONDAY_TO_FRIDAY),
            employee_id: self.employee_id,
            department_id: self.department_id,
            position_id: self.position_id,
            is_default: self.is_default,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateWorkSchedule {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "hhmm::option::deserialize")]
    #[schema(value_type = Option<String>, example = "08:30")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "hhmm::option::deserialize")]
    #[schema(value_type = Option<String>, example = "17:30")]
    pub end_time: Option<NaiveTime>,
    pub break_minutes: Option<i32>,
    #[schema(value_type = Option<Vec<String>>)]
    pub work_days: Option<WorkDays>,
    pub is_default: Option<bool>,
}

impl UpdateWorkSchedule {
    pub fn apply(self, schedule: &mut WorkSchedule) {
        if let Some(name) = self.name {
            schedule.name = name;
        }
        if let Some(start) = self.start_time {
            schedule.start_time = start;
        }
        if let Some(end) = self.end_time {
            schedule.end_time = end;
        }
        if let Some(break_minutes) = self.break_minutes {
            schedule.break_minutes = break_minutes;
        }
        if let Some(days) = self.work_days {
            schedule.work_days = days;
        }
        if let Some(is_default) = self.is_default {
            schedule.is_default = is_default;
        }
    }
}
