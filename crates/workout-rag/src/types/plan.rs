//! Weekly workout plan keyed by weekday

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Day of the week, ordered Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Case-insensitive parse of a weekday name
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Mapping from weekday to an ordered list of exercise descriptions.
///
/// Deserialization goes through [`WorkoutPlan::from_json`], so a decoded
/// plan is never empty and never has an empty day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkoutPlan {
    days: BTreeMap<Weekday, Vec<String>>,
}

impl<'de> Deserialize<'de> for WorkoutPlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(
                "a workout plan must map weekday names to non-empty lists of exercises",
            )
        })
    }
}

impl WorkoutPlan {
    /// Build a plan, rejecting empty plans and empty days
    pub fn new(days: BTreeMap<Weekday, Vec<String>>) -> Option<Self> {
        if days.is_empty() || days.values().any(|exercises| exercises.is_empty()) {
            return None;
        }
        Some(Self { days })
    }

    /// Light-activity week returned when generation cannot produce a plan
    pub fn default_plan() -> Self {
        let day = |items: [&str; 2]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let days = BTreeMap::from([
            (Weekday::Monday, day(["30 minutes walking", "Basic stretching"])),
            (Weekday::Tuesday, day(["Body weight exercises", "Light cardio"])),
            (Weekday::Wednesday, day(["Rest day", "Light stretching"])),
            (Weekday::Thursday, day(["30 minutes walking", "Basic stretching"])),
            (Weekday::Friday, day(["Body weight exercises", "Light cardio"])),
            (Weekday::Saturday, day(["Active recovery", "Light walking"])),
            (Weekday::Sunday, day(["Rest day", "Light stretching"])),
        ]);
        Self { days }
    }

    /// Convert a JSON value produced by the model into a plan.
    ///
    /// Keys must be weekday names (any case). Values may be an array of
    /// strings or a single string. A wrapper object with exactly one key
    /// holding the real plan (`{"plan": {...}}`) is unwrapped once.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;

        if object.len() == 1 {
            if let Some((key, inner)) = object.iter().next() {
                if Weekday::parse(key).is_none() && inner.is_object() {
                    return Self::from_json(inner);
                }
            }
        }

        let mut days = BTreeMap::new();
        for (key, value) in object {
            let day = Weekday::parse(key)?;
            let exercises: Vec<String> = match value {
                serde_json::Value::String(s) => vec![s.clone()],
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?,
                _ => return None,
            };
            let exercises: Vec<String> = exercises
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            days.insert(day, exercises);
        }

        Self::new(days)
    }

    pub fn get(&self, day: Weekday) -> Option<&[String]> {
        self.days.get(&day).map(|v| v.as_slice())
    }

    pub fn days(&self) -> impl Iterator<Item = (&Weekday, &Vec<String>)> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days whose first entry is not a rest marker
    pub fn active_days(&self) -> usize {
        self.days
            .values()
            .filter(|exercises| {
                exercises
                    .first()
                    .map(|first| !first.to_lowercase().contains("rest"))
                    .unwrap_or(false)
            })
            .count()
    }

    /// Pretty JSON used when the plan is fed back into a prompt
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
