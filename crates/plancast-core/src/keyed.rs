//! Serde helpers for the persisted JSON shape.
//!
//! Projects and tasks are stored as JSON objects keyed by id, while the
//! in-memory model keeps them in a `Vec` so that insertion order (the
//! default display order) survives a load/save cycle. Date fields are read
//! leniently: empty or malformed values become `None` instead of failing
//! the whole document.

use chrono::NaiveDate;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

/// A record that is stored under its own id
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Parse a calendar date, accepting a full ISO timestamp by its date part.
///
/// Returns `None` for blank input and logs malformed values.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let day_part = trimmed.split('T').next().unwrap_or(trimmed);
    match NaiveDate::parse_from_str(day_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(value = trimmed, error = %err, "ignoring malformed date");
            None
        }
    }
}

/// Deserialize an optional date, mapping blank or malformed strings to `None`
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

/// Deserialize an optional string, mapping blank values to `None`
pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// `#[serde(with = "keyed::ordered_map")]` for `Vec<T: Keyed>`
pub mod ordered_map {
    use super::*;
    use serde::ser::SerializeMap;
    use serde::{Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Keyed + Serialize,
    {
        let mut map = serializer.serialize_map(Some(items.len()))?;
        for item in items {
            map.serialize_entry(item.key(), item)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Keyed + Deserialize<'de>,
    {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

struct OrderedMapVisitor<T>(PhantomData<T>);

impl<T: Keyed> OrderedMapVisitor<T> {
    fn check_unique<E: de::Error>(seen: &mut HashSet<String>, item: &T) -> Result<(), E> {
        if seen.insert(item.key().to_string()) {
            Ok(())
        } else {
            Err(E::custom(format!("duplicate id `{}`", item.key())))
        }
    }
}

impl<'de, T> Visitor<'de> for OrderedMapVisitor<T>
where
    T: Keyed + Deserialize<'de>,
{
    type Value = Vec<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of records keyed by id")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
        let mut seen = HashSet::new();
        while let Some((key, item)) = access.next_entry::<String, T>()? {
            if item.key() != key {
                return Err(de::Error::custom(format!(
                    "record stored under `{}` has id `{}`",
                    key,
                    item.key()
                )));
            }
            Self::check_unique::<A::Error>(&mut seen, &item)?;
            items.push(item);
        }
        Ok(items)
    }

    // Arrays of records are accepted as well; ids must still be unique.
    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
        let mut seen = HashSet::new();
        while let Some(item) = access.next_element::<T>()? {
            Self::check_unique::<A::Error>(&mut seen, &item)?;
            items.push(item);
        }
        Ok(items)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Project;

    #[test]
    fn parse_date_accepts_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 17);
        assert_eq!(parse_date("2024-05-17"), expected);
        assert_eq!(parse_date("2024-05-17T10:00:00.000Z"), expected);
        assert_eq!(parse_date("  "), None);
        assert_eq!(parse_date("17/05/2024"), None);
    }

    #[test]
    fn tasks_keep_document_order() {
        let raw = r#"{
            "id": "project1",
            "name": "Order",
            "startDate": "2024-01-01",
            "tasks": {
                "task10": {"id": "task10", "name": "ten", "startPlanned": "2024-01-01", "durationPlanned": 1},
                "task2": {"id": "task2", "name": "two", "startPlanned": "2024-01-01", "durationPlanned": 1},
                "task1": {"id": "task1", "name": "one", "startPlanned": "2024-01-01", "durationPlanned": 1}
            }
        }"#;
        let project: Project = serde_json::from_str(raw).unwrap();
        let ids: Vec<&str> = project.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["task10", "task2", "task1"]);

        let text = serde_json::to_string(&project).unwrap();
        let ten = text.find("\"task10\":").unwrap();
        let one = text.find("\"task1\":").unwrap();
        assert!(ten < one);
    }

    #[test]
    fn mismatched_key_is_rejected() {
        let raw = r#"{
            "id": "p", "name": "p", "startDate": "2024-01-01",
            "tasks": {"task1": {"id": "task2", "name": "x", "startPlanned": "2024-01-01", "durationPlanned": 1}}
        }"#;
        let err = serde_json::from_str::<Project>(raw).unwrap_err();
        assert!(err.to_string().contains("stored under `task1`"));
    }

    #[test]
    fn duplicate_ids_in_array_are_rejected() {
        let raw = r#"{
            "id": "p", "name": "p", "startDate": "2024-01-01",
            "tasks": [
                {"id": "task1", "name": "a", "startPlanned": "2024-01-01", "durationPlanned": 1},
                {"id": "task1", "name": "b", "startPlanned": "2024-01-01", "durationPlanned": 1}
            ]
        }"#;
        let err = serde_json::from_str::<Project>(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate id `task1`"));
    }

    #[test]
    fn null_task_map_is_empty() {
        let raw = r#"{"id": "p", "name": "p", "startDate": "2024-01-01", "tasks": null}"#;
        let project: Project = serde_json::from_str(raw).unwrap();
        assert!(project.tasks.is_empty());
    }
}
