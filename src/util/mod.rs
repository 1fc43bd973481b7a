//! # Misc utilities
//!
//! Dotted-path access into JSON values, e.g. `metadata.fileDesc.titleStmt.title._text`
//! or `annotations.0.text`. A segment indexes an array when the current value is an
//! array and the segment is a number, and names an object key otherwise.
//!
//! Deep cloning is `Clone` on [`serde_json::Value`].
use displaydoc::Display;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error when setting a value at a path
#[derive(Debug, Error, Display, PartialEq)]
pub enum PathError {
    /// The path is empty
    Empty,
    /// Cannot descend into `{0}`, it is not an object or array
    NotAContainer(String),
    /// Index `{0}` is not valid for this array
    BadIndex(String),
}

fn step<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    }
}

fn step_mut<'v>(value: &'v mut Value, key: &str) -> Option<&'v mut Value> {
    match value {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(move |idx| items.get_mut(idx)),
        _ => None,
    }
}

/// Get the value at `path`, if every segment exists
pub fn get<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, step)
}

/// Get a mutable reference to the value at `path`, if every segment exists
pub fn get_mut<'v>(value: &'v mut Value, path: &str) -> Option<&'v mut Value> {
    path.split('.').try_fold(value, step_mut)
}

/// Set the value at `path`, creating missing (or `null`) intermediate objects
pub fn set(value: &mut Value, path: &str, new_value: Value) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop().ok_or(PathError::Empty)?;

    let mut current = value;
    for segment in segments {
        current = descend(current, segment)?;
    }
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.to_owned(), new_value);
            Ok(())
        }
        Value::Array(items) => {
            let idx = last
                .parse::<usize>()
                .map_err(|_| PathError::BadIndex(last.to_owned()))?;
            if idx < items.len() {
                items[idx] = new_value;
            } else if idx == items.len() {
                items.push(new_value);
            } else {
                return Err(PathError::BadIndex(last.to_owned()));
            }
            Ok(())
        }
        _ => Err(PathError::NotAContainer(last.to_owned())),
    }
}

fn descend<'v>(current: &'v mut Value, segment: &str) -> Result<&'v mut Value, PathError> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            let entry = map
                .entry(segment.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            Ok(entry)
        }
        Value::Array(items) => {
            let idx = segment
                .parse::<usize>()
                .map_err(|_| PathError::BadIndex(segment.to_owned()))?;
            items
                .get_mut(idx)
                .ok_or_else(|| PathError::BadIndex(segment.to_owned()))
        }
        _ => Err(PathError::NotAContainer(segment.to_owned())),
    }
}
