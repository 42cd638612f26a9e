use super::{ParseFailure, Record};
use crate::session::RawResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One HAProxy frontend, backend or server with its statistics
///
/// `fields` uses HAProxy's own statistic names (`scur`, `stot`, `status`,
/// ...) and values exactly as the stats socket reports them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HaproxyObject {
    pub proxy_name: String,
    pub service_name: String,
    pub obj_type: String,
    pub proxy_id: u64,
    pub id: u64,
    pub process_num: u64,
    pub fields: BTreeMap<String, Value>,
}

/// One element of `show stat json`: a single statistic of one object
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatEntry {
    obj_type: String,
    proxy_id: u64,
    id: u64,
    process_num: u64,
    field: Option<StatField>,
    value: Option<StatValue>,
}

#[derive(Debug, Deserialize)]
struct StatField {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StatValue {
    value: Value,
}

/// Parses HAProxy's typed JSON statistics
///
/// The payload is a list of objects, each a list of `{objType, proxyId, id,
/// processNum, field: {name}, value: {value}}` entries. Entries are folded
/// into one record per object, keyed by the `pxname`/`svname` statistics.
pub fn parse_haproxy(response: &RawResponse) -> Result<Record, ParseFailure> {
    let payload: Vec<Vec<StatEntry>> = serde_json::from_str(response.body.trim())?;

    let mut objects = Vec::with_capacity(payload.len());
    for (index, entries) in payload.into_iter().enumerate() {
        let Some(first) = entries.first() else {
            return Err(ParseFailure::Malformed(format!(
                "statistics object {} has no entries",
                index
            )));
        };
        let obj_type = first.obj_type.clone();
        let (proxy_id, id, process_num) = (first.proxy_id, first.id, first.process_num);

        let mut fields: BTreeMap<String, Value> = entries
            .into_iter()
            .filter_map(|entry| Some((entry.field?.name, entry.value?.value)))
            .collect();

        let proxy_name = take_name(&mut fields, "pxname", index)?;
        let service_name = take_name(&mut fields, "svname", index)?;

        objects.push(HaproxyObject {
            proxy_name,
            service_name,
            obj_type,
            proxy_id,
            id,
            process_num,
            fields,
        });
    }

    Ok(Record::Haproxy(objects))
}

fn take_name(
    fields: &mut BTreeMap<String, Value>,
    key: &str,
    index: usize,
) -> Result<String, ParseFailure> {
    match fields.remove(key) {
        Some(Value::String(name)) => Ok(name),
        Some(other) => Err(ParseFailure::Malformed(format!(
            "statistics object {}: {} is {} instead of a string",
            index, key, other
        ))),
        None => Err(ParseFailure::MissingField(format!("{}[{}]", key, index))),
    }
}
