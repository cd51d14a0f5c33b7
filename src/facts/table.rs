//! Fact Tables and the Fact Set

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Fact Table
// =============================================================================

/// Normalized records of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactTable {
    /// Records by derived unique key, in first-seen order
    Keyed(IndexMap<String, Value>),
    /// Records in reply order
    Records(Vec<Value>),
}

impl FactTable {
    /// Empty keyed table
    pub fn keyed() -> Self {
        FactTable::Keyed(IndexMap::new())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        match self {
            FactTable::Keyed(map) => map.len(),
            FactTable::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record by unique key (keyed tables only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            FactTable::Keyed(map) => map.get(key),
            FactTable::Records(_) => None,
        }
    }

    /// Iterate `(key, record)`; sequence tables yield no key
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Value)> + Send + '_> {
        match self {
            FactTable::Keyed(map) => Box::new(map.iter().map(|(k, v)| (Some(k.as_str()), v))),
            FactTable::Records(records) => Box::new(records.iter().map(|v| (None, v))),
        }
    }
}

// =============================================================================
// Fact Set
// =============================================================================

/// Fact tables by category name; `None` marks a category with no data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSet {
    tables: IndexMap<String, Option<FactTable>>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a category, replacing any previous table
    pub fn insert(&mut self, fact: impl Into<String>, table: Option<FactTable>) {
        self.tables.insert(fact.into(), table);
    }

    /// Table of a category; outer `None` if the category was never collected
    pub fn get(&self, fact: &str) -> Option<Option<&FactTable>> {
        self.tables.get(fact).map(Option::as_ref)
    }

    /// Category names in collection order
    pub fn facts(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_shapes() {
        let mut keyed = IndexMap::new();
        keyed.insert("node-01".to_string(), json!({"node_name": "node-01"}));

        let mut facts = FactSet::new();
        facts.insert("cluster_node_info", Some(FactTable::Keyed(keyed)));
        facts.insert("lun_info", Some(FactTable::Records(vec![json!({"path": "/vol/v1/l1"})])));
        facts.insert("security_key_manager_key_info", None);

        assert_eq!(
            serde_json::to_value(&facts).unwrap(),
            json!({
                "cluster_node_info": {"node-01": {"node_name": "node-01"}},
                "lun_info": [{"path": "/vol/v1/l1"}],
                "security_key_manager_key_info": null
            })
        );
    }

    #[test]
    fn test_absent_vs_missing() {
        let mut facts = FactSet::new();
        facts.insert("security_key_manager_key_info", None);

        assert_eq!(facts.get("security_key_manager_key_info"), Some(None));
        assert_eq!(facts.get("vserver_info"), None);
    }

    #[test]
    fn test_table_access() {
        let table = FactTable::Records(vec![json!(1), json!(2)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("0"), None);
        assert!(table.iter().all(|(key, _)| key.is_none()));

        assert!(FactTable::keyed().is_empty());
    }
}
