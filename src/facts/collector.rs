//! Fact Collector
//!
//! Runs the catalog against a [`ZapiSession`] one call at a time and folds
//! every reply into a [`FactSet`]. Any failed call aborts the run, except the
//! key-manager lookup which clusters without onboard key management reject.

use crate::domain::ports::ZapiSession;
use crate::error::{Error, Result};
use crate::facts::catalog::{CatalogEntry, QueryDescriptor, CATALOG, NET_IFGRP, NET_PORT};
use crate::facts::flatten::{convert_keys, element_content, element_to_value, find_item, key_string};
use crate::facts::table::{FactSet, FactTable};
use crate::zapi::{ZapiElement, DEFAULT_MAX_RECORDS};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

/// `port_type` of link aggregation ports in the port table
pub const IFGRP_PORT_TYPE: &str = "if_group";

// =============================================================================
// Fact Collector
// =============================================================================

/// Gathers the full fact set from one cluster
pub struct FactCollector<S> {
    session: S,
    max_records: u32,
}

impl<S: ZapiSession> FactCollector<S> {
    /// Create a collector over an established session
    pub fn new(session: S) -> Self {
        Self {
            session,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }

    /// Override `max-records` sent with iterator calls
    pub fn with_max_records(mut self, max_records: u32) -> Self {
        self.max_records = max_records;
        self
    }

    /// Underlying session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Send one call
    ///
    /// `Ok(None)` means the call failed but the descriptor treats failure
    /// as "feature not present".
    pub async fn execute(
        &self,
        descriptor: &QueryDescriptor,
        request: &ZapiElement,
    ) -> Result<Option<ZapiElement>> {
        debug!("Invoking {}", request.name());

        match self.session.invoke(request).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if descriptor.failure_is_absence() => {
                warn!(
                    "{} failed, treating {} as not configured: {}",
                    descriptor.call, descriptor.fact, e
                );
                Ok(None)
            }
            Err(e) => Err(Error::api_call(descriptor.call, e)),
        }
    }

    /// Send one call and normalize its reply
    pub async fn fetch(
        &self,
        descriptor: &QueryDescriptor,
        request: &ZapiElement,
    ) -> Result<Option<FactTable>> {
        let response = self.execute(descriptor, request).await?;
        normalize(response.as_ref(), descriptor)
    }

    /// Look up every interface group found in the port table
    ///
    /// Port keys are `node:port`; each `if_group` port gets its own
    /// `net-port-ifgrp-get` call and the results are merged into one table.
    pub async fn collect_interface_groups(&self, ports: Option<&FactTable>) -> Result<FactTable> {
        let mut groups = IndexMap::new();

        let Some(ports) = ports else {
            debug!("No port table, skipping interface groups");
            return Ok(FactTable::Keyed(groups));
        };

        for (key, record) in ports.iter() {
            let Some(key) = key else { continue };
            if record.get("port_type").and_then(Value::as_str) != Some(IFGRP_PORT_TYPE) {
                continue;
            }

            let Some((node, group)) = key.split_once(':') else {
                warn!("Interface group port key {} is not node:port, skipping", key);
                continue;
            };

            let request = NET_IFGRP
                .request(self.max_records)
                .child("node", node)
                .child("ifgrp-name", group);

            if let Some(FactTable::Keyed(table)) = self.fetch(&NET_IFGRP, &request).await? {
                groups.extend(table);
            }
        }

        Ok(FactTable::Keyed(groups))
    }

    /// Run the whole catalog
    pub async fn collect_all(&self) -> Result<FactSet> {
        info!("Collecting ONTAP facts from {}", self.session.endpoint());

        let mut facts = FactSet::new();
        for entry in CATALOG {
            let table = match entry {
                CatalogEntry::Query(descriptor) => {
                    let request = descriptor.request(self.max_records);
                    self.fetch(descriptor, &request).await?
                }
                CatalogEntry::InterfaceGroups => {
                    let ports = facts.get(NET_PORT.fact).flatten();
                    Some(self.collect_interface_groups(ports).await?)
                }
            };

            match &table {
                Some(t) => debug!("{}: {} records", entry.fact(), t.len()),
                None => debug!("{}: no data", entry.fact()),
            }
            facts.insert(entry.fact(), table);
        }

        info!("Collected {} fact categories", facts.len());
        Ok(facts)
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Flatten a reply into a fact table
///
/// Returns `None` when there is no reply or the reply carries no record
/// container (ONTAP omits it when nothing matched).
pub fn normalize(
    response: Option<&ZapiElement>,
    descriptor: &QueryDescriptor,
) -> Result<Option<FactTable>> {
    let Some(response) = response else {
        return Ok(None);
    };
    let Some(container) = response.child_by_name(descriptor.container) else {
        return Ok(None);
    };

    let mut table = if descriptor.key.is_keyed() {
        FactTable::keyed()
    } else {
        FactTable::Records(Vec::new())
    };

    for (index, child) in container.children().iter().enumerate() {
        let record = match descriptor.attribute {
            Some(attribute) if child.name() != attribute => {
                return Err(Error::UnexpectedRecord {
                    call: descriptor.call.to_string(),
                    expected: attribute.to_string(),
                    found: child.name().to_string(),
                });
            }
            Some(_) => element_content(child),
            None => element_to_value(child),
        };

        match &mut table {
            FactTable::Keyed(map) => {
                let key = unique_key(&record, descriptor, index)?;
                map.insert(key, convert_keys(record));
            }
            FactTable::Records(records) => records.push(convert_keys(record)),
        }
    }

    Ok(Some(table))
}

/// Derive the table key of the `index`-th record, before key rewriting
fn unique_key(record: &Value, descriptor: &QueryDescriptor, index: usize) -> Result<String> {
    let parts = descriptor
        .key
        .fields()
        .iter()
        .map(|field| {
            record
                .as_object()
                .and_then(|object| find_item(object, field))
                .and_then(key_string)
                .ok_or_else(|| Error::MissingKeyField {
                    call: descriptor.call.to_string(),
                    field: field.to_string(),
                    index,
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(parts.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::catalog::{
        UniqueKey, ITER_CONTAINER, NET_INTERFACE, SECURITY_KEY_MANAGER_KEY, VOLUME,
    };
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    type Handler = Box<dyn Fn(&ZapiElement) -> Result<ZapiElement> + Send + Sync>;

    struct StubSession {
        handler: Handler,
        requests: Mutex<Vec<ZapiElement>>,
    }

    impl StubSession {
        fn new(handler: impl Fn(&ZapiElement) -> Result<ZapiElement> + Send + Sync + 'static) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ZapiSession for StubSession {
        async fn invoke(&self, request: &ZapiElement) -> Result<ZapiElement> {
            self.requests.lock().push(request.clone());
            (self.handler)(request)
        }

        fn endpoint(&self) -> String {
            "stub".into()
        }
    }

    fn results(body: &str) -> ZapiElement {
        ZapiElement::parse(&format!("<results status=\"passed\">{}</results>", body)).unwrap()
    }

    fn zapi_failure() -> Error {
        Error::Zapi {
            errno: "13005".into(),
            reason: "Unable to find API".into(),
        }
    }

    #[test]
    fn test_single_key_keeps_hyphens_in_key() {
        let response = results(
            "<attributes-list>\
               <net-interface-info>\
                 <interface-name>cluster-mgmt</interface-name>\
                 <vserver>cluster1</vserver>\
                 <data-protocols><data-protocol>none</data-protocol></data-protocols>\
               </net-interface-info>\
             </attributes-list>",
        );

        let table = normalize(Some(&response), &NET_INTERFACE).unwrap().unwrap();
        assert_eq!(
            table.get("cluster-mgmt"),
            Some(&json!({
                "interface_name": "cluster-mgmt",
                "vserver": "cluster1",
                "data_protocols": {"data_protocol": "none"}
            }))
        );
    }

    #[test]
    fn test_composite_key_from_nested_fields() {
        let response = results(
            "<attributes-list>\
               <volume-attributes>\
                 <volume-id-attributes>\
                   <name>vol_data</name>\
                   <owning-vserver-name>svm1</owning-vserver-name>\
                   <aggr-name>aggr1</aggr-name>\
                 </volume-id-attributes>\
                 <volume-state-attributes><state>online</state></volume-state-attributes>\
               </volume-attributes>\
             </attributes-list>",
        );

        let table = normalize(Some(&response), &VOLUME).unwrap().unwrap();
        let record = table.get("vol_data:svm1:aggr1").unwrap();
        assert_eq!(record["volume_id_attributes"]["owning_vserver_name"], json!("svm1"));
        assert_eq!(record["volume_state_attributes"]["state"], json!("online"));
    }

    #[test]
    fn test_later_duplicate_overwrites() {
        let response = results(
            "<attributes-list>\
               <net-interface-info><interface-name>lif1</interface-name><vserver>a</vserver></net-interface-info>\
               <net-interface-info><interface-name>lif1</interface-name><vserver>b</vserver></net-interface-info>\
             </attributes-list>",
        );

        let table = normalize(Some(&response), &NET_INTERFACE).unwrap().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("lif1").unwrap()["vserver"], json!("b"));
    }

    #[test]
    fn test_unkeyed_descriptor_yields_sequence() {
        let descriptor = QueryDescriptor {
            fact: "lun_info",
            call: "lun-get-iter",
            attribute: Some("lun-info"),
            key: UniqueKey::None,
            container: ITER_CONTAINER,
            iterator: true,
        };
        let response = results(
            "<attributes-list>\
               <lun-info><path>/vol/v1/lun0</path></lun-info>\
               <lun-info><path>/vol/v1/lun1</path></lun-info>\
             </attributes-list>",
        );

        let table = normalize(Some(&response), &descriptor).unwrap().unwrap();
        assert_eq!(
            table,
            FactTable::Records(vec![json!({"path": "/vol/v1/lun0"}), json!({"path": "/vol/v1/lun1"})])
        );
    }

    #[test]
    fn test_records_without_attribute_keep_their_tag() {
        let descriptor = QueryDescriptor {
            fact: "net_ifgrp_info",
            call: "net-port-ifgrp-get",
            attribute: None,
            key: UniqueKey::Fields(&["node", "ifgrp-name"]),
            container: "attributes",
            iterator: false,
        };
        let response = results(
            "<attributes><net-ifgrp-info>\
               <node>nodeA</node><ifgrp-name>a0a</ifgrp-name><up-ports/>\
             </net-ifgrp-info></attributes>",
        );

        let table = normalize(Some(&response), &descriptor).unwrap().unwrap();
        assert_eq!(
            table.get("nodeA:a0a"),
            Some(&json!({
                "net_ifgrp_info": {"node": "nodeA", "ifgrp_name": "a0a", "up_ports": null}
            }))
        );
    }

    #[test]
    fn test_missing_reply_or_container_is_absence() {
        assert_eq!(normalize(None, &VOLUME).unwrap(), None);

        let response = results("<num-records>0</num-records>");
        assert_eq!(normalize(Some(&response), &VOLUME).unwrap(), None);

        let response = results("<attributes-list/>");
        assert_eq!(normalize(Some(&response), &VOLUME).unwrap(), Some(FactTable::keyed()));
    }

    #[test]
    fn test_normalize_errors() {
        let response = results("<attributes-list><aggr-attributes/></attributes-list>");
        assert_matches!(
            normalize(Some(&response), &VOLUME),
            Err(Error::UnexpectedRecord { ref found, .. }) if found == "aggr-attributes"
        );

        let response = results(
            "<attributes-list>\
               <volume-attributes><name>v0</name><owning-vserver-name>svm1</owning-vserver-name><aggr-name>a</aggr-name></volume-attributes>\
               <volume-attributes><name>v1</name></volume-attributes>\
             </attributes-list>",
        );
        let err = normalize(Some(&response), &VOLUME).unwrap_err();
        assert_matches!(
            err,
            Error::MissingKeyField { ref field, index: 1, .. } if field == "owning-vserver-name"
        );
        assert_eq!(
            err.to_string(),
            "Key field owning-vserver-name missing from volume-get-iter record 1"
        );
    }

    #[tokio::test]
    async fn test_call_failure_aborts_with_call_name() {
        let collector = FactCollector::new(StubSession::new(|_| Err(zapi_failure())));

        let err = collector
            .fetch(&VOLUME, &VOLUME.request(1024))
            .await
            .unwrap_err();
        assert_eq!(err.call(), Some("volume-get-iter"));
        assert!(err.to_string().starts_with("Error calling API volume-get-iter:"));
    }

    #[tokio::test]
    async fn test_key_manager_failure_is_absence() {
        let collector = FactCollector::new(StubSession::new(|_| Err(zapi_failure())));

        let table = collector
            .fetch(&SECURITY_KEY_MANAGER_KEY, &SECURITY_KEY_MANAGER_KEY.request(1024))
            .await
            .unwrap();
        assert_eq!(table, None);
    }

    #[tokio::test]
    async fn test_key_manager_transport_failure_is_absence() {
        let collector = FactCollector::new(StubSession::new(|_| {
            Err(Error::HttpStatus {
                status: 500,
                reason: "Internal Server Error".into(),
            })
        }));

        let table = collector
            .fetch(&SECURITY_KEY_MANAGER_KEY, &SECURITY_KEY_MANAGER_KEY.request(1024))
            .await
            .unwrap();
        assert_eq!(table, None);
        assert_eq!(collector.session().requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_interface_group_lookup() {
        let collector = FactCollector::new(StubSession::new(|request| {
            assert_eq!(request.name(), "net-port-ifgrp-get");
            Ok(results(&format!(
                "<attributes><net-ifgrp-info>\
                   <node>{}</node><ifgrp-name>{}</ifgrp-name><mode>multimode_lacp</mode>\
                 </net-ifgrp-info></attributes>",
                request.child_content("node").unwrap_or_default(),
                request.child_content("ifgrp-name").unwrap_or_default(),
            )))
        }));

        let mut ports = IndexMap::new();
        ports.insert("nodeA:a0a".to_string(), json!({"port": "a0a", "port_type": "if_group"}));
        ports.insert("nodeA:e0a".to_string(), json!({"port": "e0a", "port_type": "physical"}));
        ports.insert("bad-key".to_string(), json!({"port_type": "if_group"}));
        let ports = FactTable::Keyed(ports);

        let groups = collector.collect_interface_groups(Some(&ports)).await.unwrap();

        let requests = collector.session().requests.lock().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].child_content("node"), Some("nodeA"));
        assert_eq!(requests[0].child_content("ifgrp-name"), Some("a0a"));
        assert!(requests[0].child_by_name("max-records").is_none());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("nodeA:a0a").unwrap()["mode"], json!("multimode_lacp"));
    }

    #[tokio::test]
    async fn test_interface_groups_without_ports() {
        let collector = FactCollector::new(StubSession::new(|_| Err(zapi_failure())));

        let groups = collector.collect_interface_groups(None).await.unwrap();
        assert_eq!(groups, FactTable::keyed());
        assert!(collector.session().requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_collect_all_stops_at_first_failure() {
        let collector = FactCollector::new(StubSession::new(|request| match request.name() {
            "aggr-get-iter" => Err(zapi_failure()),
            _ => Ok(results("<num-records>0</num-records>")),
        }))
        .with_max_records(50);

        let err = collector.collect_all().await.unwrap_err();
        assert_eq!(err.call(), Some("aggr-get-iter"));

        let requests = collector.session().requests.lock().clone();
        let calls: Vec<_> = requests.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(
            calls,
            vec![
                "net-interface-get-iter",
                "net-port-get-iter",
                "cluster-node-get-iter",
                "security-login-get-iter",
                "aggr-get-iter",
            ]
        );
        assert_eq!(requests[0].child_content("max-records"), Some("50"));
    }
}
