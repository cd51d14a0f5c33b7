//! Fact Catalog
//!
//! The fixed, ordered list of ZAPI queries the collector runs. Each entry
//! only differs in API name, record attribute and uniqueness key.

use crate::zapi::ZapiElement;

/// Record container of iterator calls
pub const ITER_CONTAINER: &str = "attributes-list";

/// Record container of plain `-get` calls
pub const GET_CONTAINER: &str = "attributes";

/// Call whose failure means "feature not configured" rather than an error
pub const KEY_MANAGER_CALL: &str = "security-key-manager-key-get-iter";

// =============================================================================
// Unique Key
// =============================================================================

/// How records of one category are keyed in their fact table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    /// Records are kept as a plain sequence
    None,
    /// Table key is the value of one field
    Field(&'static str),
    /// Table key is the colon-joined values of several fields, in order
    Fields(&'static [&'static str]),
}

impl UniqueKey {
    /// Field names making up the key
    pub fn fields(&self) -> &[&'static str] {
        match self {
            UniqueKey::None => &[],
            UniqueKey::Field(field) => std::slice::from_ref(field),
            UniqueKey::Fields(fields) => fields,
        }
    }

    /// Whether records are keyed at all
    pub fn is_keyed(&self) -> bool {
        !matches!(self, UniqueKey::None)
    }
}

// =============================================================================
// Query Descriptor
// =============================================================================

/// Static description of one fact category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// Name of the category in the fact set, e.g. `volume_info`
    pub fact: &'static str,
    /// ZAPI call to invoke
    pub call: &'static str,
    /// Tag each record is wrapped in; descended into before flattening
    pub attribute: Option<&'static str>,
    /// How records are keyed
    pub key: UniqueKey,
    /// Element holding the records in the reply
    pub container: &'static str,
    /// Whether the call pages through `max-records`
    pub iterator: bool,
}

impl QueryDescriptor {
    const fn iter(
        fact: &'static str,
        call: &'static str,
        attribute: &'static str,
        key: UniqueKey,
    ) -> Self {
        Self {
            fact,
            call,
            attribute: Some(attribute),
            key,
            container: ITER_CONTAINER,
            iterator: true,
        }
    }

    /// Build the request element for this query
    pub fn request(&self, max_records: u32) -> ZapiElement {
        let mut request = ZapiElement::new(self.call);
        if self.iterator {
            request.add_new_child("max-records", max_records.to_string());
        }
        request
    }

    /// Whether a failed call only means the feature is absent
    pub fn failure_is_absence(&self) -> bool {
        self.call == KEY_MANAGER_CALL
    }
}

// =============================================================================
// Catalog
// =============================================================================

pub const NET_INTERFACE: QueryDescriptor = QueryDescriptor::iter(
    "net_interface_info",
    "net-interface-get-iter",
    "net-interface-info",
    UniqueKey::Field("interface-name"),
);

pub const NET_PORT: QueryDescriptor = QueryDescriptor::iter(
    "net_port_info",
    "net-port-get-iter",
    "net-port-info",
    UniqueKey::Fields(&["node", "port"]),
);

pub const CLUSTER_NODE: QueryDescriptor = QueryDescriptor::iter(
    "cluster_node_info",
    "cluster-node-get-iter",
    "cluster-node-info",
    UniqueKey::Field("node-name"),
);

pub const SECURITY_LOGIN_ACCOUNT: QueryDescriptor = QueryDescriptor::iter(
    "security_login_account_info",
    "security-login-get-iter",
    "security-login-account-info",
    UniqueKey::Fields(&["user-name", "application", "authentication-method"]),
);

pub const AGGREGATE: QueryDescriptor = QueryDescriptor::iter(
    "aggregate_info",
    "aggr-get-iter",
    "aggr-attributes",
    UniqueKey::Field("aggregate-name"),
);

pub const VOLUME: QueryDescriptor = QueryDescriptor::iter(
    "volume_info",
    "volume-get-iter",
    "volume-attributes",
    UniqueKey::Fields(&["name", "owning-vserver-name", "aggr-name"]),
);

pub const LUN: QueryDescriptor = QueryDescriptor::iter(
    "lun_info",
    "lun-get-iter",
    "lun-info",
    UniqueKey::Field("path"),
);

pub const STORAGE_FAILOVER: QueryDescriptor = QueryDescriptor::iter(
    "storage_failover_info",
    "cf-get-iter",
    "storage-failover-info",
    UniqueKey::Field("node"),
);

/// Per-group lookup behind `net_ifgrp_info`; needs `node` and `ifgrp-name`
pub const NET_IFGRP: QueryDescriptor = QueryDescriptor {
    fact: "net_ifgrp_info",
    call: "net-port-ifgrp-get",
    attribute: Some("net-ifgrp-info"),
    key: UniqueKey::Fields(&["node", "ifgrp-name"]),
    container: GET_CONTAINER,
    iterator: false,
};

pub const VSERVER_MOTD: QueryDescriptor = QueryDescriptor::iter(
    "vserver_motd_info",
    "vserver-motd-get-iter",
    "vserver-motd-info",
    UniqueKey::Field("vserver"),
);

pub const VSERVER_LOGIN_BANNER: QueryDescriptor = QueryDescriptor::iter(
    "vserver_login_banner_info",
    "vserver-login-banner-get-iter",
    "vserver-login-banner-info",
    UniqueKey::Field("vserver"),
);

pub const SECURITY_KEY_MANAGER_KEY: QueryDescriptor = QueryDescriptor::iter(
    "security_key_manager_key_info",
    KEY_MANAGER_CALL,
    "security-key-manager-key-info",
    UniqueKey::Fields(&["node", "key-id"]),
);

pub const VSERVER: QueryDescriptor = QueryDescriptor::iter(
    "vserver_info",
    "vserver-get-iter",
    "vserver-info",
    UniqueKey::Field("vserver-name"),
);

/// One step of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry {
    /// Run the query as-is
    Query(QueryDescriptor),
    /// Derive interface groups from the collected port table
    InterfaceGroups,
}

impl CatalogEntry {
    /// Fact set key filled by this step
    pub fn fact(&self) -> &'static str {
        match self {
            CatalogEntry::Query(descriptor) => descriptor.fact,
            CatalogEntry::InterfaceGroups => NET_IFGRP.fact,
        }
    }
}

/// Collection order; interface groups must follow network ports
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry::Query(NET_INTERFACE),
    CatalogEntry::Query(NET_PORT),
    CatalogEntry::Query(CLUSTER_NODE),
    CatalogEntry::Query(SECURITY_LOGIN_ACCOUNT),
    CatalogEntry::Query(AGGREGATE),
    CatalogEntry::Query(VOLUME),
    CatalogEntry::Query(LUN),
    CatalogEntry::Query(STORAGE_FAILOVER),
    CatalogEntry::InterfaceGroups,
    CatalogEntry::Query(VSERVER_MOTD),
    CatalogEntry::Query(VSERVER_LOGIN_BANNER),
    CatalogEntry::Query(SECURITY_KEY_MANAGER_KEY),
    CatalogEntry::Query(VSERVER),
];

/// Fact set keys in collection order
pub fn fact_names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(CatalogEntry::fact)
}
