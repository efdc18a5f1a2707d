use std::sync::Arc;
use yangtree_core::schema::{ChildSchema, ChoicePath, ContainerSchema, LeafType, SchemaBuilder};
use yangtree_core::types::{BaseType, RestrictionSpec, TypeDef};
use yangtree_core::{MemoryPathIndex, Schema, Tree};

/// Type catalog shared by the fixture schema
#[allow(dead_code)]
pub const FIXTURE_CATALOG: &str = r#"
schema_version: 0
module: fixture
types:
  string:
    base: string
  mtu:
    base: uint16
    range: "68..9216"
  admin-status:
    base: string
    dict_key: [up, down, testing]
  ipv4:
    base: string
    pattern: '(\d{1,3}\.){3}\d{1,3}'
  ratio:
    base: decimal64
    fraction_digits: 2
    range: "0..100"
  uint8:
    base: uint8
  uint16:
    base: uint16
  boolean:
    base: boolean
"#;

/// Build the fixture schema
///
/// ```text
/// root (module top)
/// ├── hostname                 string, module sys
/// ├── ratio                    decimal64 (2 digits)
/// ├── interfaces (module if)
/// │   └── interface[name]      name, mtu, enabled (default true),
/// │                            admin-status, description, tags (unique)
/// ├── a[foo]                   foo -> ../config/foo, config/{foo, bar}
/// ├── routes[prefix metric]    prefix, metric, next-hop
/// ├── events (keyless)         message
/// ├── routing                  choice protocol:
/// │                              static: next-hop
/// │                              dynamic: choice kind: ospf: area / bgp: asn
/// ├── logging (presence)       level
/// ├── dns-servers              leaf-list ipv4, unique
/// ├── mixed                    leaf-list uint8 | string
/// ├── primary                  leafref /interfaces/interface/name
/// ├── loose                    leafref /interfaces/interface/description, no require-instance
/// └── counter                  uint16, config false
/// ```
#[allow(dead_code)]
pub fn fixture_schema() -> Arc<Schema> {
    let mut builder = SchemaBuilder::default();
    let types = builder.types_mut();
    let string = types.compile(&TypeDef::new(BaseType::String)).unwrap();
    let uint8 = types.compile(&TypeDef::new(BaseType::Uint8)).unwrap();
    let uint16 = types.compile(&TypeDef::new(BaseType::Uint16)).unwrap();
    let boolean = types.compile(&TypeDef::new(BaseType::Boolean)).unwrap();
    let mtu = types
        .define(
            "mtu",
            &TypeDef::new(BaseType::Uint16)
                .with_restrictions(RestrictionSpec::new().with_range("68..9216")),
        )
        .unwrap();
    let admin_status = types
        .define(
            "admin-status",
            &TypeDef::new(BaseType::String)
                .with_restrictions(RestrictionSpec::new().with_enum(["up", "down", "testing"])),
        )
        .unwrap();
    let ipv4 = types
        .define(
            "ipv4",
            &TypeDef::new(BaseType::String).with_restrictions(
                RestrictionSpec::new().with_pattern(r"(\d{1,3}\.){3}\d{1,3}"),
            ),
        )
        .unwrap();
    let ratio = types
        .define(
            "ratio",
            &TypeDef::new(BaseType::Decimal64)
                .with_fraction_digits(2)
                .with_restrictions(RestrictionSpec::new().with_range("0..100")),
        )
        .unwrap();

    let interface = builder.add_container(
        ContainerSchema::new("interface", "if", "urn:ietf:interfaces")
            .with_child(ChildSchema::scalar("name", string))
            .with_child(ChildSchema::scalar("mtu", mtu))
            .with_child(ChildSchema::scalar("enabled", boolean).with_default(true))
            .with_child(ChildSchema::scalar("admin-status", admin_status))
            .with_child(ChildSchema::scalar("description", string))
            .with_child(ChildSchema::leaf_list("tags", vec![string], true)),
    );
    let interfaces = builder.add_container(
        ContainerSchema::new("interfaces", "if", "urn:ietf:interfaces")
            .with_child(ChildSchema::list("interface", interface, ["name"])),
    );

    let a_config = builder.add_container(
        ContainerSchema::new("config", "top", "urn:top")
            .with_child(ChildSchema::scalar("foo", string))
            .with_child(ChildSchema::scalar("bar", string)),
    );
    let a_entry = builder.add_container(
        ContainerSchema::new("a", "top", "urn:top")
            .with_child(ChildSchema::leaf("foo", LeafType::leafref("../config/foo")))
            .with_child(ChildSchema::container("config", a_config)),
    );

    let route = builder.add_container(
        ContainerSchema::new("routes", "top", "urn:top")
            .with_child(ChildSchema::scalar("prefix", ipv4))
            .with_child(ChildSchema::scalar("metric", uint16))
            .with_child(ChildSchema::scalar("next-hop", string)),
    );
    let event = builder.add_container(
        ContainerSchema::new("events", "top", "urn:top")
            .with_child(ChildSchema::scalar("message", string)),
    );

    let protocol_static = ChoicePath::new("protocol", "static");
    let protocol_dynamic = ChoicePath::new("protocol", "dynamic");
    let ospf = protocol_dynamic.clone().nested("kind", "ospf");
    let bgp = protocol_dynamic.clone().nested("kind", "bgp");
    let routing = builder.add_container(
        ContainerSchema::new("routing", "top", "urn:top")
            .with_child(ChildSchema::scalar("next-hop", ipv4).in_choice(protocol_static.clone()))
            .with_child(ChildSchema::scalar("area", uint16).in_choice(ospf.clone()))
            .with_child(ChildSchema::scalar("asn", uint16).in_choice(bgp.clone()))
            .with_child(ChildSchema::scalar("description", string))
            .with_case(protocol_static, ["next-hop"])
            .with_case(protocol_dynamic, ["area", "asn"])
            .with_case(ospf, ["area"])
            .with_case(bgp, ["asn"]),
    );

    let logging = builder.add_container(
        ContainerSchema::new("logging", "top", "urn:top")
            .presence()
            .with_child(ChildSchema::scalar("level", admin_status)),
    );

    let root = builder.add_container(
        ContainerSchema::new("root", "top", "urn:top")
            .with_child(ChildSchema::scalar("hostname", string).in_module("sys", "urn:sys"))
            .with_child(ChildSchema::scalar("ratio", ratio))
            .with_child(ChildSchema::container("interfaces", interfaces))
            .with_child(ChildSchema::list("a", a_entry, ["foo"]))
            .with_child(ChildSchema::list("routes", route, ["prefix", "metric"]))
            .with_child(ChildSchema::list("events", event, Vec::<String>::new()))
            .with_child(ChildSchema::container("routing", routing))
            .with_child(ChildSchema::container("logging", logging))
            .with_child(ChildSchema::leaf_list("dns-servers", vec![ipv4], true))
            .with_child(ChildSchema::leaf_list("mixed", vec![uint8, string], false))
            .with_child(ChildSchema::leaf(
                "primary",
                LeafType::leafref("/interfaces/interface/name"),
            ))
            .with_child(ChildSchema::leaf(
                "loose",
                LeafType::leafref_optional("/interfaces/interface/description"),
            ))
            .with_child(ChildSchema::scalar("counter", uint16).state()),
    );

    builder.finish(root).unwrap()
}

/// Fixture tree registering its paths in a [`MemoryPathIndex`]
#[allow(dead_code)]
pub fn indexed_tree() -> Tree {
    Tree::with_index(fixture_schema(), Box::new(MemoryPathIndex::new())).unwrap()
}

/// Fixture tree without a path index
#[allow(dead_code)]
pub fn plain_tree() -> Tree {
    Tree::new(fixture_schema()).unwrap()
}
