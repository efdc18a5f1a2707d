//! Demo command
//!
//! Usage: yangtree demo [--hostname <NAME>] [--interface <NAME>]... [--mtu <N>] [--all]
//!
//! Builds a small device tree from the bundled type catalog, applies the
//! given settings and prints the export as JSON.

use clap::Args;
use std::sync::Arc;
use std::time::Instant;
use yangtree_core::schema::{ChildSchema, ContainerSchema, LeafType, SchemaBuilder};
use yangtree_core::{log_op_end, log_op_error, log_op_start};
use yangtree_core::{parse_catalog_str, MemoryPathIndex, Schema, Tree, TypeId, YangError};

const DEMO_CATALOG: &str = r#"
schema_version: 0
module: device
types:
  hostname:
    base: string
    length: "1..63"
  interface-name:
    base: string
    pattern: "[a-z]+[0-9]+"
  mtu:
    base: uint16
    range: "68..9216"
  enabled:
    base: boolean
"#;

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Device hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// Interfaces to create (repeatable)
    #[arg(long = "interface")]
    pub interfaces: Vec<String>,

    /// MTU applied to every created interface
    #[arg(long)]
    pub mtu: Option<String>,

    /// Reference an interface from the primary-interface leaf
    #[arg(long)]
    pub primary: Option<String>,

    /// Export unchanged leaves with their defaults
    #[arg(long)]
    pub all: bool,
}

/// Execute demo command
pub fn execute(args: DemoArgs) -> Result<(), Box<dyn std::error::Error>> {
    log_op_start!("demo", interface_count = args.interfaces.len());
    let start = Instant::now();

    let json = build(&args).map_err(|e| {
        log_op_error!("demo", &e, duration_ms = start.elapsed().as_millis() as u64);
        e
    })?;

    log_op_end!("demo", duration_ms = start.elapsed().as_millis() as u64);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn named(types: &yangtree_core::TypeRegistry, name: &str) -> Result<TypeId, YangError> {
    types.lookup(name).ok_or_else(|| YangError::InvalidSchema {
        reason: format!("demo catalog has no type {}", name),
    })
}

fn demo_schema() -> Result<Arc<Schema>, YangError> {
    let catalog = parse_catalog_str(DEMO_CATALOG)?;
    let mut builder = SchemaBuilder::new(catalog.compile()?);
    let types = builder.types_mut();
    let hostname = named(types, "hostname")?;
    let interface_name = named(types, "interface-name")?;
    let mtu = named(types, "mtu")?;
    let enabled = named(types, "enabled")?;

    let interface = builder.add_container(
        ContainerSchema::new("interface", "device", "urn:yangtree:device")
            .with_child(ChildSchema::scalar("name", interface_name))
            .with_child(ChildSchema::scalar("mtu", mtu))
            .with_child(ChildSchema::scalar("enabled", enabled).with_default(true)),
    );
    let interfaces = builder.add_container(
        ContainerSchema::new("interfaces", "device", "urn:yangtree:device")
            .with_child(ChildSchema::list("interface", interface, ["name"])),
    );
    let root = builder.add_container(
        ContainerSchema::new("device", "device", "urn:yangtree:device")
            .with_child(ChildSchema::scalar("hostname", hostname))
            .with_child(ChildSchema::container("interfaces", interfaces))
            .with_child(ChildSchema::leaf(
                "primary-interface",
                LeafType::leafref("/interfaces/interface/name"),
            )),
    );
    builder.finish(root)
}

fn build(args: &DemoArgs) -> Result<serde_json::Value, YangError> {
    let mut tree = Tree::with_index(demo_schema()?, Box::new(MemoryPathIndex::new()))?;
    let root = tree.root();

    if let Some(hostname) = &args.hostname {
        tree.set_leaf(root, "hostname", hostname.as_str())?;
    }

    let interfaces = tree.child(root, "interfaces")?;
    for name in &args.interfaces {
        let entry = tree.list(interfaces, "interface")?.add(name.as_str())?;
        if let Some(mtu) = &args.mtu {
            tree.set_leaf(entry.node, "mtu", mtu.as_str())?;
        }
    }

    if let Some(primary) = &args.primary {
        tree.set_leaf(root, "primary-interface", primary.as_str())?;
    }

    tree.to_json(!args.all)
}
