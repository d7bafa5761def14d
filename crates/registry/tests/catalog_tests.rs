use specsource_registry::ResourceCatalog;
use specsource_types::{PropertyType, SpecResource};

fn load_fixture() -> ResourceCatalog {
    let source = include_str!("data/cdn_api.yaml");
    ResourceCatalog::from_source(source).expect("load catalog from fixture")
}

#[test]
fn discovers_collections_in_document_order() {
    let catalog = load_fixture();
    assert_eq!(catalog.list_names(), vec!["cdns_v1", "cdns_v1_firewall"]);
    assert_eq!(catalog.base_url(), Some("https://api.cdn.example.com"));
}

#[test]
fn converts_item_schema_with_nested_objects() {
    let catalog = load_fixture();
    let cdns = catalog.find("cdns_v1").expect("cdns_v1 present");
    assert_eq!(cdns.summary(), Some("List CDNs"));
    assert!(cdns.parent_resource_info().is_none());

    let schema = cdns.resource_schema().expect("schema");
    assert_eq!(schema.identifier_property().map(|p| p.name.as_str()), Some("id"));
    assert!(schema.property("label").expect("label").required);
    assert_eq!(schema.property("weight").unwrap().property_type(), Ok(PropertyType::Number));
    assert_eq!(schema.property("ips").unwrap().items_type.as_deref(), Some("string"));

    let origin = schema.property("origin").expect("origin");
    let tls = origin.nested.as_ref().and_then(|nested| nested.property("tls")).expect("tls");
    let min_version = tls.nested.as_ref().and_then(|nested| nested.property("minVersion")).expect("minVersion");
    assert_eq!(min_version.field_name(), "min_version");
}

#[test]
fn sub_resources_carry_parent_properties_and_wrapper_path() {
    let catalog = load_fixture();
    let firewall = catalog.find("data_cdns_v1_firewall").expect("firewall present");

    let parent_info = firewall.parent_resource_info().expect("parent info");
    assert_eq!(parent_info.full_parent_resource_name, "cdns_v1");
    assert_eq!(firewall.list_response_path(), Some("rules"));
    assert_eq!(
        firewall.resource_path(&["cdn 1".to_string()]).unwrap(),
        "/v1/cdns/cdn%201/firewall"
    );

    let schema = firewall.resource_schema().expect("schema");
    let names: Vec<_> = schema.iter().map(|property| property.name.as_str()).collect();
    assert_eq!(names, vec!["ruleId", "priority", "action", "cdns_v1_id"]);
    assert_eq!(schema.identifier_property().map(|p| p.name.as_str()), Some("ruleId"));
    assert!(schema.property("action").unwrap().required);
    assert!(schema.property("cdns_v1_id").unwrap().is_parent_property);
}
