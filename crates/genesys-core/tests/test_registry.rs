use genesys_core::error::GenesysError;
use genesys_core::model::AsicType;
use genesys_core::registry::DeviceRegistry;

#[test]
fn test_builtin_models_validate() {
    let registry = DeviceRegistry::builtin();
    assert_eq!(registry.len(), 3);
    for config in registry.iter() {
        config.validate().unwrap();
    }
}

#[test]
fn test_find_by_name_and_usb_id() {
    let registry = DeviceRegistry::builtin();

    let lide90 = registry.find("Canon-LiDE-90").unwrap();
    assert_eq!(lide90.model.asic_type, AsicType::Gl842);
    assert!(lide90.model.is_cis);

    let by_id = registry.find_by_usb_id(0x04a9, 0x1900).unwrap();
    assert_eq!(by_id.model.name, "canon-lide-90");

    let lide200 = registry.find_by_usb_id(0x04a9, 0x1905).unwrap();
    assert_eq!(lide200.model.asic_type, AsicType::Gl847);

    assert!(registry.find_by_usb_id(0x1234, 0x5678).is_none());
    assert!(matches!(registry.find("no-such-scanner"), Err(GenesysError::Config(_))));
}

#[test]
fn test_toml_round_trip() {
    let registry = DeviceRegistry::builtin();
    let text = registry.to_toml_string().unwrap();
    let parsed = DeviceRegistry::from_toml_str(&text).unwrap();
    assert_eq!(parsed, registry);
}

#[test]
fn test_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.toml");
    std::fs::write(&path, DeviceRegistry::builtin().to_toml_string().unwrap()).unwrap();

    let loaded = DeviceRegistry::from_path(&path).unwrap();
    assert_eq!(loaded.len(), 3);
    assert!(DeviceRegistry::from_path(&dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut registry = DeviceRegistry::builtin();
    registry.models.truncate(1);
    registry.models[0].sensors.clear();
    let text = registry.to_toml_string().unwrap();

    assert!(matches!(
        DeviceRegistry::from_toml_str(&text),
        Err(GenesysError::Config(_))
    ));
}

#[test]
fn test_malformed_toml_is_rejected() {
    assert!(matches!(
        DeviceRegistry::from_toml_str("models = 3"),
        Err(GenesysError::Toml(_))
    ));
}
