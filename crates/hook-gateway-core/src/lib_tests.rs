//! Tests for the hook-gateway-core library module.

use super::*;

#[test]
fn test_installation_id_zero_detection() {
    assert!(InstallationId::new(0).is_zero());
    assert!(!InstallationId::new(12345).is_zero());
    assert_eq!(InstallationId::new(12345).as_i64(), 12345);
    assert_eq!(InstallationId::new(777).to_string(), "777");
}

#[test]
fn test_delivery_id_display() {
    let id = DeliveryId::new("72d3162e-cc78-11e3-81ab-4c9367dc0958");
    assert_eq!(id.as_str(), "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    assert_eq!(id.to_string(), id.as_str());
}

#[test]
fn test_installation_id_serializes_as_number() {
    let json = serde_json::to_string(&InstallationId::new(42)).unwrap();
    assert_eq!(json, "42");
}
