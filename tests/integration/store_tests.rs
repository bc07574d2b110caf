//! Configuration persistence tests through the public store API.
//!
//! Exercises the self-heal path (blank and corrupted records) and the
//! persistence roundtrip across a simulated power cycle.

use fanbus::adapters::nvm::SimNvm;
use fanbus::config::{ConfigField, Configuration, RECORD_LEN};
use fanbus::store::ConfigStore;

/// A reload from the same backend simulates a power cycle.
fn power_cycle(store: &ConfigStore<SimNvm>) -> ConfigStore<SimNvm> {
    ConfigStore::load(store.backend().clone()).unwrap()
}

#[test]
fn factory_fresh_part_boots_with_defaults() {
    let store = ConfigStore::load(SimNvm::new()).unwrap();
    assert_eq!(store.config(), &Configuration::defaults());
    // Healing persisted the defaults immediately.
    assert_eq!(store.backend().write_count(), 1);
}

#[test]
fn corrupted_record_heals_and_stays_healed() {
    let store = ConfigStore::load(SimNvm::from_bytes(&[0x5A; 64])).unwrap();
    assert_eq!(store.config(), &Configuration::defaults());

    // The healed record survives the next boot without another heal.
    let rebooted = power_cycle(&store);
    assert_eq!(rebooted.config(), &Configuration::defaults());
    assert_eq!(rebooted.backend().write_count(), 0);
}

#[test]
fn truncated_tag_is_treated_as_corruption() {
    // A record whose tag was half-written (torn write on an old part).
    let mut bytes = [0u8; 64];
    bytes[..RECORD_LEN].copy_from_slice(&Configuration::defaults().to_record());
    bytes[5] ^= 0xFF;
    let store = ConfigStore::load(SimNvm::from_bytes(&bytes)).unwrap();
    assert_eq!(store.config(), &Configuration::defaults());
    assert_eq!(store.backend().write_count(), 1);
}

#[test]
fn edits_survive_a_power_cycle() {
    let mut store = ConfigStore::load(SimNvm::new()).unwrap();
    assert!(store.set(ConfigField::ThresholdC, 42));
    assert!(store.set(ConfigField::HysteresisC, 8));
    assert!(store.set(ConfigField::BusAddress, 31));
    store.persist().unwrap();

    let rebooted = power_cycle(&store);
    assert_eq!(rebooted.config().threshold_c, 42);
    assert_eq!(rebooted.config().hysteresis_c, 8);
    assert_eq!(rebooted.config().bus_address, 31);
}

#[test]
fn unpersisted_edits_do_not_survive() {
    let mut store = ConfigStore::load(SimNvm::new()).unwrap();
    assert!(store.set(ConfigField::ThresholdC, 99));

    let rebooted = power_cycle(&store);
    assert_eq!(rebooted.config().threshold_c, 30);
}
