//! Tests for device type detection

use super::*;
use crate::control::{ControlKind, ControlSurface, ValueStrategy};
use crate::device::NameMatcher;
use crate::error::{Result, ValidationError};
use crate::host::mock::MockHost;
use crate::matcher::{Leaf, MatcherNode};
use crate::pattern::{enquiry_response, Pattern};

// ===== Helpers =====

fn build_pad() -> Result<MatcherNode> {
    Ok(Leaf::builder()
        .add_control(ControlSurface::new(
            "pad",
            ControlKind::DrumPad,
            Pattern::note(36, 9),
            ValueStrategy::Note,
        ))
        .build()
        .into())
}

fn build_broken() -> Result<MatcherNode> {
    Err(ValidationError::UnionArity { count: 0 })
}

fn registry() -> DeviceRegistry {
    let mut registry = DeviceRegistry::new();
    registry.register_device(
        DeviceDescriptor::new("Vendor.PadX", build_pad)
            .with_name_matcher(NameMatcher::Prefix("PadX".into()))
            .with_enquiry_response(enquiry_response(&[0x00, 0x20, 0x29])),
    );
    registry.register_device(
        DeviceDescriptor::new("Vendor.Other", build_pad)
            .with_enquiry_response(enquiry_response(&[0x47, 0x7F])),
    );
    registry
}

fn settings() -> BootstrapConfig {
    BootstrapConfig {
        detection_timeout: 1.0,
        ..BootstrapConfig::default()
    }
}

fn padx_response() -> RawEvent {
    RawEvent::sysex(vec![
        0xF0, 0x7E, 0x10, 0x06, 0x02, 0x00, 0x20, 0x29, 0x01, 0x02, 0xF7,
    ])
}

fn bound_id(detector: &DeviceDetector) -> Option<&str> {
    detector.device().map(|d| d.id())
}

// ===== Enquiry response =====

#[test]
fn test_enquiry_sent_and_response_binds() {
    let registry = registry();
    let settings = settings();
    let mut host = MockHost::named("USB MIDI Device");
    let mut detector = DeviceDetector::new(settings);

    detector.initialise(&registry, &mut host, Instant::now());
    assert_eq!(host.sent, vec![UNIVERSAL_ENQUIRY.to_vec()]);
    assert!(detector.state().is_waiting());

    let mut response = padx_response();
    detector.process_event(&registry, &mut response);
    assert!(response.handled);
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));
}

#[test]
fn test_unknown_sysex_keeps_waiting() {
    let registry = registry();
    let settings = settings();
    let mut host = MockHost::named("USB MIDI Device");
    let mut detector = DeviceDetector::new(settings);
    detector.initialise(&registry, &mut host, Instant::now());

    let mut other = RawEvent::sysex(vec![0xF0, 0x7E, 0x10, 0x06, 0x02, 0x41, 0x00, 0xF7]);
    detector.process_event(&registry, &mut other);
    assert!(!other.handled);
    assert!(detector.state().is_waiting());

    // Standard messages are not looked at
    let mut note = RawEvent::standard(0x90, 60, 100);
    detector.process_event(&registry, &mut note);
    assert!(!note.handled);
    assert!(detector.state().is_waiting());
}

#[test]
fn test_first_registered_response_wins() {
    let mut registry = registry();
    registry.register_device(
        DeviceDescriptor::new("Vendor.PadXClone", build_pad)
            .with_enquiry_response(enquiry_response(&[0x00, 0x20])),
    );
    let settings = settings();
    let mut host = MockHost::named("USB MIDI Device");
    let mut detector = DeviceDetector::new(settings);
    detector.initialise(&registry, &mut host, Instant::now());

    detector.process_event(&registry, &mut padx_response());
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));
}

// ===== Timeout fallback =====

#[test]
fn test_timeout_falls_back_to_name() {
    let registry = registry();
    let settings = settings();
    let mut host = MockHost::named("PadX 25");
    let mut detector = DeviceDetector::new(settings);
    let start = Instant::now();
    detector.initialise(&registry, &mut host, start);

    detector.tick(&registry, &host, start + Duration::from_millis(500));
    assert!(detector.state().is_waiting());

    detector.tick(&registry, &host, start + Duration::from_millis(1500));
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));
}

#[test]
fn test_timeout_without_name_match_is_unrecognized() {
    let registry = registry();
    let settings = settings();
    let mut host = MockHost::named("Mystery Synth");
    let mut detector = DeviceDetector::new(settings);
    let start = Instant::now();
    detector.initialise(&registry, &mut host, start);

    detector.tick(&registry, &host, start + Duration::from_secs(2));
    assert!(matches!(detector.state(), DetectionState::Unrecognized));
}

#[test]
fn test_huge_timeout_keeps_waiting() {
    let registry = registry();
    let settings = BootstrapConfig {
        detection_timeout: 1.0e20,
        ..settings()
    };
    let mut host = MockHost::named("PadX 25");
    let mut detector = DeviceDetector::new(settings);
    let start = Instant::now();
    detector.initialise(&registry, &mut host, start);

    detector.tick(&registry, &host, start + Duration::from_millis(1));
    detector.tick(&registry, &host, start + Duration::from_secs(3600));
    assert!(detector.state().is_waiting());
}

#[test]
fn test_name_fallback_skips_device_that_fails_to_build() {
    let mut registry = DeviceRegistry::new();
    registry.register_device(
        DeviceDescriptor::new("Vendor.Broken", build_broken)
            .with_name_matcher(NameMatcher::Prefix("PadX".into())),
    );
    registry.register_device(
        DeviceDescriptor::new("Vendor.PadX", build_pad)
            .with_name_matcher(NameMatcher::Prefix("PadX".into())),
    );
    let mut host = MockHost::named("PadX 25");
    let mut detector = DeviceDetector::new(settings());
    let start = Instant::now();
    detector.initialise(&registry, &mut host, start);

    detector.tick(&registry, &host, start + Duration::from_secs(2));
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));
}

#[test]
fn test_enquiry_response_skips_device_that_fails_to_build() {
    let mut registry = DeviceRegistry::new();
    registry.register_device(
        DeviceDescriptor::new("Vendor.Broken", build_broken)
            .with_enquiry_response(enquiry_response(&[0x00, 0x20])),
    );
    registry.register_device(
        DeviceDescriptor::new("Vendor.PadX", build_pad)
            .with_enquiry_response(enquiry_response(&[0x00, 0x20, 0x29])),
    );
    let mut host = MockHost::named("USB MIDI Device");
    let mut detector = DeviceDetector::new(settings());
    detector.initialise(&registry, &mut host, Instant::now());

    let mut response = padx_response();
    detector.process_event(&registry, &mut response);
    assert!(response.handled);
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));
}

#[test]
fn test_detector_uses_its_own_settings() {
    let settings = BootstrapConfig {
        skip_enquiry: true,
        detection_timeout: 0.25,
        ..settings()
    };
    let detector = DeviceDetector::new(settings.clone());
    assert_eq!(detector.settings(), &settings);
    assert!(matches!(
        detector.state(),
        DetectionState::WaitingForDevice { timeout, .. } if *timeout == Duration::from_millis(250)
    ));
}

#[test]
fn test_tick_before_initialise_does_nothing() {
    let registry = registry();
    let host = MockHost::named("PadX 25");
    let mut detector = DeviceDetector::new(settings());

    detector.tick(&registry, &host, Instant::now() + Duration::from_secs(60));
    assert!(detector.state().is_waiting());
}

#[test]
fn test_late_response_after_fallback_is_ignored() {
    let registry = registry();
    let settings = settings();
    let mut host = MockHost::named("Mystery Synth");
    let mut detector = DeviceDetector::new(settings);
    let start = Instant::now();
    detector.initialise(&registry, &mut host, start);
    detector.tick(&registry, &host, start + Duration::from_secs(2));

    let mut late = padx_response();
    detector.process_event(&registry, &mut late);
    assert!(!late.handled);
    assert!(matches!(detector.state(), DetectionState::Unrecognized));
}

#[test]
fn test_bound_state_is_terminal() {
    let registry = registry();
    let settings = settings();
    let mut host = MockHost::named("Mystery Synth");
    let mut detector = DeviceDetector::new(settings);
    let start = Instant::now();
    detector.initialise(&registry, &mut host, start);
    detector.process_event(&registry, &mut padx_response());

    detector.tick(&registry, &host, start + Duration::from_secs(10));
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));

    // A second initialise doesn't restart detection
    detector.initialise(&registry, &mut host, start);
    assert_eq!(host.sent.len(), 1);
}

// ===== Skip enquiry =====

#[test]
fn test_skip_enquiry_recognises_by_name_immediately() {
    let registry = registry();
    let settings = BootstrapConfig {
        skip_enquiry: true,
        ..settings()
    };
    let mut host = MockHost::named("PadX 49");
    let mut detector = DeviceDetector::new(settings);

    detector.initialise(&registry, &mut host, Instant::now());
    assert!(host.sent.is_empty());
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));
}

#[test]
fn test_skip_enquiry_unknown_name() {
    let registry = registry();
    let settings = BootstrapConfig {
        skip_enquiry: true,
        ..settings()
    };
    let mut host = MockHost::named("Mystery Synth");
    let mut detector = DeviceDetector::new(settings);

    detector.initialise(&registry, &mut host, Instant::now());
    assert!(host.sent.is_empty());
    assert!(matches!(detector.state(), DetectionState::Unrecognized));
}

// ===== Name associations =====

#[test]
fn test_name_association_binds_without_enquiry() {
    let registry = registry();
    let settings = BootstrapConfig {
        name_associations: vec![("MyPad".into(), "Vendor.PadX".into())],
        ..settings()
    };
    let mut host = MockHost::named("MyPad");
    let mut detector = DeviceDetector::new(settings);

    detector.initialise(&registry, &mut host, Instant::now());
    assert!(host.sent.is_empty());
    assert_eq!(bound_id(&detector), Some("Vendor.PadX"));
}

#[test]
fn test_name_association_with_unknown_id_continues() {
    let registry = registry();
    let settings = BootstrapConfig {
        name_associations: vec![
            ("MyPad".into(), "Vendor.Missing".into()),
            ("OtherPad".into(), "Vendor.Other".into()),
        ],
        ..settings()
    };
    let mut host = MockHost::named("MyPad");
    let mut detector = DeviceDetector::new(settings);

    detector.initialise(&registry, &mut host, Instant::now());
    assert_eq!(host.sent, vec![UNIVERSAL_ENQUIRY.to_vec()]);
    assert!(detector.state().is_waiting());
}

#[test]
fn test_later_association_for_same_name_is_used() {
    let registry = registry();
    let settings = BootstrapConfig {
        name_associations: vec![
            ("MyPad".into(), "Vendor.Missing".into()),
            ("MyPad".into(), "Vendor.Other".into()),
        ],
        ..settings()
    };
    let mut host = MockHost::named("MyPad");
    let mut detector = DeviceDetector::new(settings);

    detector.initialise(&registry, &mut host, Instant::now());
    assert!(host.sent.is_empty());
    assert_eq!(bound_id(&detector), Some("Vendor.Other"));
}
