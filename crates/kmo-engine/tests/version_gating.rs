use kmo_engine::{catalog, compose_default, detect};
use kmo_types::{CapabilitySet, Error, OperationId, RawVersion, VersionRequirement};

const RELEASES: &[(u32, u32)] = &[(8, 0), (9, 0), (10, 0), (10, 50), (11, 0), (12, 0), (13, 0)];

#[test]
fn operations_compose_exactly_from_their_minimum_version() {
    for &(major, minor) in RELEASES {
        let caps = CapabilitySet::for_version(major, minor);
        let detected = VersionRequirement::new(major, minor);

        for entry in catalog::all() {
            let result = compose_default(entry.id, &caps);
            match entry.min_version() {
                Some(required) if detected < required => match result {
                    Err(Error::UnsupportedVersion {
                        required: reported,
                        ..
                    }) => assert_eq!(reported, required, "{} on {}", entry.id, detected),
                    other => panic!("{} on {}: expected rejection, got {:?}", entry.id, detected, other),
                },
                _ => assert!(
                    result.is_ok(),
                    "{} on {}: {:?}",
                    entry.id,
                    detected,
                    result.err()
                ),
            }
        }
    }
}

#[test]
fn minor_version_is_compared_numerically() {
    // 10.9 precedes 10.50
    let caps = CapabilitySet::for_version(10, 9);
    assert!(compose_default(OperationId::ServiceStatus, &caps).is_err());

    let caps = CapabilitySet::for_version(10, 50);
    assert!(compose_default(OperationId::ServiceStatus, &caps).is_ok());
}

#[test]
fn unknown_release_still_gates_by_number() {
    let raw = RawVersion {
        major: 15,
        minor: 0,
        product_level: "RTM".to_string(),
        edition: "Developer Edition (64-bit)".to_string(),
        version_string: "15.0.2000.5".to_string(),
    };
    let (descriptor, caps) = detect(&raw);

    assert_eq!(descriptor.name, "Unknown edition");
    for id in OperationId::ALL {
        assert!(compose_default(id, &caps).is_ok(), "{}", id);
    }
}

#[test]
fn composed_queries_serialize_for_dry_runs() {
    let caps = CapabilitySet::for_version(13, 0);
    let query = compose_default(OperationId::TopQueries, &caps).unwrap();
    let json = serde_json::to_value(&query).unwrap();

    assert_eq!(json["operation"], "top_queries");
    assert_eq!(json["parameters"][0]["name"], "@row_limit");
    assert_eq!(json["parameters"][0]["value"]["type"], "int");
    assert_eq!(json["parameters"][0]["value"]["value"], 50);
}
