//! Property tests for the authorization and listener invariants.

use std::rc::Rc;
use std::time::Duration;

use fit_sensors::logging::Log;
use fit_sensors::testing::{FakeAuthority, FakePlatform, FakeSession};
use fit_sensors::{
    CapabilityProbe, Config, DataPoint, DataPointCallback, DataSourceDescriptor,
    DataSourceSession, DataSourceType, DataSourcesRequest, DataType, ListenerHandle,
    ListenerRegistry, Permission, ProviderError, SensorFeed, SensorRequest,
};
use proptest::prelude::*;

const STEP_COUNT: &str = "com.google.step_count.delta";

fn arb_source() -> impl Strategy<Value = (bool, String)> {
    (any::<bool>(), prop::string::string_regex("[a-z]{1,8}").unwrap())
}

fn descriptor(is_location: bool, stream: &str) -> DataSourceDescriptor {
    let name = if is_location {
        DataType::LOCATION_SAMPLE
    } else {
        STEP_COUNT
    };
    DataSourceDescriptor::new(DataType::new(name, ["v"]), DataSourceType::Raw, stream)
}

#[derive(Debug, Clone)]
enum Op {
    Register,
    Unregister,
    Refuse(bool),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Register),
        Just(Op::Unregister),
        any::<bool>().prop_map(Op::Refuse),
    ]
}

/// Unregister that can be told to refuse, driving the registry's failure path.
struct TogglingSession {
    inner: FakeSession,
    refuse: std::cell::Cell<bool>,
}

impl DataSourceSession for TogglingSession {
    fn find_data_sources(
        &self,
        request: &DataSourcesRequest,
    ) -> Result<Vec<DataSourceDescriptor>, ProviderError> {
        self.inner.find_data_sources(request)
    }

    fn register_listener(
        &self,
        request: &SensorRequest,
        callback: DataPointCallback,
    ) -> Result<ListenerHandle, ProviderError> {
        self.inner.register_listener(request, callback)
    }

    fn unregister_listener(
        &self,
        handle: &ListenerHandle,
    ) -> Result<bool, ProviderError> {
        if self.refuse.get() {
            return Ok(false);
        }
        self.inner.unregister_listener(handle)
    }
}

proptest! {
    /// Below the threshold the registry is never consulted and the answer is yes.
    #[test]
    fn proptest_below_threshold_always_granted(
        threshold in 1u32..40,
        offset in 1u32..20,
        granted in any::<bool>(),
    ) {
        let sdk = threshold.saturating_sub(offset);
        prop_assume!(sdk < threshold);

        let platform = Rc::new(FakePlatform::new(sdk));
        if granted {
            platform.grant(&Permission::ACCESS_FINE_LOCATION);
        }
        let probe = CapabilityProbe::new(platform.clone(), Rc::new(FakeAuthority::new()), threshold);

        prop_assert!(probe.has_os_permission(&Permission::ACCESS_FINE_LOCATION));
        prop_assert_eq!(platform.permission_checks(), 0);
    }

    /// At or above the threshold the answer mirrors the registry.
    #[test]
    fn proptest_at_or_above_threshold_mirrors_registry(
        threshold in 1u32..40,
        offset in 0u32..20,
        granted in any::<bool>(),
    ) {
        let platform = Rc::new(FakePlatform::new(threshold + offset));
        if granted {
            platform.grant(&Permission::ACCESS_FINE_LOCATION);
        }
        let probe = CapabilityProbe::new(platform, Rc::new(FakeAuthority::new()), threshold);

        prop_assert_eq!(probe.has_os_permission(&Permission::ACCESS_FINE_LOCATION), granted);
    }

    /// The registry never holds more than one listener, and a register while
    /// active leaves the original handle in place.
    #[test]
    fn proptest_at_most_one_listener(ops in prop::collection::vec(arb_op(), 0..40)) {
        let session = TogglingSession {
            inner: FakeSession::new(),
            refuse: std::cell::Cell::new(false),
        };
        let mut registry = ListenerRegistry::new(Log::new("prop"));
        let source = descriptor(true, "gps");

        for op in ops {
            match op {
                Op::Register => {
                    let before = registry.handle().cloned();
                    registry
                        .register(
                            &session,
                            &source,
                            &DataType::location_sample(),
                            Duration::from_secs(10),
                            Rc::new(|_: &DataPoint| {}),
                        )
                        .unwrap();
                    if before.is_some() {
                        prop_assert_eq!(registry.handle().cloned(), before);
                    }
                }
                Op::Unregister => {
                    registry.unregister(&session);
                }
                Op::Refuse(refuse) => session.refuse.set(refuse),
            }
            prop_assert!(session.inner.active_listeners() <= 1);
            prop_assert_eq!(registry.is_active(), session.inner.active_listeners() == 1);
        }
    }

    /// Exactly the first location source in a batch is registered.
    #[test]
    fn proptest_first_match_wins(batch in prop::collection::vec(arb_source(), 0..12)) {
        let descriptors: Vec<_> = batch
            .iter()
            .map(|(is_location, stream)| descriptor(*is_location, stream))
            .collect();
        let session = Rc::new(FakeSession::new());
        let mut feed = SensorFeed::new(
            session.clone(),
            &Config::new("com.example.sensors"),
            Log::new("prop"),
        );

        feed.register_first_match(&descriptors);

        let expected = descriptors
            .iter()
            .find(|d| d.data_type().name() == DataType::LOCATION_SAMPLE);
        let registered: Vec<_> = session
            .registrations()
            .into_iter()
            .map(|r| r.data_source)
            .collect();
        match expected {
            Some(first) => prop_assert_eq!(registered, vec![first.clone()]),
            None => prop_assert!(registered.is_empty()),
        }
    }
}
