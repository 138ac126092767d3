use std::cell::Cell;
use std::io;
use std::time::Duration;
use taskdeck_core::{
    GatewayError, GatewayResult, MemoryGateway, RetryPolicy, RetryingGateway, Task, TaskDraft,
    TaskGateway, TaskService,
};

/// Fails the first `failures` loads with `kind`, then delegates.
struct FlakyGateway {
    inner: MemoryGateway,
    failures: Cell<u32>,
    kind: io::ErrorKind,
    load_calls: Cell<u32>,
}

impl FlakyGateway {
    fn new(failures: u32, kind: io::ErrorKind) -> Self {
        Self {
            inner: MemoryGateway::new(),
            failures: Cell::new(failures),
            kind,
            load_calls: Cell::new(0),
        }
    }
}

impl TaskGateway for FlakyGateway {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    fn load_all(&self) -> GatewayResult<Vec<Task>> {
        self.load_calls.set(self.load_calls.get() + 1);
        let remaining = self.failures.get();
        if remaining > 0 {
            self.failures.set(remaining - 1);
            return Err(GatewayError::Io {
                path: "tasks".into(),
                source: io::Error::from(self.kind),
            });
        }
        self.inner.load_all()
    }

    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()> {
        self.inner.save_all(tasks)
    }
}

fn instant_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::ZERO)
}

#[test]
fn transient_failures_are_retried_until_success() {
    let gateway = RetryingGateway::new(
        FlakyGateway::new(2, io::ErrorKind::TimedOut),
        instant_policy(3),
    );

    assert!(gateway.load_all().unwrap().is_empty());
    assert_eq!(gateway.inner().load_calls.get(), 3);
}

#[test]
fn retries_are_bounded_by_policy() {
    let gateway = RetryingGateway::new(
        FlakyGateway::new(10, io::ErrorKind::Interrupted),
        instant_policy(3),
    );

    let err = gateway.load_all().unwrap_err();
    assert!(err.is_transient());
    assert_eq!(gateway.inner().load_calls.get(), 4);
}

#[test]
fn permanent_failures_are_not_retried() {
    let gateway = RetryingGateway::new(
        FlakyGateway::new(1, io::ErrorKind::PermissionDenied),
        instant_policy(3),
    );

    assert!(gateway.load_all().is_err());
    assert_eq!(gateway.inner().load_calls.get(), 1);
}

#[test]
fn disabled_policy_makes_a_single_attempt() {
    let gateway = RetryingGateway::new(
        FlakyGateway::new(1, io::ErrorKind::TimedOut),
        RetryPolicy::disabled(),
    );

    assert!(gateway.load_all().is_err());
    assert_eq!(gateway.inner().load_calls.get(), 1);
    assert!(gateway.load_all().is_ok());
}

#[test]
fn service_over_retrying_gateway_hides_transient_failures() {
    let gateway = RetryingGateway::new(
        FlakyGateway::new(1, io::ErrorKind::WouldBlock),
        instant_policy(1),
    );
    let service = TaskService::new(gateway);

    let created = service.create(&TaskDraft::new("Buy milk")).unwrap();
    assert_eq!(service.list().unwrap(), vec![created]);
    assert_eq!(service.gateway().backend_name(), "flaky");
}
