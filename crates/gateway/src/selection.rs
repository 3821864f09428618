use mailwire_core::{BackendKind, Driver, Runtime};

/// Pick the backend for a driver in a runtime.
///
/// Driver and runtime are independent axes. `stream` has a single
/// implementation which refuses to run on the edge by itself.
pub fn select_backend(driver: Driver, runtime: Runtime) -> BackendKind {
    match (driver, runtime) {
        (Driver::Smtp, Runtime::Native) => BackendKind::SmtpNative,
        (Driver::Smtp, Runtime::Edge) => BackendKind::SmtpEdge,
        (Driver::Ses, Runtime::Native) => BackendKind::SesNative,
        (Driver::Ses, Runtime::Edge) => BackendKind::SesEdge,
        (Driver::Stream, _) => BackendKind::Stream,
    }
}
