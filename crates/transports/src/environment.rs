use mailwire_core::Runtime;
use tracing::debug;

/// Overrides detection when set to `edge` or `native`.
pub const RUNTIME_VAR: &str = "MAILWIRE_RUNTIME";

/// Variables that edge platforms set in their isolates.
const EDGE_MARKERS: &[&str] = &["CF_PAGES", "CLOUDFLARE_WORKERS", "NETLIFY_EDGE", "VERCEL_EDGE"];

/// Resolve the runtime class from the process environment.
///
/// An explicit configuration flag always wins.
pub fn detect_runtime(explicit: Option<bool>) -> Runtime {
    detect_runtime_with(explicit, |key| std::env::var(key).ok())
}

/// Same as [`detect_runtime`] with an injectable variable lookup.
pub fn detect_runtime_with(explicit: Option<bool>, lookup: impl Fn(&str) -> Option<String>) -> Runtime {
    if let Some(edge) = explicit {
        return if edge { Runtime::Edge } else { Runtime::Native };
    }

    if cfg!(target_arch = "wasm32") {
        return Runtime::Edge;
    }

    match lookup(RUNTIME_VAR).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("edge") => return Runtime::Edge,
        Some("native" | "node") => return Runtime::Native,
        _ => {}
    }

    if let Some(marker) = EDGE_MARKERS
        .iter()
        .copied()
        .find(|&key| lookup(key).is_some_and(|v| !v.is_empty()))
    {
        debug!(marker, "edge platform marker found");
        return Runtime::Edge;
    }

    Runtime::Native
}
