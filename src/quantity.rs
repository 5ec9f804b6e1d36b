//! Kubernetes resource quantity parsing.
//!
//! The API reports CPU and memory as strings with unit suffixes
//! (`250m`, `1528n`, `7903Mi`). Utilization math needs plain numbers:
//! CPU in cores, memory in bytes. Quantities that fail to parse yield
//! `None` so a single malformed value never poisons a whole report.

/// Parse a CPU quantity into cores.
///
/// Accepts nanocores (`n`), microcores (`u`), millicores (`m`) and
/// plain core counts.
pub fn parse_cpu_cores(quantity: &str) -> Option<f64> {
    let q = quantity.trim();
    if q.is_empty() {
        return None;
    }

    if let Some(v) = q.strip_suffix('n') {
        return v.parse::<f64>().ok().map(|n| n / 1e9);
    }
    if let Some(v) = q.strip_suffix('u') {
        return v.parse::<f64>().ok().map(|n| n / 1e6);
    }
    if let Some(v) = q.strip_suffix('m') {
        return v.parse::<f64>().ok().map(|n| n / 1e3);
    }
    q.parse::<f64>().ok()
}

/// Parse a memory quantity into bytes.
///
/// Accepts binary suffixes (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`), decimal
/// suffixes (`k`, `M`, `G`, `T`, `P`) and plain byte counts.
pub fn parse_memory_bytes(quantity: &str) -> Option<f64> {
    let q = quantity.trim();
    if q.is_empty() {
        return None;
    }

    const BINARY: &[(&str, f64)] = &[
        ("Ki", 1024.0),
        ("Mi", 1024.0 * 1024.0),
        ("Gi", 1024.0 * 1024.0 * 1024.0),
        ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ];
    for (suffix, factor) in BINARY {
        if let Some(v) = q.strip_suffix(suffix) {
            return v.parse::<f64>().ok().map(|n| n * factor);
        }
    }

    const DECIMAL: &[(&str, f64)] = &[
        ("k", 1e3),
        ("M", 1e6),
        ("G", 1e9),
        ("T", 1e12),
        ("P", 1e15),
    ];
    for (suffix, factor) in DECIMAL {
        if let Some(v) = q.strip_suffix(suffix) {
            return v.parse::<f64>().ok().map(|n| n * factor);
        }
    }

    q.parse::<f64>().ok()
}
