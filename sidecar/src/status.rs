use once_cell::sync::Lazy;
use regex::Regex;

static ACTIVE_CONNECTIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Active connections: (?P<conn>\d+)").expect("invalid regex"));
static SERVER_TOTALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<acc>\d+)\s+(?P<hand>\d+)\s+(?P<req>\d+)").expect("invalid regex"));
static SERVER_STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Reading: (?P<read>\d+) Writing: (?P<write>\d+) Waiting: (?P<wait>\d+)")
        .expect("invalid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTotals {
    pub accepts: i64,
    pub handled: i64,
    pub requests: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStates {
    pub reading: i64,
    pub writing: i64,
    pub waiting: i64,
}

/// Per-cycle parse result of the proxy status page. Each group is matched
/// independently; a line that fails its pattern leaves that group `None`
/// without affecting the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub active_connections: Option<i64>,
    pub totals: Option<ServerTotals>,
    pub workers: Option<WorkerStates>,
}

/// Parses the fixed-format status page body.
///
/// Matching is positional: line 0 carries the active connection count,
/// line 2 the cumulative accepts/handled/requests totals, line 3 the
/// reading/writing/waiting worker states. A format drift upstream makes
/// the affected group silently skip, it never fails the cycle.
pub fn parse_status(body: &str) -> StatusSnapshot {
    let lines: Vec<&str> = body.split('\n').map(str::trim).collect();

    let active_connections = lines
        .first()
        .and_then(|line| ACTIVE_CONNECTIONS_RE.captures(line))
        .and_then(|caps| parse_group(&caps, "conn"));

    let totals = lines.get(2).and_then(|line| {
        let caps = SERVER_TOTALS_RE.captures(line)?;
        Some(ServerTotals {
            accepts: parse_group(&caps, "acc")?,
            handled: parse_group(&caps, "hand")?,
            requests: parse_group(&caps, "req")?,
        })
    });

    let workers = lines.get(3).and_then(|line| {
        let caps = SERVER_STATUS_RE.captures(line)?;
        Some(WorkerStates {
            reading: parse_group(&caps, "read")?,
            writing: parse_group(&caps, "write")?,
            waiting: parse_group(&caps, "wait")?,
        })
    });

    StatusSnapshot {
        active_connections,
        totals,
        workers,
    }
}

fn parse_group(caps: &regex::Captures, name: &str) -> Option<i64> {
    caps.name(name)?.as_str().parse().ok()
}
