/// Persistent statistics: total deaths, time played, unlocked levels.
///
/// ## File format:
///   Key-value lines in `stats.dat`:
///   ```
///   total_deaths=12
///   time_played_ms=93400
///   unlocked=3
///   ```
///
/// Unknown keys are ignored. A missing or unreadable file yields the
/// defaults; a bad value falls back to that key's default.

use std::path::PathBuf;

const STATS_FILE: &str = "stats.dat";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stats {
    pub total_deaths: u64,
    pub time_played_ms: u64,
    /// Number of selectable levels, at least 1.
    pub unlocked: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Stats { total_deaths: 0, time_played_ms: 0, unlocked: 1 }
    }
}

impl Stats {
    /// Session time counts every frame, menus and pauses included.
    pub fn add_frame_time(&mut self, dt_ms: u64) {
        self.time_played_ms = self.time_played_ms.saturating_add(dt_ms);
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Exe directory, if writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_trapstep");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/trapstep");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn stats_path() -> PathBuf {
    save_dir().join(STATS_FILE)
}

// ══════════════════════════════════════════════════════════════
// Load / save
// ══════════════════════════════════════════════════════════════

pub fn load_stats() -> Stats {
    let candidates = [stats_path(), PathBuf::from(STATS_FILE)];
    for path in &candidates {
        if let Ok(content) = std::fs::read_to_string(path) {
            return parse_stats(&content);
        }
    }
    Stats::default()
}

pub fn save_stats(stats: &Stats) -> Result<(), String> {
    let path = stats_path();
    std::fs::write(&path, serialize(stats))
        .map_err(|e| format!("Saving stats to {} failed: {}", path.display(), e))
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(stats: &Stats) -> String {
    format!(
        "total_deaths={}\ntime_played_ms={}\nunlocked={}\n",
        stats.total_deaths, stats.time_played_ms, stats.unlocked,
    )
}

fn parse_stats(content: &str) -> Stats {
    let mut stats = Stats::default();
    for line in content.lines() {
        let Some((key, val)) = line.split_once('=') else { continue };
        let val = val.trim();
        match key.trim() {
            "total_deaths" => stats.total_deaths = val.parse().unwrap_or(0),
            "time_played_ms" => stats.time_played_ms = val.parse().unwrap_or(0),
            "unlocked" => stats.unlocked = val.parse().unwrap_or(1).max(1),
            _ => {}
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_stats_read_back() {
        let s = Stats { total_deaths: 42, time_played_ms: 93_400, unlocked: 4 };
        assert_eq!(parse_stats(&serialize(&s)), s);
    }

    #[test]
    fn missing_and_bad_values_fall_back() {
        let s = parse_stats("total_deaths=abc\nunlocked=0\nfuture_key=1\n");
        assert_eq!(s, Stats { total_deaths: 0, time_played_ms: 0, unlocked: 1 });
        assert_eq!(parse_stats(""), Stats::default());
    }

    #[test]
    fn frame_time_accumulates_and_saturates() {
        let mut s = Stats::default();
        s.add_frame_time(16);
        s.add_frame_time(100);
        assert_eq!(s.time_played_ms, 116);

        s.time_played_ms = u64::MAX - 5;
        s.add_frame_time(16);
        assert_eq!(s.time_played_ms, u64::MAX);
    }
}
