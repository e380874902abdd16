//! Fixed-capacity history buffers behind every visual projection.
//!
//! All buffers evict on append. [`BoundedHistory`] is oldest-first FIFO
//! (path, heat). [`ChartHistory`] keeps three paired series in lockstep so
//! the charts never have gaps. [`LogHistory`] is newest-first and truncates
//! from the tail.

use std::collections::VecDeque;

use crate::geo::Coordinate;

/// Heat intensity for a point recorded live.
pub const LIVE_HEAT_INTENSITY: f64 = 0.8;
/// Heat intensity for a point seeded from the backend history endpoint.
pub const SEED_HEAT_INTENSITY: f64 = 0.6;

/// One weighted point in the heat-density overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub intensity: f64,
}

impl HeatPoint {
    pub fn new(position: Coordinate, intensity: f64) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            intensity,
        }
    }
}

/// Ordered sequence with a maximum capacity; append at tail, evict from head.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting the oldest if the buffer is full.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently appended item.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Snapshot the contents oldest-first, for handing to a view surface.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Rolling chart series: RSSI and battery readings paired with shared
/// timestamp labels. The three columns always have equal length.
#[derive(Debug, Clone)]
pub struct ChartHistory {
    labels: VecDeque<String>,
    rssi: VecDeque<f64>,
    battery: VecDeque<f64>,
    capacity: usize,
}

impl ChartHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            labels: VecDeque::with_capacity(capacity),
            rssi: VecDeque::with_capacity(capacity),
            battery: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one tick's readings, evicting the oldest column when full.
    pub fn push(&mut self, label: String, rssi_dbm: f64, battery_volts: f64) {
        self.labels.push_back(label);
        self.rssi.push_back(rssi_dbm);
        self.battery.push_back(battery_volts);
        while self.labels.len() > self.capacity {
            self.labels.pop_front();
            self.rssi.pop_front();
            self.battery.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn rssi(&self) -> impl Iterator<Item = f64> + '_ {
        self.rssi.iter().copied()
    }

    pub fn battery(&self) -> impl Iterator<Item = f64> + '_ {
        self.battery.iter().copied()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.rssi.clear();
        self.battery.clear();
    }
}

/// Event log lines, newest first, truncated from the tail.
#[derive(Debug, Clone)]
pub struct LogHistory {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend a line, dropping the oldest from the tail when full.
    pub fn push(&mut self, line: String) {
        self.lines.push_front(line);
        while self.lines.len() > self.capacity {
            self.lines.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Every history buffer the dashboard keeps, owned by the synchronizer.
#[derive(Debug)]
pub struct DashboardHistory {
    /// Travelled-path trail; valid fixes only.
    pub path: BoundedHistory<Coordinate>,
    /// Heat-density overlay points; valid fixes only.
    pub heat: BoundedHistory<HeatPoint>,
    /// Rolling RSSI/battery chart series; every tick, defaults substituted.
    pub charts: ChartHistory,
    /// Event log, newest first.
    pub log: LogHistory,
}

impl DashboardHistory {
    pub fn new(
        path_capacity: usize,
        heat_capacity: usize,
        chart_capacity: usize,
        log_capacity: usize,
    ) -> Self {
        Self {
            path: BoundedHistory::new(path_capacity),
            heat: BoundedHistory::new(heat_capacity),
            charts: ChartHistory::new(chart_capacity),
            log: LogHistory::new(log_capacity),
        }
    }

    /// Clear all four buffers. Used on a data-source transition, where
    /// history accumulated under one source is meaningless under another.
    pub fn clear_all(&mut self) {
        self.path.clear();
        self.heat.clear();
        self.charts.clear();
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_history_eviction() {
        let mut history = BoundedHistory::new(5);
        for i in 0..12 {
            history.push(i);
        }
        assert_eq!(history.len(), 5);
        // Contents are the last 5 inserted, in insertion order.
        let contents: Vec<i32> = history.iter().copied().collect();
        assert_eq!(contents, vec![7, 8, 9, 10, 11]);
        assert_eq!(history.latest(), Some(&11));
    }

    #[test]
    fn test_bounded_history_under_capacity() {
        let mut history = BoundedHistory::new(5);
        history.push("a");
        history.push("b");
        assert_eq!(history.len(), 2);
        assert_eq!(history.to_vec(), vec!["a", "b"]);
    }

    #[test]
    fn test_bounded_history_clear() {
        let mut history = BoundedHistory::new(3);
        history.push(1);
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_chart_history_columns_stay_paired() {
        let mut charts = ChartHistory::new(3);
        for i in 0..7 {
            charts.push(format!("t{i}"), -60.0 - i as f64, 3.9 - 0.1 * i as f64);
        }
        assert_eq!(charts.len(), 3);
        let labels: Vec<&str> = charts.labels().collect();
        assert_eq!(labels, vec!["t4", "t5", "t6"]);
        let rssi: Vec<f64> = charts.rssi().collect();
        assert_eq!(rssi, vec![-64.0, -65.0, -66.0]);
        assert_eq!(charts.battery().count(), 3);
    }

    #[test]
    fn test_log_history_newest_first() {
        let mut log = LogHistory::new(3);
        log.push("first".to_string());
        log.push("second".to_string());
        log.push("third".to_string());
        log.push("fourth".to_string());

        let lines: Vec<&str> = log.iter().collect();
        // Newest first; "first" was truncated from the tail.
        assert_eq!(lines, vec!["fourth", "third", "second"]);
    }

    #[test]
    fn test_clear_all() {
        let mut history = DashboardHistory::new(20, 200, 30, 50);
        history.path.push(Coordinate::new(12.97, 79.0));
        history
            .heat
            .push(HeatPoint::new(Coordinate::new(12.97, 79.0), LIVE_HEAT_INTENSITY));
        history.charts.push("t".to_string(), -60.0, 3.9);
        history.log.push("line".to_string());

        history.clear_all();
        assert!(history.path.is_empty());
        assert!(history.heat.is_empty());
        assert!(history.charts.is_empty());
        assert!(history.log.is_empty());
    }
}
