use log::info;

use crate::models::Stop;

#[derive(Debug, Clone, PartialEq)]
pub enum StopEvent {
    Opened(Stop),
    Closed(Stop),
}

/// To tilstander (ingen stopp / åpen stopp), drevet av en debouncet
/// "sakte siden"-timer. Maks én åpen stopp om gangen.
#[derive(Debug, Clone)]
pub struct AutoStopDetector {
    delay_ms: i64,
    ride_id: i64,
    slow_since_ms: Option<i64>,
    open_stop: Option<Stop>,
}

impl AutoStopDetector {
    pub fn new(delay_ms: i64) -> Self {
        Self { delay_ms, ride_id: 0, slow_since_ms: None, open_stop: None }
    }

    pub fn reset(&mut self, ride_id: i64) {
        self.ride_id = ride_id;
        self.slow_since_ms = None;
        self.open_stop = None;
    }

    pub fn slow_since_ms(&self) -> Option<i64> {
        self.slow_since_ms
    }

    pub fn open_stop(&self) -> Option<&Stop> {
        self.open_stop.as_ref()
    }

    /// Nullstill sakte-timeren uten å røre en åpen stopp (brukes ved pause/resume).
    pub fn clear_slow_timer(&mut self) {
        self.slow_since_ms = None;
    }

    pub fn on_slow(&mut self, ts_ms: i64, lat: f64, lon: f64) -> Option<StopEvent> {
        let since = *self.slow_since_ms.get_or_insert(ts_ms);
        if self.open_stop.is_some() || ts_ms.saturating_sub(since) < self.delay_ms {
            return None;
        }

        let stop = Stop { ride_id: self.ride_id, start_ts_ms: since, end_ts_ms: None, lat, lon };
        info!("stopp oppdaget (ride {}) fra {} @ {:.5},{:.5}", self.ride_id, since, lat, lon);
        self.open_stop = Some(stop.clone());
        Some(StopEvent::Opened(stop))
    }

    pub fn on_moving(&mut self, ts_ms: i64) -> Option<StopEvent> {
        self.slow_since_ms = None;
        self.close(ts_ms)
    }

    /// Lukk en eventuell åpen stopp, uansett bevegelsestilstand.
    /// Slutt før start klemmes til start, så varigheten aldri blir negativ.
    pub fn close(&mut self, ts_ms: i64) -> Option<StopEvent> {
        let mut stop = self.open_stop.take()?;
        let end = ts_ms.max(stop.start_ts_ms);
        stop.end_ts_ms = Some(end);
        info!(
            "stopp avsluttet (ride {}) etter {} ms",
            self.ride_id,
            end.saturating_sub(stop.start_ts_ms)
        );
        Some(StopEvent::Closed(stop))
    }
}
