//! Load and duration segments.
//!
//! A segment summarises a consecutive stretch of visits so that route
//! statistics can be assembled by merging cached pieces instead of rescanning
//! the whole route. Both merges are associative, which is what allows prefix
//! and suffix caches to be combined from any split point.

use crate::measure::{Duration, Load};
use serde::{Deserialize, Serialize};

/// Aggregated load information for a stretch of visits within one trip.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSegment {
    delivery: Load,
    pickup: Load,
    load: Load,
    excess_load: Load,
}

impl LoadSegment {
    pub fn new(delivery: Load, pickup: Load, load: Load) -> Self {
        LoadSegment {
            delivery,
            pickup,
            load,
            excess_load: Load::ZERO,
        }
    }

    /// Segment for a single client visit.
    pub fn client(delivery: Load, pickup: Load) -> Self {
        LoadSegment {
            delivery,
            pickup,
            load: delivery.max(pickup),
            excess_load: Load::ZERO,
        }
    }

    /// Segment for load already on board when the vehicle departs; it behaves
    /// like delivery demand picked up before the route started.
    pub fn initial(load: Load) -> Self {
        LoadSegment {
            delivery: load,
            pickup: Load::ZERO,
            load,
            excess_load: Load::ZERO,
        }
    }

    /// Concatenate two segments. Deliveries of the second stretch must
    /// already be on board while the first stretch's pickups are still there,
    /// so the maximum on-board load is the larger of the two combinations.
    pub fn merge(first: &Self, second: &Self) -> Self {
        LoadSegment {
            delivery: first.delivery + second.delivery,
            pickup: first.pickup + second.pickup,
            load: (first.load + second.delivery).max(second.load + first.pickup),
            excess_load: Load::ZERO,
        }
    }

    /// Materialise the excess over the given capacity.
    pub fn finalise(&self, capacity: Load) -> Self {
        LoadSegment {
            excess_load: (self.load - capacity).non_negative(),
            ..*self
        }
    }

    pub fn delivery(&self) -> Load {
        self.delivery
    }

    pub fn pickup(&self) -> Load {
        self.pickup
    }

    /// Maximum load on board anywhere in the segment.
    pub fn load(&self) -> Load {
        self.load
    }

    pub fn excess_load(&self) -> Load {
        self.excess_load
    }
}

/// Aggregated schedule information for a stretch of visits.
///
/// The open fields (`duration`, `time_warp`, `start_early`, `start_late`,
/// `release_time`) describe the trailing trip still under construction, with
/// the invariant that its earliest completion is
/// `start_early + duration - time_warp`. Trips already closed off at a reload
/// depot are rolled up into `cum_duration` and `cum_time_warp`;
/// `prev_end_late` remembers the latest possible end of those trips so that
/// unavoidable waiting at the depot can be accounted when the open trip is
/// finalised.
///
/// Suffix caches reuse the same fields in mirrored orientation: there the
/// open trip is the leading one, the cumulative fields cover the later trips,
/// and `prev_end_late` holds their earliest start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSegment {
    duration: Duration,
    time_warp: Duration,
    start_early: Duration,
    start_late: Duration,
    release_time: Duration,
    cum_duration: Duration,
    cum_time_warp: Duration,
    prev_end_late: Duration,
}

impl Default for DurationSegment {
    fn default() -> Self {
        DurationSegment {
            duration: Duration::ZERO,
            time_warp: Duration::ZERO,
            start_early: Duration::ZERO,
            start_late: Duration::MAX,
            release_time: Duration::ZERO,
            cum_duration: Duration::ZERO,
            cum_time_warp: Duration::ZERO,
            prev_end_late: Duration::MAX,
        }
    }
}

impl DurationSegment {
    /// Segment for a single visit: `duration` of service, started within
    /// `[start_early, start_late]`, not before `release_time`.
    pub fn visit(
        duration: Duration,
        start_early: Duration,
        start_late: Duration,
        release_time: Duration,
    ) -> Self {
        DurationSegment {
            duration,
            time_warp: Duration::ZERO,
            start_early,
            start_late,
            release_time,
            cum_duration: Duration::ZERO,
            cum_time_warp: Duration::ZERO,
            prev_end_late: Duration::MAX,
        }
    }

    /// Join `first` and `second` by an arc of `edge` duration.
    ///
    /// Arriving before `second` can start forces waiting; arriving after its
    /// latest start forces time warp, and the merged window shrinks to match.
    pub fn merge(edge: Duration, first: &Self, second: &Self) -> Self {
        // Earliest time offset between starting `first` and starting `second`.
        let delta = first.duration - first.time_warp + edge;
        let wait = (second.start_early - delta - first.start_late).non_negative();
        let warp = (first.start_early + delta - second.start_late).non_negative();

        DurationSegment {
            duration: first.duration + edge + second.duration + wait,
            time_warp: first.time_warp + second.time_warp + warp,
            start_early: (second.start_early - delta).max(first.start_early) - wait,
            start_late: (second.start_late - delta).min(first.start_late) + warp,
            release_time: first.release_time.max(second.release_time),
            cum_duration: first.cum_duration + second.cum_duration,
            cum_time_warp: first.cum_time_warp + second.cum_time_warp,
            prev_end_late: first.prev_end_late.min(second.prev_end_late),
        }
    }

    /// Close the open trip and collapse to the outward-bound view, ready to
    /// be extended with a next trip. Settles the release time against the
    /// trip's window and the unavoidable wait against the previous trips'
    /// latest end.
    pub fn finalise_back(&self) -> Self {
        let start_early = self.start_early.max(self.release_time);
        let release_warp = (self.release_time - self.start_late).non_negative();
        let start_late = self.start_late.max(self.release_time);
        let trip_warp = self.time_warp + release_warp;

        let depot_wait = if self.prev_end_late == Duration::MAX {
            Duration::ZERO
        } else {
            (start_early - self.prev_end_late).non_negative()
        };

        let earliest_end = start_early + self.duration - trip_warp;
        let latest_end = start_late + self.duration - trip_warp;

        DurationSegment {
            duration: Duration::ZERO,
            time_warp: Duration::ZERO,
            start_early: earliest_end,
            start_late: Duration::MAX,
            release_time: Duration::ZERO,
            cum_duration: self.cum_duration + self.duration + depot_wait,
            cum_time_warp: self.cum_time_warp + trip_warp,
            prev_end_late: latest_end,
        }
    }

    /// Mirror of `finalise_back` for suffix construction: collapse this
    /// segment into the inward-bound view of a reload depot visited before
    /// it, connected by an arc of `edge` duration.
    pub fn finalise_front(&self, edge: Duration, depot_service: Duration) -> Self {
        let start_early = self.start_early.max(self.release_time);
        let release_warp = (self.release_time - self.start_late).non_negative();
        let start_late = self.start_late.max(self.release_time);

        DurationSegment {
            duration: depot_service,
            time_warp: Duration::ZERO,
            start_early: Duration::ZERO,
            start_late: (start_late - edge - depot_service).non_negative(),
            release_time: Duration::ZERO,
            cum_duration: self.cum_duration + self.duration + edge,
            cum_time_warp: self.cum_time_warp + self.time_warp + release_warp,
            prev_end_late: start_early,
        }
    }

    /// Trip duration plus any trips already closed off, including unavoidable
    /// depot waits settled so far.
    pub fn total_duration(&self) -> Duration {
        let fin = self.finalise_back();
        fin.cum_duration
    }

    /// Trip time warp plus any trips already closed off.
    pub fn total_time_warp(&self) -> Duration {
        let fin = self.finalise_back();
        fin.cum_time_warp
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn time_warp(&self) -> Duration {
        self.time_warp
    }

    pub fn start_early(&self) -> Duration {
        self.start_early
    }

    pub fn start_late(&self) -> Duration {
        self.start_late
    }

    pub fn release_time(&self) -> Duration {
        self.release_time
    }

    pub fn cum_duration(&self) -> Duration {
        self.cum_duration
    }

    pub fn cum_time_warp(&self) -> Duration {
        self.cum_time_warp
    }

    pub fn prev_end_late(&self) -> Duration {
        self.prev_end_late
    }
}
