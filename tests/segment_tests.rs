//! Unit tests for the load and duration segment algebra.

use vrp_search::measure::{Duration, Load};
use vrp_search::segment::{DurationSegment, LoadSegment};

fn dur(value: i64) -> Duration {
    Duration::new(value)
}

fn load(value: i64) -> Load {
    Load::new(value)
}

#[test]
fn load_segment_accumulates_demand_and_supply() {
    let first = LoadSegment::client(load(4), load(0));
    let second = LoadSegment::client(load(0), load(3));

    let merged = LoadSegment::merge(&first, &second);
    assert_eq!(merged.delivery(), load(4));
    assert_eq!(merged.pickup(), load(3));

    // Deliveries are on board from the start; the pickup joins after the
    // first drop, so the peak is the larger of the two phases.
    assert_eq!(merged.load(), load(4));

    let reversed = LoadSegment::merge(&second, &first);
    assert_eq!(reversed.load(), load(7));
}

#[test]
fn load_segment_finalise_materialises_excess() {
    let first = LoadSegment::client(load(6), load(0));
    let second = LoadSegment::client(load(6), load(0));
    let merged = LoadSegment::merge(&first, &second);

    assert_eq!(merged.finalise(load(10)).excess_load(), load(2));
    assert_eq!(merged.finalise(load(12)).excess_load(), load(0));
}

#[test]
fn initial_load_behaves_like_delivery() {
    let initial = LoadSegment::initial(load(5));
    let visit = LoadSegment::client(load(3), load(0));

    let merged = LoadSegment::merge(&initial, &visit);
    assert_eq!(merged.load(), load(8));
}

#[test]
fn load_merge_is_associative() {
    let a = LoadSegment::client(load(4), load(1));
    let b = LoadSegment::client(load(2), load(5));
    let c = LoadSegment::client(load(3), load(3));

    let left = LoadSegment::merge(&LoadSegment::merge(&a, &b), &c);
    let right = LoadSegment::merge(&a, &LoadSegment::merge(&b, &c));
    assert_eq!(left, right);
}

#[test]
fn duration_merge_without_windows_sums_durations() {
    let a = DurationSegment::visit(dur(5), dur(0), Duration::MAX, dur(0));
    let b = DurationSegment::visit(dur(3), dur(0), Duration::MAX, dur(0));

    let merged = DurationSegment::merge(dur(7), &a, &b);
    assert_eq!(merged.duration(), dur(15));
    assert_eq!(merged.time_warp(), dur(0));
}

#[test]
fn duration_merge_records_forced_waiting() {
    // Service at `a` ends by time 5 at the latest; `b` cannot start before
    // time 20, so at least 13 time units are spent waiting.
    let a = DurationSegment::visit(dur(2), dur(0), dur(3), dur(0));
    let b = DurationSegment::visit(dur(1), dur(20), dur(30), dur(0));

    let merged = DurationSegment::merge(dur(2), &a, &b);
    assert_eq!(merged.duration(), dur(2 + 2 + 1 + 13));
    assert_eq!(merged.time_warp(), dur(0));

    // Waiting shrinks to zero when starting as late as possible.
    assert_eq!(merged.start_early(), dur(3));
}

#[test]
fn duration_merge_records_time_warp() {
    // Even departing as early as possible, `b`'s window is long closed.
    let a = DurationSegment::visit(dur(2), dur(10), dur(12), dur(0));
    let b = DurationSegment::visit(dur(1), dur(0), dur(5), dur(0));

    let merged = DurationSegment::merge(dur(3), &a, &b);
    assert_eq!(merged.time_warp(), dur(10 + 2 + 3 - 5));
    assert_eq!(merged.start_late(), dur(10));
}

#[test]
fn duration_merge_is_associative() {
    let a = DurationSegment::visit(dur(4), dur(2), dur(9), dur(0));
    let b = DurationSegment::visit(dur(3), dur(10), dur(14), dur(1));
    let c = DurationSegment::visit(dur(5), dur(20), dur(26), dur(0));

    let left = DurationSegment::merge(dur(2), &DurationSegment::merge(dur(1), &a, &b), &c);
    let right = DurationSegment::merge(dur(1), &a, &DurationSegment::merge(dur(2), &b, &c));
    assert_eq!(left, right);
}

#[test]
fn duration_merge_propagates_release_times() {
    let a = DurationSegment::visit(dur(1), dur(0), dur(10), dur(5));
    let b = DurationSegment::visit(dur(1), dur(0), dur(10), dur(8));

    let merged = DurationSegment::merge(dur(0), &a, &b);
    assert_eq!(merged.release_time(), dur(8));
}

#[test]
fn finalise_back_rolls_the_trip_into_the_cumulative_fields() {
    let a = DurationSegment::visit(dur(2), dur(0), dur(6), dur(0));
    let b = DurationSegment::visit(dur(3), dur(4), dur(9), dur(0));
    let trip = DurationSegment::merge(dur(2), &a, &b);

    let closed = trip.finalise_back();
    assert_eq!(closed.duration(), dur(0));
    assert_eq!(closed.cum_duration(), trip.duration());
    assert_eq!(closed.cum_time_warp(), trip.time_warp());

    // The next trip cannot depart before this one can possibly end.
    assert_eq!(
        closed.start_early(),
        trip.start_early() + trip.duration() - trip.time_warp()
    );
    assert_eq!(closed.start_late(), Duration::MAX);
}

#[test]
fn finalise_back_settles_release_time() {
    // The segment must not start before time 8, but its window closes at 5:
    // three units of warp are unavoidable.
    let seg = DurationSegment::visit(dur(2), dur(0), dur(5), dur(8));

    let closed = seg.finalise_back();
    assert_eq!(closed.cum_time_warp(), dur(3));
}

#[test]
fn second_trip_waits_for_the_first_to_end() {
    // First trip can end at time 10 at the latest; the follow-up visit has a
    // window starting at 25, so 15 units of depot waiting are unavoidable.
    let first = DurationSegment::visit(dur(10), dur(0), dur(0), dur(0));
    let boundary = first.finalise_back();

    let next = DurationSegment::visit(dur(2), dur(25), dur(40), dur(0));
    let second = DurationSegment::merge(dur(0), &boundary, &next);
    let closed = second.finalise_back();

    assert_eq!(closed.cum_duration(), dur(10 + 15 + 2));
    assert_eq!(closed.cum_time_warp(), dur(0));
}
