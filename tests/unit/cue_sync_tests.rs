/*!
 * Tests for active cue lookup
 */

use histomap::cue_sync::{active_cue, active_cue_index};
use histomap::event_model::Cue;

fn reference_scan(cues: &[Cue], t: f64) -> Option<usize> {
    for (index, cue) in cues.iter().enumerate() {
        if cue.start <= t && t <= cue.end {
            return Some(index);
        }
    }
    None
}

#[test]
fn test_active_cue_withSharedBoundary_shouldReturnEarlierListedCue() {
    let a = Cue::new(0.0, 5.0, "A");
    let b = Cue::new(5.0, 10.0, "B");
    let cues = vec![a.clone(), b.clone()];

    assert_eq!(active_cue(&cues, 5.0), Some(&a));
    assert_eq!(active_cue(&cues, 10.0), Some(&b));
    assert_eq!(active_cue(&cues, 0.0), Some(&a));
    assert_eq!(active_cue(&cues, 10.5), None);
}

#[test]
fn test_active_cue_withReversedList_shouldStillPreferListOrder() {
    let cues = vec![Cue::new(5.0, 10.0, "B"), Cue::new(0.0, 5.0, "A")];
    assert_eq!(active_cue(&cues, 5.0).map(|c| c.text.as_str()), Some("B"));
}

#[test]
fn test_active_cue_withInvertedCue_shouldNeverMatchIt() {
    let cues = vec![Cue::new(8.0, 2.0, "broken"), Cue::new(0.0, 10.0, "whole")];
    assert_eq!(active_cue_index(&cues, 5.0), Some(1));
}

#[test]
fn test_active_cue_withNanTime_shouldReturnNone() {
    let cues = vec![Cue::new(0.0, 10.0, "A")];
    assert!(active_cue(&cues, f64::NAN).is_none());
}

#[test]
fn test_active_cue_withManyTimes_shouldMatchReferenceScan() {
    let cues = vec![
        Cue::new(0.0, 2.0, "a"),
        Cue::new(1.5, 3.0, "b"),
        Cue::new(3.0, 3.0, "c"),
        Cue::new(6.0, 9.0, "d"),
        Cue::new(2.5, 7.0, "e"),
    ];
    let mut t = -1.0;
    while t <= 11.0 {
        assert_eq!(active_cue_index(&cues, t), reference_scan(&cues, t), "t = {}", t);
        t += 0.25;
    }
}
