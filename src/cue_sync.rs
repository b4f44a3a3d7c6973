/*!
 * Cue synchronization.
 *
 * Maps a playback timestamp to the subtitle cue that should be visible.
 * Cue lists are small (tens of entries), so a linear scan in list order is
 * used. List order matters: when two cues both contain the timestamp, e.g.
 * `A.end == B.start == t`, the earlier-listed cue wins.
 */

use crate::event_model::Cue;

/// Return the first cue in list order whose inclusive interval contains `t`
pub fn active_cue(cues: &[Cue], t: f64) -> Option<&Cue> {
    active_cue_index(cues, t).map(|index| &cues[index])
}

/// Index variant of [`active_cue`]
pub fn active_cue_index(cues: &[Cue], t: f64) -> Option<usize> {
    cues.iter().position(|cue| cue.contains(t))
}
