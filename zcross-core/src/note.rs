//! # Note Naming Module
//!
//! Maps frequencies to equal-tempered note names such as "A4", "C#3" or
//! "Eb2-12.50%". A4 is MIDI note 69 at 440 Hz and the octave number
//! changes at C, so middle C (MIDI 60) is "C4".
//!
//! When a frequency is off the nearest note, the name gets a `+` (sharp)
//! or `-` (flat) marker and the deviation in percent of a semitone.
//! Frequencies that have no note, including the 0 Hz "no pitch"
//! sentinel, are shown as "?".

/// Frequency of A4 in Hz.
pub const FREQ_A4: f32 = 440.0;

/// MIDI note number of A4.
pub const MIDI_A4: f32 = 69.0;

/// Deviations at or below this many semitones are not shown.
const DEVIATION_THRESHOLD: f32 = 1e-4;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Shown for frequencies that have no note name.
pub const UNKNOWN_NOTE: &str = "?";

/// Converts a frequency in Hz to a fractional MIDI note number.
///
/// 0 Hz gives negative infinity and negative input gives NaN.
pub fn freq_to_midi(freq: f32) -> f32 {
    12.0 * (freq.log2() - FREQ_A4.log2()) + MIDI_A4
}

/// Converts a fractional MIDI note number to a frequency in Hz.
pub fn midi_to_freq(midi: f32) -> f32 {
    FREQ_A4 * 2.0_f32.powf((midi - MIDI_A4) / 12.0)
}

/// Formats a fractional MIDI note number as a note name.
///
/// # Arguments
/// * `midi` - MIDI note number, possibly off the semitone grid
/// * `sharp` - use sharps ("C#") instead of flats ("Db") for black keys
pub fn midi_to_str(midi: f32, sharp: bool) -> String {
    if !midi.is_finite() {
        return UNKNOWN_NOTE.to_string();
    }

    let nearest = midi.round();
    let deviation = midi - nearest;
    let nearest = nearest as i64;

    let names = if sharp { &SHARP_NAMES } else { &FLAT_NAMES };
    let name = names[nearest.rem_euclid(12) as usize];
    let octave = nearest.div_euclid(12) - 1;

    if deviation.abs() > DEVIATION_THRESHOLD {
        let marker = if deviation > 0.0 { '+' } else { '-' };
        format!("{name}{octave}{marker}{:.2}%", deviation.abs() * 100.0)
    } else {
        format!("{name}{octave}")
    }
}

/// Formats a frequency in Hz as a note name with sharps.
pub fn freq_to_str(freq: f32) -> String {
    midi_to_str(freq_to_midi(freq), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_pitches_have_plain_names() {
        assert_eq!(freq_to_str(440.0), "A4");
        assert_eq!(freq_to_str(880.0), "A5");
        assert_eq!(midi_to_str(60.0, true), "C4");
        assert_eq!(midi_to_str(21.0, true), "A0");
        assert_eq!(midi_to_str(0.0, true), "C-1");
    }

    #[test]
    fn black_keys_follow_the_naming_choice() {
        assert_eq!(midi_to_str(61.0, true), "C#4");
        assert_eq!(midi_to_str(61.0, false), "Db4");
        assert_eq!(midi_to_str(70.0, false), "Bb4");
    }

    #[test]
    fn off_grid_pitches_show_the_deviation() {
        assert_eq!(midi_to_str(69.25, true), "A4+25.00%");
        assert_eq!(midi_to_str(59.9, true), "C4-10.00%");
        // Rounds to the nearest note across the octave boundary.
        assert_eq!(midi_to_str(71.6, true), "C5-40.00%");
    }

    #[test]
    fn silence_and_garbage_are_unknown() {
        assert_eq!(freq_to_str(0.0), UNKNOWN_NOTE);
        assert_eq!(freq_to_str(-3.0), UNKNOWN_NOTE);
        assert_eq!(freq_to_str(f32::NAN), UNKNOWN_NOTE);
    }

    #[test]
    fn midi_conversion_is_reversible() {
        for midi in [21.0f32, 48.5, 69.0, 108.0] {
            assert!((freq_to_midi(midi_to_freq(midi)) - midi).abs() < 1e-3);
        }
    }
}
