use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

pub const WPM_RANGE: RangeInclusive<f64> = 10.0..=300.0;
pub const ACCURACY_RANGE: RangeInclusive<f64> = 70.0..=100.0;

/// Characters per word used to turn WPM into a per-character interval.
pub const CHARS_PER_WORD: f64 = 5.0;

const TYPO_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Outcome of processing one source character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterDecision {
    /// What actually gets emitted first
    pub typed: char,
    /// The source character; differs from `typed` only on a mistake
    pub intended: char,
    pub mistake: bool,
}

impl CharacterDecision {
    pub fn correct(c: char) -> Self {
        Self {
            typed: c,
            intended: c,
            mistake: false,
        }
    }
}

/// Decide whether `c` is typed correctly at the given accuracy percentage.
///
/// Whitespace is never mistyped. For anything else a draw in `[0, 100)` at or
/// above `accuracy` turns into a random lowercase letter, which may happen to
/// equal `c`.
pub fn decide<R: Rng>(c: char, accuracy: f64, rng: &mut R) -> CharacterDecision {
    if c.is_whitespace() {
        return CharacterDecision::correct(c);
    }

    if rng.gen_range(0.0..100.0) < accuracy {
        return CharacterDecision::correct(c);
    }

    let typo = TYPO_LETTERS[rng.gen_range(0..TYPO_LETTERS.len())] as char;
    CharacterDecision {
        typed: typo,
        intended: c,
        mistake: true,
    }
}

/// Base per-character interval in milliseconds, before jitter.
pub fn base_interval_ms(wpm: f64) -> f64 {
    let chars_per_minute = (wpm * CHARS_PER_WORD).max(1.0);
    60_000.0 / chars_per_minute
}

/// Extra pause range after punctuation, if any.
pub fn punctuation_pause_ms(c: char) -> Option<(f64, f64)> {
    match c {
        '.' | '!' | '?' => Some((120.0, 320.0)),
        ',' | ';' => Some((70.0, 180.0)),
        _ => None,
    }
}

/// Delay before the step after `just_typed`.
pub fn char_delay<R: Rng>(wpm: f64, just_typed: char, rng: &mut R) -> Duration {
    let jitter = rng.gen_range(0.85..1.2);
    let mut pause = base_interval_ms(wpm) * jitter;

    if let Some((lo, hi)) = punctuation_pause_ms(just_typed) {
        pause += rng.gen_range(lo..hi);
    }

    Duration::from_secs_f64(pause / 1000.0)
}

/// Time between a typo and its backspace-and-retype.
pub fn correction_delay<R: Rng>(rng: &mut R) -> Duration {
    Duration::from_secs_f64(rng.gen_range(90.0..190.0) / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn full_accuracy_never_mistypes() {
        let mut rng = rng();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        assert!(text.chars().count() >= 1000);
        for c in text.chars() {
            let d = decide(c, 100.0, &mut rng);
            assert!(!d.mistake);
            assert_eq!(d.typed, c);
        }
    }

    #[test]
    fn accuracy_just_under_full_can_mistype() {
        let mut rng = rng();
        let mistakes = (0..20_000)
            .filter(|_| decide('x', 99.5, &mut rng).mistake)
            .count();
        assert!(mistakes > 0);
    }

    #[test]
    fn whitespace_is_never_mistyped() {
        let mut rng = rng();
        for c in [' ', '\n', '\t'] {
            for _ in 0..1000 {
                let d = decide(c, 70.0, &mut rng);
                assert_eq!(d, CharacterDecision::correct(c));
            }
        }
    }

    #[test]
    fn mistakes_are_lowercase_letters_and_keep_intended() {
        let mut rng = rng();
        let mut seen = 0;
        for _ in 0..2000 {
            let d = decide('Q', 70.0, &mut rng);
            if d.mistake {
                seen += 1;
                assert!(d.typed.is_ascii_lowercase());
                assert_eq!(d.intended, 'Q');
            } else {
                assert_eq!(d.typed, 'Q');
            }
        }
        // ~30% expected
        assert!(seen > 400 && seen < 800, "got {seen} mistakes");
    }

    #[test]
    fn base_interval_uses_five_chars_per_word() {
        assert!((base_interval_ms(60.0) - 200.0).abs() < 1e-9);
        assert!((base_interval_ms(300.0) - 40.0).abs() < 1e-9);
        assert!((base_interval_ms(0.0) - 60_000.0).abs() < 1e-9);
    }

    #[test]
    fn delay_stays_within_jitter_bounds() {
        let mut rng = rng();
        for _ in 0..500 {
            let ms = char_delay(60.0, 'a', &mut rng).as_secs_f64() * 1000.0;
            assert!((170.0 - 1e-3..240.0).contains(&ms), "{ms}");
        }
    }

    #[test]
    fn sentence_and_clause_pauses() {
        let mut rng = rng();
        for _ in 0..500 {
            let ms = char_delay(300.0, '.', &mut rng).as_secs_f64() * 1000.0;
            assert!((34.0 - 1e-3..48.0 + 320.0).contains(&ms));
            assert!(ms >= 34.0 + 120.0 - 1e-3);

            let ms = char_delay(300.0, ';', &mut rng).as_secs_f64() * 1000.0;
            assert!(ms >= 34.0 + 70.0 - 1e-3 && ms < 48.0 + 180.0);
        }
        assert_eq!(punctuation_pause_ms('?'), Some((120.0, 320.0)));
        assert_eq!(punctuation_pause_ms(','), Some((70.0, 180.0)));
        assert_eq!(punctuation_pause_ms(':'), None);
    }

    #[test]
    fn correction_delay_bounds() {
        let mut rng = rng();
        for _ in 0..500 {
            let ms = correction_delay(&mut rng).as_secs_f64() * 1000.0;
            assert!((90.0 - 1e-3..190.0).contains(&ms));
        }
    }
}
