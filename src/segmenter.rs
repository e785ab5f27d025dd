use crate::types::{SilenceInterval, SpeechSegment};

/// 無音区間から音声区間を作る
///
/// 1. 最初の無音が0msから始まらなければ `[0, 最初の無音の開始)` を先頭区間とする
/// 2. 隣接する無音の間 `[silence[i].end, silence[i+1].start)` を区間とする
/// 3. 最後の無音が音声の終端で終わらなければ `[最後の無音の終了, duration_ms)` を末尾区間とする
///
/// 無音が0件なら区間も0件（呼び出し側は等分割にフォールバックする）。
/// 接している無音の間には長さ0の区間ができる。
///
/// # Examples
///
/// ```
/// # use lyric_align::segmenter::segments_from_silences;
/// # use lyric_align::types::{SilenceInterval, SpeechSegment};
/// let segments = segments_from_silences(&[SilenceInterval::new(2000, 2500)], 5000);
/// assert_eq!(
///     segments,
///     vec![SpeechSegment::new(0, 2000), SpeechSegment::new(2500, 5000)]
/// );
/// ```
pub fn segments_from_silences(silences: &[SilenceInterval], duration_ms: u64) -> Vec<SpeechSegment> {
    let (Some(first), Some(last)) = (silences.first(), silences.last()) else {
        return Vec::new();
    };

    let mut segments = Vec::with_capacity(silences.len() + 1);

    if first.start_ms > 0 {
        segments.push(SpeechSegment::new(0, first.start_ms));
    }

    segments.extend(
        silences
            .windows(2)
            .map(|pair| SpeechSegment::new(pair[0].end_ms, pair[1].start_ms)),
    );

    if last.end_ms < duration_ms {
        segments.push(SpeechSegment::new(last.end_ms, duration_ms));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_silences_no_segments() {
        assert!(segments_from_silences(&[], 9000).is_empty());
    }

    #[test]
    fn test_leading_between_and_trailing() {
        let silences = [
            SilenceInterval::new(1000, 1500),
            SilenceInterval::new(4000, 4600),
        ];
        let segments = segments_from_silences(&silences, 8000);

        assert_eq!(
            segments,
            vec![
                SpeechSegment::new(0, 1000),
                SpeechSegment::new(1500, 4000),
                SpeechSegment::new(4600, 8000),
            ]
        );
    }

    #[test]
    fn test_silence_at_edges_skips_edge_segments() {
        let silences = [
            SilenceInterval::new(0, 700),
            SilenceInterval::new(3000, 3500),
            SilenceInterval::new(7200, 8000),
        ];
        let segments = segments_from_silences(&silences, 8000);

        assert_eq!(
            segments,
            vec![SpeechSegment::new(700, 3000), SpeechSegment::new(3500, 7200)]
        );
    }

    #[test]
    fn test_touching_silences_yield_empty_segment() {
        let silences = [
            SilenceInterval::new(1000, 2000),
            SilenceInterval::new(2000, 2600),
        ];
        let segments = segments_from_silences(&silences, 4000);

        assert_eq!(segments.len(), 3);
        assert!(segments[1].is_empty());
    }

    #[test]
    fn test_segments_and_silences_cover_duration() {
        let duration = 10_000;
        let silences = [
            SilenceInterval::new(1200, 1800),
            SilenceInterval::new(5000, 5900),
            SilenceInterval::new(8100, 8700),
        ];
        let segments = segments_from_silences(&silences, duration);

        let covered: u64 = segments.iter().map(SpeechSegment::duration_ms).sum::<u64>()
            + silences.iter().map(SilenceInterval::duration_ms).sum::<u64>();
        assert_eq!(covered, duration);

        for pair in segments.windows(2) {
            assert!(pair[0].end_ms <= pair[1].start_ms);
        }
    }
}
