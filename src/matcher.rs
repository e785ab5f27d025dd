use crate::types::{AlignedLine, LyricLine, SpeechSegment};

/// 区間数が歌詞行数に対して足りているか
///
/// 1行が無音をまたぐことを許すため、区間は行数より1つ少なくてもよい。
pub fn can_match(line_count: usize, segment_count: usize) -> bool {
    segment_count >= line_count.saturating_sub(1)
}

/// 音声区間を歌詞行に位置で対応付ける
///
/// 行 `i` には区間 `i` の境界を割り当てる。区間が尽きた後の行はすべて
/// 同じ末尾窓 `[最後の区間の終了, duration_ms)` を共有する（残り時間を分割しない）。
/// テキストの類似度は見ず、並べ替えも行わない。
///
/// 余った区間は捨てられる。長さ0の区間もそのまま割り当てる。
///
/// # Examples
///
/// ```
/// # use lyric_align::matcher::match_lines;
/// # use lyric_align::lyrics::parse_lyrics;
/// # use lyric_align::types::SpeechSegment;
/// let lines = parse_lyrics("a\nb");
/// let segments = [SpeechSegment::new(0, 2000), SpeechSegment::new(2500, 5000)];
/// let aligned = match_lines(&lines, &segments, 5000);
/// assert_eq!((aligned[1].start_sec, aligned[1].end_sec), (2.5, 5.0));
/// ```
pub fn match_lines(lines: &[LyricLine], segments: &[SpeechSegment], duration_ms: u64) -> Vec<AlignedLine> {
    let tail_start = segments.last().map_or(0, |segment| segment.end_ms);

    if lines.len() > segments.len() {
        log::debug!(
            "区間不足: 末尾 {} 行を [{}ms, {}ms) に割り当てます",
            lines.len() - segments.len(),
            tail_start,
            duration_ms
        );
    }

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| match segments.get(i) {
            Some(segment) => {
                AlignedLine::from_millis(line.index, segment.start_ms, segment.end_ms, line.text.as_str())
            }
            None => AlignedLine::from_millis(line.index, tail_start, duration_ms, line.text.as_str()),
        })
        .collect()
}
