use crate::error::AlignError;
use crate::types::{AlignedLine, LyricLine};

/// 音声全体を歌詞行数で等分割する
///
/// 行 `i` は `[floor(i·D/n), floor((i+1)·D/n))` を受け持つ。隙間も重なりもなく
/// `[0, D)` 全体を覆うが、実際の発声タイミングは無視する。
///
/// # Errors
///
/// 歌詞が0行の場合は [`AlignError::DivisionPrecondition`]。
/// 回復可能なエラーではないので、呼び出し側で事前に防ぐこと。
///
/// # Examples
///
/// ```
/// # use lyric_align::equal_division::divide;
/// # use lyric_align::lyrics::parse_lyrics;
/// let aligned = divide(&parse_lyrics("a\nb\nc"), 9000).unwrap();
/// assert_eq!(aligned[1].start_ms(), 3000);
/// assert_eq!(aligned[1].end_ms(), 6000);
/// ```
pub fn divide(lines: &[LyricLine], duration_ms: u64) -> Result<Vec<AlignedLine>, AlignError> {
    if lines.is_empty() {
        return Err(AlignError::DivisionPrecondition);
    }

    let count = lines.len() as u64;
    let boundary = |i: u64| i * duration_ms / count;

    Ok(lines
        .iter()
        .zip(0u64..)
        .map(|(line, i)| {
            AlignedLine::from_millis(line.index, boundary(i), boundary(i + 1), line.text.as_str())
        })
        .collect())
}
