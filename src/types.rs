use serde::{Deserialize, Serialize};

/// 16ビット整数型のオーディオサンプル
///
/// PCM形式の音声データを表現するための型エイリアス。
/// -32768 から 32767 の範囲の値を取る。
pub type SampleI16 = i16;

/// 歌詞の1行
///
/// 空行を除いた後のファイル内の順序で `index` が振られる (0始まり、連番)。
///
/// # Examples
///
/// ```
/// # use lyric_align::types::LyricLine;
/// let line = LyricLine {
///     index: 0,
///     text: "twinkle twinkle little star".to_string(),
/// };
/// assert_eq!(line.index, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    /// 空行除去後の位置
    pub index: usize,

    /// 前後の空白を除去した行テキスト (空でない)
    pub text: String,
}

/// 無音区間 (ミリ秒)
///
/// エネルギーが閾値を下回り続けた区間。`start_ms` の昇順で、互いに重ならない。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SilenceInterval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SilenceInterval {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// 音声区間 (ミリ秒)
///
/// 無音区間の補集合。歌詞1行の候補となる区間。
/// 隣接する無音区間が接している場合は長さ0になることがある。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeechSegment {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SpeechSegment {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// 長さ0の区間かどうか
    pub fn is_empty(&self) -> bool {
        self.end_ms <= self.start_ms
    }
}

/// アラインメント済みの歌詞行
///
/// 字幕描画側が受け取る正規形。時刻は秒単位。
///
/// # JSON出力例
///
/// ```json
/// {
///   "index": 0,
///   "start_sec": 1.0,
///   "end_sec": 3.0,
///   "text": "hello"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignedLine {
    pub index: usize,
    pub start_sec: f64,
    pub end_sec: f64,
    pub text: String,
}

impl AlignedLine {
    /// ミリ秒単位の境界から作成
    ///
    /// # Examples
    ///
    /// ```
    /// # use lyric_align::types::AlignedLine;
    /// let line = AlignedLine::from_millis(0, 1000, 3000, "hello");
    /// assert_eq!(line.start_sec, 1.0);
    /// assert_eq!(line.end_sec, 3.0);
    /// ```
    pub fn from_millis(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_sec: start_ms as f64 / 1000.0,
            end_sec: end_ms as f64 / 1000.0,
            text: text.into(),
        }
    }

    pub fn start_ms(&self) -> u64 {
        (self.start_sec * 1000.0).round() as u64
    }

    pub fn end_ms(&self) -> u64 {
        (self.end_sec * 1000.0).round() as u64
    }
}

/// アラインメント精度の目安
///
/// どの段階のアラインメントで結果が得られたかを表す。
/// 成果物と一緒に保存され、描画側が判断に使う。
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// 外部の強制アラインメントツールによる結果
    Precise,

    /// 無音検出に基づく区間割り当て
    Approximate,

    /// 等分割 (実際の発声タイミングは無視)
    Uniform,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_line_millis_conversion() {
        let line = AlignedLine::from_millis(2, 1500, 2750, "la la");
        assert_eq!(line.index, 2);
        assert_eq!(line.start_sec, 1.5);
        assert_eq!(line.end_sec, 2.75);
        assert_eq!(line.start_ms(), 1500);
        assert_eq!(line.end_ms(), 2750);
    }

    #[test]
    fn test_segment_empty() {
        assert!(SpeechSegment::new(2000, 2000).is_empty());
        assert!(!SpeechSegment::new(2000, 2001).is_empty());
        assert_eq!(SpeechSegment::new(0, 2000).duration_ms(), 2000);
    }

    #[test]
    fn test_confidence_serialization() {
        let json = serde_json::to_string(&Confidence::Approximate).unwrap();
        assert_eq!(json, r#""approximate""#);

        let deserialized: Confidence = serde_json::from_str(r#""precise""#).unwrap();
        assert_eq!(deserialized, Confidence::Precise);
    }

    #[test]
    fn test_aligned_line_json_serialization() {
        let line = AlignedLine::from_millis(0, 1000, 3000, "hello");
        let json = serde_json::to_string(&line).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["index"], 0);
        assert_eq!(parsed["start_sec"], 1.0);
        assert_eq!(parsed["text"], "hello");
    }
}
