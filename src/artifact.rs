//! アラインメント成果物の保存と正規化
//!
//! 成果物は形式タグ付きのJSONとして保存する:
//!
//! ```json
//! {
//!   "schema": "fallback",
//!   "confidence": "approximate",
//!   "generated_at": "2025-01-02T14:30:15+09:00",
//!   "entries": [{"start_ms": 0, "end_ms": 2000, "text": "a"}]
//! }
//! ```
//!
//! タグの無い旧形式（`start_ms` を持つ配列、aeneas が直接書き出す `fragments`
//! オブジェクト）も読み込めるよう、タグが無い場合は構造から形式を推定する。

use crate::error::AlignError;
use crate::types::{AlignedLine, Confidence};
use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// aeneas 形式の断片
///
/// `begin`/`end` は秒。aeneas は文字列で書き出すので数値・文字列の両方を受け付ける。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default, deserialize_with = "deserialize_seconds")]
    pub begin: f64,
    #[serde(default, deserialize_with = "deserialize_seconds")]
    pub end: f64,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// フォールバック形式のエントリ (ミリ秒)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEntry {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// 成果物のペイロード
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum AlignmentSchema {
    /// 強制アラインメントツールの出力
    ForcedAlignment { fragments: Vec<Fragment> },

    /// 無音検出または等分割の出力
    Fallback { entries: Vec<FallbackEntry> },
}

impl AlignmentSchema {
    /// 秒単位の正規形に変換
    pub fn to_aligned_lines(&self) -> Vec<AlignedLine> {
        match self {
            AlignmentSchema::ForcedAlignment { fragments } => fragments
                .iter()
                .enumerate()
                .map(|(index, fragment)| AlignedLine {
                    index,
                    start_sec: fragment.begin,
                    end_sec: fragment.end,
                    text: fragment.lines.join(" "),
                })
                .collect(),
            AlignmentSchema::Fallback { entries } => entries
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    AlignedLine::from_millis(index, entry.start_ms, entry.end_ms, entry.text.as_str())
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AlignmentSchema::ForcedAlignment { fragments } => fragments.len(),
            AlignmentSchema::Fallback { entries } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 保存される成果物
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentArtifact {
    #[serde(flatten)]
    pub schema: AlignmentSchema,
    pub confidence: Confidence,
    pub generated_at: String,
}

impl AlignmentArtifact {
    pub fn new(schema: AlignmentSchema, confidence: Confidence) -> Self {
        Self {
            schema,
            confidence,
            generated_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// アラインメント済みの行からフォールバック形式の成果物を作る
    pub fn fallback(lines: &[AlignedLine], confidence: Confidence) -> Self {
        let entries = lines
            .iter()
            .map(|line| FallbackEntry {
                start_ms: line.start_ms(),
                end_ms: line.end_ms(),
                text: line.text.clone(),
            })
            .collect();
        Self::new(AlignmentSchema::Fallback { entries }, confidence)
    }

    /// 成果物を書き出す（既存ファイルは上書き）
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("出力ディレクトリの作成に失敗: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).with_context(|| "成果物のシリアライズに失敗")?;
        fs::write(path, json).with_context(|| format!("成果物の書き込みに失敗: {:?}", path))?;

        log::info!("アラインメント成果物を保存: {:?} ({}件)", path, self.schema.len());
        Ok(())
    }
}

/// 正規化済みのアラインメント
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedAlignment {
    pub lines: Vec<AlignedLine>,

    /// タグ付き成果物の場合のみ
    pub confidence: Option<Confidence>,
}

/// JSON値から形式を判定してペイロードを取り出す
///
/// 判定順:
/// 1. `schema` キーを持つオブジェクト → タグ付き成果物
/// 2. `fragments` キーを持つオブジェクト → aeneas 形式
/// 3. 空配列 → 0件のフォールバック形式
/// 4. 先頭要素が `start_ms` を持つ配列 → フォールバック形式
pub fn parse_value(value: Value) -> std::result::Result<(AlignmentSchema, Option<Confidence>), String> {
    if value.get("schema").is_some() {
        let artifact: AlignmentArtifact = serde_json::from_value(value).map_err(|e| e.to_string())?;
        return Ok((artifact.schema, Some(artifact.confidence)));
    }

    if let Some(fragments) = value.get("fragments") {
        let fragments: Vec<Fragment> =
            serde_json::from_value(fragments.clone()).map_err(|e| e.to_string())?;
        return Ok((AlignmentSchema::ForcedAlignment { fragments }, None));
    }

    let is_fallback_list = match value.as_array() {
        Some(items) if items.is_empty() => {
            return Ok((AlignmentSchema::Fallback { entries: Vec::new() }, None));
        }
        Some(items) => items[0].get("start_ms").is_some(),
        None => false,
    };

    if is_fallback_list {
        let entries: Vec<FallbackEntry> = serde_json::from_value(value).map_err(|e| e.to_string())?;
        return Ok((AlignmentSchema::Fallback { entries }, None));
    }

    Err("未知の成果物形式です".to_string())
}

/// 成果物ファイルを読み込んで形式を判定
pub fn read_schema<P: AsRef<Path>>(
    path: P,
) -> std::result::Result<(AlignmentSchema, Option<Confidence>), AlignError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| AlignError::malformed(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| AlignError::malformed(path, e))?;
    parse_value(value).map_err(|message| AlignError::malformed(path, message))
}

/// 成果物ファイルを正規形に変換 (失敗をエラーとして返す)
pub fn try_normalize<P: AsRef<Path>>(path: P) -> std::result::Result<NormalizedAlignment, AlignError> {
    let (schema, confidence) = read_schema(path)?;
    Ok(NormalizedAlignment {
        lines: schema.to_aligned_lines(),
        confidence,
    })
}

/// 成果物ファイルを正規形に変換
///
/// 読めない・解釈できない場合はエラーをログに記録して空の列を返す。
/// 呼び出し側は空の結果を「アラインメント不可」として扱うこと。
pub fn normalize<P: AsRef<Path>>(path: P) -> Vec<AlignedLine> {
    match try_normalize(path) {
        Ok(normalized) => normalized.lines,
        Err(e) => {
            log::error!("{}", e);
            Vec::new()
        }
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(value) => Ok(value),
        Seconds::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| de::Error::custom(format!("秒数として解釈できません: {:?}: {}", text, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn temp_json(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_legacy_fallback_schema() {
        let file = temp_json(r#"[{"start_ms": 1000, "end_ms": 3000, "text": "hello"}]"#);

        let lines = normalize(file.path());

        assert_eq!(
            lines,
            vec![AlignedLine {
                index: 0,
                start_sec: 1.0,
                end_sec: 3.0,
                text: "hello".to_string()
            }]
        );
    }

    #[test]
    fn test_native_aeneas_schema() {
        let file = temp_json(
            r#"{
  "fragments": [
    {"begin": "0.000", "end": "2.480", "id": "f000001", "language": "eng", "lines": ["first line"], "children": []},
    {"begin": "2.480", "end": "5.120", "id": "f000002", "language": "eng", "lines": ["second line"], "children": []}
  ]
}"#,
        );

        let normalized = try_normalize(file.path()).unwrap();

        assert_eq!(normalized.confidence, None);
        assert_eq!(normalized.lines.len(), 2);
        assert_eq!(normalized.lines[1].index, 1);
        assert_eq!(normalized.lines[1].start_sec, 2.48);
        assert_eq!(normalized.lines[1].end_sec, 5.12);
        assert_eq!(normalized.lines[1].text, "second line");
    }

    #[test]
    fn test_numeric_fragment_times() {
        let file = temp_json(r#"{"fragments": [{"begin": 1.5, "end": 2, "lines": ["x"]}]}"#);

        let lines = normalize(file.path());

        assert_eq!((lines[0].start_sec, lines[0].end_sec), (1.5, 2.0));
    }

    #[test]
    fn test_tagged_artifact_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("out").join("song_alignment.json");
        let lines = vec![
            AlignedLine::from_millis(0, 0, 2000, "a"),
            AlignedLine::from_millis(1, 2500, 5000, "b"),
        ];

        AlignmentArtifact::fallback(&lines, Confidence::Approximate).write(&path)?;

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(raw["schema"], "fallback");
        assert_eq!(raw["confidence"], "approximate");
        assert_eq!(raw["entries"][1]["start_ms"], 2500);

        let normalized = try_normalize(&path).unwrap();
        assert_eq!(normalized.confidence, Some(Confidence::Approximate));
        assert_eq!(normalized.lines, lines);

        Ok(())
    }

    #[test]
    fn test_tagged_forced_alignment_artifact() {
        let artifact = AlignmentArtifact::new(
            AlignmentSchema::ForcedAlignment {
                fragments: vec![Fragment {
                    begin: 0.25,
                    end: 1.75,
                    lines: vec!["hi".to_string()],
                    id: None,
                }],
            },
            Confidence::Precise,
        );
        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["schema"], "forced_alignment");

        let (schema, confidence) = parse_value(value).unwrap();
        assert_eq!(confidence, Some(Confidence::Precise));
        assert_eq!(schema.to_aligned_lines()[0].end_sec, 1.75);
    }

    #[test]
    fn test_empty_file_is_malformed() {
        let file = temp_json("");

        assert!(normalize(file.path()).is_empty());
        assert!(matches!(
            try_normalize(file.path()),
            Err(AlignError::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_malformed() {
        assert!(normalize("no_such_alignment.json").is_empty());
    }

    #[test]
    fn test_unknown_shape_is_malformed() {
        let file = temp_json(r#"{"segments": []}"#);
        assert!(try_normalize(file.path()).is_err());

        let file = temp_json(r#"[{"begin": 1}]"#);
        assert!(try_normalize(file.path()).is_err());
    }

    #[test]
    fn test_bad_fragment_time_is_malformed() {
        let file = temp_json(r#"{"fragments": [{"begin": "soon", "end": "1.0", "lines": ["x"]}]}"#);
        assert!(normalize(file.path()).is_empty());
    }

    #[test]
    fn test_empty_list_is_valid_and_empty() {
        let file = temp_json("[]");
        let normalized = try_normalize(file.path()).unwrap();
        assert!(normalized.lines.is_empty());
    }
}
