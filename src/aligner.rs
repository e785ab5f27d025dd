use crate::artifact::{self, AlignmentArtifact, AlignmentSchema};
use crate::config::Config;
use crate::equal_division;
use crate::error::AlignError;
use crate::forced_aligner::{AeneasAligner, ForcedAligner};
use crate::lyrics;
use crate::matcher;
use crate::segmenter;
use crate::silence::SilenceDetector;
use crate::types::{AlignedLine, Confidence, LyricLine};
use crate::wav_reader;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// アラインメントの段階
///
/// 各段階はリクエストごとに高々1回だけ試行する。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignState {
    /// 外部ツールによる強制アラインメント
    ForcedAlignmentAttempt,

    /// 無音検出による区間割り当て
    SilenceDetectionAttempt,

    /// 等分割
    EqualDivisionFallback,
}

/// 段階間の遷移理由
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// 歌詞が0行だったので何も試行しなかった
    NoLyrics,
    ForcedAlignmentSucceeded,
    /// ツールが存在しない、または無効
    ForcedAlignmentUnavailable,
    /// ツールの実行失敗、または出力が使えない
    ForcedAlignmentFailed,
    SilenceSegmentsMatched,
    /// 無音区間が歌詞行数に対して足りない
    InsufficientSegments,
    /// 音声のデコードに失敗
    SilenceDetectionFailed,
    EqualDivisionApplied,
}

/// 1回のアラインメントの結果
#[derive(Clone, Debug)]
pub struct AlignmentOutcome {
    pub artifact_path: PathBuf,
    pub lines: Vec<AlignedLine>,
    pub confidence: Confidence,
    pub transitions: Vec<Transition>,
}

/// バッチ処理の1件
#[derive(Clone, Debug)]
pub struct AlignJob {
    pub audio: PathBuf,
    pub lyrics: PathBuf,
    pub output: Option<PathBuf>,
}

/// アラインメントの入口
///
/// 強制アラインメント → 無音検出 → 等分割 の順に試し、最初に成功した結果を
/// タグ付き成果物として保存する。1回のアラインメントは呼び出しスレッドで逐次実行される。
///
/// ```text
/// [ForcedAlignmentAttempt] --成功--> 保存 (Precise)
///          │ 失敗/不在
///          ↓
/// [SilenceDetectionAttempt] --区間が足りる--> 保存 (Approximate)
///          │ 不足/デコード失敗
///          ↓
/// [EqualDivisionFallback] --> 保存 (Uniform)
/// ```
pub struct Aligner {
    config: Config,
    forced_aligner: Option<Box<dyn ForcedAligner>>,
    detector: SilenceDetector,
}

impl Aligner {
    /// 設定に従って aeneas アダプタを使う
    pub fn new(config: Config) -> Self {
        let forced_aligner = AeneasAligner::new(config.forced_aligner.clone());
        Self::with_forced_aligner(config, Box::new(forced_aligner))
    }

    pub fn with_forced_aligner(config: Config, forced_aligner: Box<dyn ForcedAligner>) -> Self {
        let detector = SilenceDetector::new(&config.silence);
        Self {
            config,
            forced_aligner: Some(forced_aligner),
            detector,
        }
    }

    /// 強制アラインメントを使わない
    pub fn without_forced_aligner(config: Config) -> Self {
        let detector = SilenceDetector::new(&config.silence);
        Self {
            config,
            forced_aligner: None,
            detector,
        }
    }

    /// 既定の成果物パス: `<alignment_dir>/<音声のベース名>_alignment.json`
    pub fn default_output_path(&self, audio: &Path) -> PathBuf {
        let base_name = audio
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        Path::new(&self.config.output.alignment_dir).join(format!("{}_alignment.json", base_name))
    }

    /// 音声と歌詞をアラインメントして成果物を保存
    ///
    /// `output` が `None` の場合は [`Aligner::default_output_path`] に書き出す。
    /// 同じパスへの再実行は成果物を上書きする。
    ///
    /// # Errors
    ///
    /// 成果物の書き込みに失敗した場合、または等分割に必要な音声の長さすら
    /// 取得できない場合にエラーを返す。
    pub fn align(&self, audio: &Path, lyrics_path: &Path, output: Option<&Path>) -> Result<AlignmentOutcome> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_output_path(audio));
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("出力ディレクトリの作成に失敗: {:?}", parent))?;
        }

        let lines = lyrics::read_lyrics(lyrics_path);
        if lines.is_empty() {
            log::warn!("歌詞が空です。空の成果物を保存します: {:?}", lyrics_path);
            return self.finish(&output, Vec::new(), Confidence::Uniform, vec![Transition::NoLyrics]);
        }

        log::info!("アラインメント開始: {:?} ({}行)", audio, lines.len());

        let mut transitions = Vec::new();
        let mut duration_ms: Option<u64> = None;
        let mut state = AlignState::ForcedAlignmentAttempt;

        loop {
            log::debug!("{:?}: {:?}", audio, state);
            state = match state {
                AlignState::ForcedAlignmentAttempt => {
                    match self.try_forced_alignment(audio, lyrics_path, &output) {
                        Ok(schema) => {
                            transitions.push(Transition::ForcedAlignmentSucceeded);
                            return self.finish_forced(&output, schema, transitions);
                        }
                        Err(e) => {
                            log::warn!("強制アラインメント失敗、無音検出にフォールバック: {}", e);
                            transitions.push(match e {
                                AlignError::ToolUnavailable { .. } => {
                                    Transition::ForcedAlignmentUnavailable
                                }
                                _ => Transition::ForcedAlignmentFailed,
                            });
                            AlignState::SilenceDetectionAttempt
                        }
                    }
                }
                AlignState::SilenceDetectionAttempt => match wav_reader::read_wav(audio) {
                    Ok(decoded) => {
                        let duration = decoded.duration_ms();
                        duration_ms = Some(duration);
                        match self.try_silence_alignment(&lines, &decoded) {
                            Ok(aligned) => {
                                transitions.push(Transition::SilenceSegmentsMatched);
                                return self.finish(&output, aligned, Confidence::Approximate, transitions);
                            }
                            Err(e) => {
                                log::warn!("{}。等分割にフォールバック", e);
                                transitions.push(Transition::InsufficientSegments);
                                AlignState::EqualDivisionFallback
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("無音検出に失敗、等分割にフォールバック: {:#}", e);
                        transitions.push(Transition::SilenceDetectionFailed);
                        AlignState::EqualDivisionFallback
                    }
                },
                AlignState::EqualDivisionFallback => {
                    let duration = match duration_ms {
                        Some(duration) => duration,
                        None => wav_reader::header_duration_ms(audio)
                            .with_context(|| format!("音声の長さを取得できません: {:?}", audio))?,
                    };
                    let aligned = equal_division::divide(&lines, duration)?;
                    transitions.push(Transition::EqualDivisionApplied);
                    return self.finish(&output, aligned, Confidence::Uniform, transitions);
                }
            };
        }
    }

    /// 複数の音声/歌詞の組を並列にアラインメント
    ///
    /// 各組は独立して実行される。成果物パスが重複した場合は後から書いた方が残る。
    pub fn align_batch(&self, jobs: &[AlignJob]) -> Vec<Result<AlignmentOutcome>> {
        jobs.par_iter()
            .map(|job| self.align(&job.audio, &job.lyrics, job.output.as_deref()))
            .collect()
    }

    fn try_forced_alignment(
        &self,
        audio: &Path,
        lyrics_path: &Path,
        output: &Path,
    ) -> std::result::Result<AlignmentSchema, AlignError> {
        let forced_aligner = self
            .forced_aligner
            .as_ref()
            .ok_or_else(|| AlignError::tool_unavailable("-", "強制アラインメントツールが未設定です"))?;

        let written = forced_aligner.align(audio, lyrics_path, output)?;
        // タグ付きの成果物はこのクレートが書いたものなので、ツールの出力とは認めない
        match artifact::read_schema(&written)? {
            (schema @ AlignmentSchema::ForcedAlignment { .. }, None) if !schema.is_empty() => Ok(schema),
            (AlignmentSchema::ForcedAlignment { .. }, None) => {
                Err(AlignError::tool_failure(forced_aligner.name(), "結果が0件です"))
            }
            (schema, confidence) => Err(AlignError::tool_failure(
                forced_aligner.name(),
                format!(
                    "ツールの出力ではありません: {:?} ({}件, confidence={:?})",
                    written,
                    schema.len(),
                    confidence
                ),
            )),
        }
    }

    fn try_silence_alignment(
        &self,
        lines: &[LyricLine],
        decoded: &wav_reader::DecodedAudio,
    ) -> std::result::Result<Vec<AlignedLine>, AlignError> {
        let silences = self.detector.detect(decoded);
        let insufficient = || AlignError::InsufficientSegments {
            silences: silences.len(),
            lines: lines.len(),
        };

        if !matcher::can_match(lines.len(), silences.len()) {
            return Err(insufficient());
        }

        let segments = segmenter::segments_from_silences(&silences, decoded.duration_ms());
        if segments.is_empty() && lines.len() > 1 {
            return Err(insufficient());
        }

        log::debug!(
            "無音 {}件 → 音声区間 {}件 → 歌詞 {}行",
            silences.len(),
            segments.len(),
            lines.len()
        );
        Ok(matcher::match_lines(lines, &segments, decoded.duration_ms()))
    }

    fn finish_forced(
        &self,
        output: &Path,
        schema: AlignmentSchema,
        transitions: Vec<Transition>,
    ) -> Result<AlignmentOutcome> {
        let lines = schema.to_aligned_lines();
        AlignmentArtifact::new(schema, Confidence::Precise).write(output)?;
        Ok(AlignmentOutcome {
            artifact_path: output.to_path_buf(),
            lines,
            confidence: Confidence::Precise,
            transitions,
        })
    }

    fn finish(
        &self,
        output: &Path,
        lines: Vec<AlignedLine>,
        confidence: Confidence,
        transitions: Vec<Transition>,
    ) -> Result<AlignmentOutcome> {
        AlignmentArtifact::fallback(&lines, confidence).write(output)?;
        Ok(AlignmentOutcome {
            artifact_path: output.to_path_buf(),
            lines,
            confidence,
            transitions,
        })
    }
}
