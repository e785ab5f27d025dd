//! lyric-align - 歌詞と音声の行単位アラインメント
//!
//! 歌詞テキストの各行に、音声中の開始・終了時刻を割り当てる。
//! 結果は字幕・キャプション描画用のJSON成果物として保存される。
//!
//! # 主な機能
//!
//! - **強制アラインメント**: aeneas が使える場合は外部プロセスとして実行
//! - **無音検出**: RMSベースで無音区間を検出し、その間を歌詞行に割り当て
//! - **等分割**: 無音が足りない場合は音声全体を行数で等分
//! - **正規化**: 保存形式の違いを吸収して秒単位の行リストに変換
//!
//! # アーキテクチャ
//!
//! ```text
//! [Lyrics] ──┐
//!            ↓
//!       [Aligner] ──→ [ForcedAligner (aeneas)] ──成功──┐
//!            │ 失敗                                     │
//!            ↓                                          │
//!    [WavReader] → [SilenceDetector] → [Segmenter]      │
//!                                          │            │
//!                        ┌── 足りる ───────┤            │
//!                        ↓                 ↓ 不足       │
//!                   [Matcher]       [EqualDivision]     │
//!                        │                 │            │
//!                        └────────┬────────┘            │
//!                                 ↓                     ↓
//!                          [AlignmentArtifact (JSON)] ←─┘
//!                                 │
//!                                 ↓
//!                            [normalize] → Vec<AlignedLine>
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use lyric_align::aligner::Aligner;
//! use lyric_align::artifact;
//! use lyric_align::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load_or_default("lyric-align.toml").unwrap();
//! let aligner = Aligner::new(config);
//! let outcome = aligner
//!     .align(Path::new("song.wav"), Path::new("song.txt"), None)
//!     .unwrap();
//!
//! // 描画側は成果物を読み戻して使う
//! let lines = artifact::normalize(&outcome.artifact_path);
//! ```

pub mod aligner;
pub mod artifact;
pub mod config;
pub mod equal_division;
pub mod error;
pub mod forced_aligner;
pub mod lyrics;
pub mod matcher;
pub mod segmenter;
pub mod silence;
pub mod types;
pub mod wav_reader;
