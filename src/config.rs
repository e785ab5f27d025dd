use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub silence: SilenceConfig,
    #[serde(default)]
    pub forced_aligner: ForcedAlignerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// 無音検出設定
///
/// # デフォルト値
///
/// - `min_silence_ms`: 500 ms
/// - `threshold_db`: -40.0 dB
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SilenceConfig {
    #[serde(default = "default_min_silence_ms")]
    pub min_silence_ms: u64,
    #[serde(default = "default_threshold_db")]
    pub threshold_db: f32,
}

/// 強制アラインメントツール設定
///
/// aeneas を Python モジュールとして起動する。
///
/// # デフォルト値
///
/// - `enabled`: true
/// - `program`: "python3"
/// - `module`: "aeneas.tools.execute_task"
/// - `task_language`: "eng"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForcedAlignerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default = "default_task_language")]
    pub task_language: String,
}

/// 出力設定
///
/// # デフォルト値
///
/// - `alignment_dir`: "./alignments"
/// - `log_level`: "info"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_alignment_dir")]
    pub alignment_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default functions
fn default_min_silence_ms() -> u64 {
    500
}

fn default_threshold_db() -> f32 {
    -40.0
}

fn default_enabled() -> bool {
    true
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_module() -> String {
    "aeneas.tools.execute_task".to_string()
}

fn default_task_language() -> String {
    "eng".to_string()
}

fn default_alignment_dir() -> String {
    "./alignments".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: default_min_silence_ms(),
            threshold_db: default_threshold_db(),
        }
    }
}

impl Default for ForcedAlignerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            program: default_program(),
            module: default_module(),
            task_language: default_task_language(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            alignment_dir: default_alignment_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use lyric_align::config::Config;
    /// let config = Config::from_file("lyric-align.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// 既存のファイルは上書きされる。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    /// ファイルが存在しない場合はエラーにならず、デフォルト設定を返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}
