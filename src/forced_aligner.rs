use crate::config::ForcedAlignerConfig;
use crate::error::AlignError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 強制アラインメントツールの共通トレイト
///
/// 実装はタイムスタンプを自分で計算せず、外部ツールの設定とエラーの変換だけを行う。
/// 失敗した場合、呼び出し側は無音検出ベースの方式へフォールバックする（再試行はしない）。
pub trait ForcedAligner: Send + Sync {
    /// ログ表示用の名前
    fn name(&self) -> &str;

    /// アラインメントを実行し、ツール固有形式のJSONを `output` に書き出す
    ///
    /// `output` に前回の成果物が残っていても、今回の実行で書かれたものでなければ成功としない。
    ///
    /// # Returns
    /// 書き出したファイルのパス
    fn align(&self, audio: &Path, lyrics: &Path, output: &Path) -> Result<PathBuf, AlignError>;
}

/// aeneas を外部プロセスとして起動するアダプタ
///
/// `<program> -m <module> <audio> <lyrics> <task config> <output>` を実行する。
/// プレーンテキスト入力・JSON出力で設定する。
/// タイムアウトは設けていない。
pub struct AeneasAligner {
    config: ForcedAlignerConfig,
}

impl AeneasAligner {
    pub fn new(config: ForcedAlignerConfig) -> Self {
        Self { config }
    }

    /// aeneas のタスク設定文字列
    pub fn task_config(&self) -> String {
        format!(
            "task_language={}|is_text_type=plain|os_task_file_format=json",
            self.config.task_language
        )
    }

    fn command(&self, audio: &Path, lyrics: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .arg("-m")
            .arg(&self.config.module)
            .arg(audio)
            .arg(lyrics)
            .arg(self.task_config())
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl ForcedAligner for AeneasAligner {
    fn name(&self) -> &str {
        "aeneas"
    }

    fn align(&self, audio: &Path, lyrics: &Path, output: &Path) -> Result<PathBuf, AlignError> {
        let program = self.config.program.as_str();
        if !self.config.enabled {
            return Err(AlignError::tool_unavailable(program, "設定で無効化されています"));
        }

        // 前回の成果物を今回の出力と取り違えないよう先に消す
        match std::fs::remove_file(output) {
            Ok(()) => log::debug!("古い出力を削除しました: {:?}", output),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AlignError::tool_failure(
                    program,
                    format!("古い出力を削除できません: {:?}: {}", output, e),
                ))
            }
        }

        log::debug!(
            "aeneas 実行: {} -m {} {:?} {:?} {:?}",
            program,
            self.config.module,
            audio,
            lyrics,
            output
        );

        let result = self.command(audio, lyrics, output).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AlignError::tool_unavailable(program, e)
            } else {
                AlignError::tool_failure(program, e)
            }
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            // モジュール未インストールはツール不在として扱う
            if stderr.contains("No module named") {
                return Err(AlignError::tool_unavailable(program, last_line.trim()));
            }
            return Err(AlignError::tool_failure(
                program,
                format!("{} {}", result.status, last_line.trim()),
            ));
        }

        match std::fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => Ok(output.to_path_buf()),
            Ok(_) => Err(AlignError::tool_failure(program, "出力ファイルが空です")),
            Err(e) => Err(AlignError::tool_failure(
                program,
                format!("出力ファイルがありません: {:?}: {}", output, e),
            )),
        }
    }
}
