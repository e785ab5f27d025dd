use std::path::PathBuf;
use thiserror::Error;

/// アラインメント処理のエラー分類
///
/// 呼び出し側が種類によって分岐する必要があるものだけを型付きで表す。
/// ファイル入出力などの配管部分は `anyhow` で扱う。
#[derive(Debug, Error)]
pub enum AlignError {
    /// 歌詞ファイルが読めない、またはUTF-8として解釈できない
    #[error("歌詞ファイルの読み込みに失敗: {path:?}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 強制アラインメントツールが存在しない、または無効化されている
    #[error("強制アラインメントツールが利用できません ({program}): {reason}")]
    ToolUnavailable { program: String, reason: String },

    /// 強制アラインメントツールの実行に失敗
    #[error("強制アラインメントツールの実行に失敗 ({program}): {message}")]
    ToolExecutionFailure { program: String, message: String },

    /// 無音区間が歌詞行数に対して不足している
    #[error("無音区間が不足しています: 無音 {silences} 件, 歌詞 {lines} 行")]
    InsufficientSegments { silences: usize, lines: usize },

    /// 成果物JSONを解釈できない
    #[error("アラインメント成果物を解釈できません: {path:?}: {message}")]
    MalformedArtifact { path: PathBuf, message: String },

    /// 歌詞0行で等分割を呼び出した
    #[error("歌詞が0行のため等分割できません")]
    DivisionPrecondition,
}

impl AlignError {
    pub(crate) fn read_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn tool_unavailable(program: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ToolUnavailable {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn tool_failure(program: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ToolExecutionFailure {
            program: program.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::MalformedArtifact {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = AlignError::tool_failure("python3", "exit status: 1");
        let message = err.to_string();
        assert!(message.contains("python3"));
        assert!(message.contains("exit status: 1"));
    }
}
