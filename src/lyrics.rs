use crate::error::AlignError;
use crate::types::LyricLine;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 歌詞テキストを行単位に分割
///
/// 各行の前後の空白を除去し、空行を捨てて連番の `index` を振る。
///
/// # Examples
///
/// ```
/// # use lyric_align::lyrics::parse_lyrics;
/// let lines = parse_lyrics("first\n\n  second  \n");
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[1].index, 1);
/// assert_eq!(lines[1].text, "second");
/// ```
pub fn parse_lyrics(content: &str) -> Vec<LyricLine> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, text)| LyricLine {
            index,
            text: text.to_string(),
        })
        .collect()
}

/// 歌詞ファイルを読み込み (失敗をエラーとして返す)
pub fn try_read_lyrics<P: AsRef<Path>>(path: P) -> std::result::Result<Vec<LyricLine>, AlignError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| AlignError::read_failure(path, e))?;
    Ok(parse_lyrics(&content))
}

/// 歌詞ファイルを読み込み
///
/// 読み込みに失敗した場合はログに記録して空の列を返す。
/// 呼び出し側は「歌詞なし」と「読み込み失敗」を区別できないので、
/// 区別が必要なら [`try_read_lyrics`] を使う。
pub fn read_lyrics<P: AsRef<Path>>(path: P) -> Vec<LyricLine> {
    match try_read_lyrics(path) {
        Ok(lines) => lines,
        Err(e) => {
            log::error!("{}", e);
            Vec::new()
        }
    }
}

/// 解析済みの歌詞をJSONで書き出し
///
/// 出力先の親ディレクトリが無ければ作成する。
pub fn write_json<P: AsRef<Path>>(lines: &[LyricLine], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("出力ディレクトリの作成に失敗: {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(lines).with_context(|| "歌詞のシリアライズに失敗")?;
    fs::write(path, json).with_context(|| format!("歌詞JSONの書き込みに失敗: {:?}", path))?;
    Ok(())
}
