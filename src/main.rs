use anyhow::{bail, Context, Result};
use env_logger::Env;
use lyric_align::aligner::{AlignJob, Aligner, AlignmentOutcome};
use lyric_align::config::Config;
use lyric_align::lyrics;
use std::path::{Path, PathBuf};

const USAGE: &str = "使い方:
  lyric-align [--config <path>] <audio.wav> <lyrics.txt> [output.json]
  lyric-align [--config <path>] --batch <audio.wav> <lyrics.txt> [<audio.wav> <lyrics.txt> ...]
  lyric-align [--config <path>] --parse-lyrics <lyrics.txt> [output.json]
  lyric-align --generate-config [path]";

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            if i + 1 >= args.len() {
                bail!("{}", USAGE);
            }
            let path = args.remove(i + 1);
            args.remove(i);
            path
        }
        None => "lyric-align.toml".to_string(),
    };

    // ログレベルは設定ファイルに従う (RUST_LOG が優先)
    let config = Config::load_or_default(&config_path)?;
    env_logger::Builder::from_env(Env::default().default_filter_or(config.output.log_level.as_str()))
        .format_timestamp(None)
        .init();
    if !Path::new(&config_path).exists() {
        log::warn!("設定ファイルが見つかりません。デフォルト設定を使用します: {}", config_path);
    }

    // 設定ファイル生成モード
    if args.first().map(String::as_str) == Some("--generate-config") {
        let config_path = args.get(1).map(String::as_str).unwrap_or("lyric-align.toml");
        Config::write_default(config_path)?;
        println!("設定ファイルを生成しました: {}", config_path);
        return Ok(());
    }

    // 歌詞の解析のみ
    if args.first().map(String::as_str) == Some("--parse-lyrics") {
        let Some(lyrics_path) = args.get(1) else {
            bail!("{}", USAGE);
        };
        let parsed = lyrics::try_read_lyrics(lyrics_path)?;
        println!("{} 行を読み込みました: {}", parsed.len(), lyrics_path);
        for line in parsed.iter().take(5) {
            println!("{}: {}", line.index, line.text);
        }
        if let Some(output) = args.get(2) {
            lyrics::write_json(&parsed, output)?;
            println!("JSONを保存しました: {}", output);
        }
        return Ok(());
    }

    log::debug!("設定: {:?}", config);
    let aligner = Aligner::new(config);

    // 複数の組を並列処理
    if args.first().map(String::as_str) == Some("--batch") {
        let pairs = &args[1..];
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            bail!("{}", USAGE);
        }
        let jobs: Vec<AlignJob> = pairs
            .chunks_exact(2)
            .map(|pair| AlignJob {
                audio: PathBuf::from(&pair[0]),
                lyrics: PathBuf::from(&pair[1]),
                output: None,
            })
            .collect();

        let mut failures = 0;
        for (job, result) in jobs.iter().zip(aligner.align_batch(&jobs)) {
            match result {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => {
                    failures += 1;
                    log::error!("アラインメント失敗: {:?}: {:#}", job.audio, e);
                }
            }
        }
        if failures > 0 {
            bail!("{} 件のアラインメントに失敗しました", failures);
        }
        return Ok(());
    }

    let (audio, lyrics_path) = match (args.first(), args.get(1)) {
        (Some(audio), Some(lyrics_path)) => (Path::new(audio), Path::new(lyrics_path)),
        _ => bail!("{}", USAGE),
    };
    let output = args.get(2).map(Path::new);

    let outcome = aligner
        .align(audio, lyrics_path, output)
        .with_context(|| format!("アラインメントに失敗: {:?}", audio))?;
    print_outcome(&outcome);

    Ok(())
}

fn print_outcome(outcome: &AlignmentOutcome) {
    println!(
        "{} 件のアラインメントを生成しました ({:?}): {}",
        outcome.lines.len(),
        outcome.confidence,
        outcome.artifact_path.display()
    );
    for line in outcome.lines.iter().take(3) {
        println!(
            "{}: {:.3}s - {:.3}s: {}",
            line.index + 1,
            line.start_sec,
            line.end_sec,
            line.text
        );
    }
    if outcome.lines.len() > 3 {
        println!("...");
    }
}
