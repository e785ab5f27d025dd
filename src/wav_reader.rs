use crate::types::SampleI16;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// デコード済みのモノラル音声
///
/// 無音検出の入力。マルチチャンネルのWAVはダウンミックスされる。
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    pub samples: Vec<SampleI16>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<SampleI16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// 音声の長さ（ミリ秒、切り捨て）
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// 指定ミリ秒に対応するサンプル位置
    pub fn sample_index(&self, ms: u64) -> usize {
        let index = ms * self.sample_rate as u64 / 1000;
        (index as usize).min(self.samples.len())
    }
}

/// WAVファイルを読み込んでモノラル16bitに変換
///
/// 整数PCM (8/16/24/32bit) と 32bit浮動小数点に対応する。
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("WAVファイルのオープンに失敗: {:?}", path))?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.sample_rate == 0 {
        bail!("不正なWAVヘッダ: {:?} ({:?})", path, spec);
    }

    let interleaved: Vec<SampleI16> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| scale_to_i16(v, bits)))
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("WAVサンプルの読み込みに失敗: {:?}", path))?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as SampleI16))
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("WAVサンプルの読み込みに失敗: {:?}", path))?,
    };

    let samples = downmix(&interleaved, spec.channels);

    log::debug!(
        "WAV読み込み完了: {:?}, {}Hz, {}ch, {}bit, {}サンプル",
        path,
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        samples.len()
    );

    Ok(DecodedAudio::new(samples, spec.sample_rate))
}

/// ヘッダから (フレーム数, サンプリングレート) を読む
fn header_frames<P: AsRef<Path>>(path: P) -> Result<(u64, u32)> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("WAVファイルのオープンに失敗: {:?}", path))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        bail!("不正なWAVヘッダ: サンプリングレート0: {:?}", path);
    }
    Ok((reader.duration() as u64, spec.sample_rate))
}

/// WAVファイルの長さ（ミリ秒、切り捨て）
///
/// サンプルをデコードせずヘッダから計算する。[`DecodedAudio::duration_ms`] と同じ整数演算を使う。
pub fn header_duration_ms<P: AsRef<Path>>(path: P) -> Result<u64> {
    let (frames, sample_rate) = header_frames(path)?;
    Ok(frames * 1000 / sample_rate as u64)
}

/// WAVファイルの長さ（秒）
///
/// サンプルをデコードせずヘッダから計算する。
pub fn duration_seconds<P: AsRef<Path>>(path: P) -> Result<f64> {
    let (frames, sample_rate) = header_frames(path)?;
    Ok(frames as f64 / sample_rate as f64)
}

fn scale_to_i16(value: i32, bits: u16) -> SampleI16 {
    if bits >= 16 {
        (value >> (bits - 16)) as SampleI16
    } else {
        (value << (16 - bits)) as SampleI16
    }
}

fn downmix(interleaved: &[SampleI16], channels: u16) -> Vec<SampleI16> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as SampleI16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) -> Result<()> {
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    #[test]
    fn test_read_mono_wav() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("mono.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let samples: Vec<i16> = (0..16000)
            .map(|i| ((i as f32 * 0.1).sin() * 10000.0) as i16)
            .collect();
        write_wav(&path, spec, &samples)?;

        let audio = read_wav(&path)?;
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples, samples);
        assert_eq!(audio.duration_ms(), 1000);
        assert!((duration_seconds(&path)? - 1.0).abs() < 1e-9);
        assert_eq!(header_duration_ms(&path)?, 1000);

        Ok(())
    }

    #[test]
    fn test_read_stereo_wav_is_downmixed() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // L=1000, R=3000 のフレームを4つ
        let samples = [1000i16, 3000, 1000, 3000, 1000, 3000, 1000, 3000];
        write_wav(&path, spec, &samples)?;

        let audio = read_wav(&path)?;
        assert_eq!(audio.samples, vec![2000i16; 4]);

        Ok(())
    }

    #[test]
    fn test_header_duration_matches_decoded_duration() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("odd.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // 1234.99...ms 相当。切り捨てで 1234ms
        write_wav(&path, spec, &vec![500i16; 54463])?;

        let audio = read_wav(&path)?;
        assert_eq!(audio.duration_ms(), 1234);
        assert_eq!(header_duration_ms(&path)?, audio.duration_ms());

        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_wav("does/not/exist.wav").is_err());
    }

    #[test]
    fn test_scale_to_i16() {
        assert_eq!(scale_to_i16(100, 8), 100 << 8);
        assert_eq!(scale_to_i16(-1234, 16), -1234);
        assert_eq!(scale_to_i16(0x7FFFFF, 24), 0x7FFF);
    }

    #[test]
    fn test_sample_index_is_clamped() {
        let audio = DecodedAudio::new(vec![0; 16000], 16000);
        assert_eq!(audio.sample_index(500), 8000);
        assert_eq!(audio.sample_index(5000), 16000);
    }
}
