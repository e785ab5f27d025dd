use crate::config::SilenceConfig;
use crate::types::SilenceInterval;
use crate::wav_reader::DecodedAudio;

/// 無音区間検出器
///
/// RMS (Root Mean Square) ベースの無音検出。
/// `min_silence_ms` 幅の窓を1msずつずらし、窓内のRMSが閾値を下回る位置を
/// 無音とみなす。連続する（または窓幅以内で重なる）無音窓は1つの区間にまとめる。
///
/// # アルゴリズム
///
/// 1. 各サンプルを正規化 (-1.0 ~ 1.0) して二乗
/// 2. 1ms単位の累積和を作る
/// 3. 窓ごとのRMSを累積和の差から求め、デシベル (dB) に変換: `20 * log10(rms)`
/// 4. 閾値未満の窓の開始位置を集め、区間に統合
///
/// 平滑化やヒステリシスは行わない。同じ入力と閾値なら結果は常に同じ。
///
/// # Examples
///
/// ```
/// # use lyric_align::silence::SilenceDetector;
/// # use lyric_align::wav_reader::DecodedAudio;
/// let detector = SilenceDetector::with_params(500, -40.0);
///
/// // 1秒の無音
/// let audio = DecodedAudio::new(vec![0i16; 16000], 16000);
/// let silences = detector.detect(&audio);
/// assert_eq!(silences.len(), 1);
/// assert_eq!((silences[0].start_ms, silences[0].end_ms), (0, 1000));
/// ```
pub struct SilenceDetector {
    /// 無音とみなす最小の長さ (ミリ秒)
    min_silence_ms: u64,

    /// 無音判定の閾値 (dBFS)
    ///
    /// この値より小さいRMSを持つ窓は無音とみなす
    threshold_db: f32,
}

impl SilenceDetector {
    pub fn new(config: &SilenceConfig) -> Self {
        Self::with_params(config.min_silence_ms, config.threshold_db)
    }

    pub fn with_params(min_silence_ms: u64, threshold_db: f32) -> Self {
        Self {
            min_silence_ms,
            threshold_db,
        }
    }

    /// 無音区間を検出
    ///
    /// # Returns
    /// `start_ms` 昇順で互いに重ならない無音区間の列。
    /// 音声が `min_silence_ms` より短い場合は空。
    pub fn detect(&self, audio: &DecodedAudio) -> Vec<SilenceInterval> {
        let duration_ms = audio.duration_ms();
        let min_len = self.min_silence_ms.max(1);
        if duration_ms < min_len {
            log::debug!(
                "無音検出: 音声が短すぎます ({}ms < {}ms)",
                duration_ms,
                min_len
            );
            return Vec::new();
        }

        let energy = self.cumulative_energy(audio, duration_ms);
        let last_start = duration_ms - min_len;

        let mut silences = Vec::new();
        // (区間開始, 直前の無音窓の開始)
        let mut current: Option<(u64, u64)> = None;

        for start in 0..=last_start {
            if !self.is_silent_window(audio, &energy, start, start + min_len) {
                continue;
            }

            current = match current {
                None => Some((start, start)),
                Some((range_start, prev)) => {
                    let continuous = start == prev + 1;
                    let has_gap = start > prev + min_len;
                    if !continuous && has_gap {
                        silences.push(SilenceInterval::new(range_start, prev + min_len));
                        Some((start, start))
                    } else {
                        Some((range_start, start))
                    }
                }
            };
        }

        if let Some((range_start, prev)) = current {
            silences.push(SilenceInterval::new(range_start, prev + min_len));
        }

        log::debug!(
            "無音検出: {}件 (音声 {}ms, 最小 {}ms, 閾値 {:.1} dB)",
            silences.len(),
            duration_ms,
            min_len,
            self.threshold_db
        );

        silences
    }

    /// 1ms単位の二乗和の累積
    ///
    /// `energy[t]` は先頭から `t` ms までの正規化サンプルの二乗和。
    fn cumulative_energy(&self, audio: &DecodedAudio, duration_ms: u64) -> Vec<f64> {
        let mut energy = Vec::with_capacity(duration_ms as usize + 1);
        let mut total = 0.0f64;
        let mut cursor = 0usize;
        energy.push(0.0);

        for t in 1..=duration_ms {
            let end = audio.sample_index(t);
            total += audio.samples[cursor..end]
                .iter()
                .map(|&s| {
                    let normalized = s as f64 / i16::MAX as f64;
                    normalized * normalized
                })
                .sum::<f64>();
            cursor = end;
            energy.push(total);
        }

        energy
    }

    fn is_silent_window(&self, audio: &DecodedAudio, energy: &[f64], from_ms: u64, to_ms: u64) -> bool {
        let count = audio.sample_index(to_ms) - audio.sample_index(from_ms);
        if count == 0 {
            return true;
        }
        let sum = (energy[to_ms as usize] - energy[from_ms as usize]).max(0.0);
        let rms = (sum / count as f64).sqrt() as f32;
        self.rms_to_db(rms) < self.threshold_db
    }

    /// RMSをデシベル (dB) に変換
    fn rms_to_db(&self, rms: f32) -> f32 {
        if rms <= 0.0 {
            return -100.0; // 無音の場合の最小値
        }
        20.0 * rms.log10()
    }
}
