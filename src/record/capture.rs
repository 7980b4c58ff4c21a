use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use hound::{WavSpec, WavWriter};
use tracing::{error, info, warn};

use crate::error::RecordError;
use crate::library::{AudioFile, Category, ensure};
use crate::merge::{MergeEngine, Transcoder};

use super::levels::LevelMeter;
use super::{capture_path, recording_file_name};

type Writer = WavWriter<BufWriter<File>>;

/// An in-progress microphone recording.
///
/// Samples are captured as 16-bit PCM into a hidden WAV next to the final file.
/// `stop` ends capture; the returned `PendingRecording` is then encoded to
/// the final `.mp3` name off the UI thread.
pub struct Recorder {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<(), RecordError>>>,
    started: Instant,
    wav: PathBuf,
    target: PathBuf,
}

/// A finished capture waiting to be encoded.
#[derive(Debug, Clone)]
pub struct PendingRecording {
    pub wav: PathBuf,
    pub target: PathBuf,
}

impl Recorder {
    /// Open the default input device and start writing into `dir`.
    pub fn start(dir: &Path, meter: Arc<Mutex<LevelMeter>>) -> Result<Self, RecordError> {
        ensure(dir)?;
        let target = dir.join(recording_file_name(&Local::now()));
        let wav = capture_path(&target);

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let worker = {
            let wav = wav.clone();
            let stop = stop.clone();
            thread::spawn(move || run_capture(&wav, &stop, &meter, ready_tx))
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                let _ = fs::remove_file(&wav);
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(RecordError::Stream("capture thread exited".into()));
            }
        }

        info!(path = %target.display(), "recording started");
        Ok(Self {
            stop,
            worker: Some(worker),
            started: Instant::now(),
            wav,
            target,
        })
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Stop capturing and finalize the WAV.
    pub fn stop(mut self) -> Result<PendingRecording, RecordError> {
        self.halt()?;
        info!(elapsed = ?self.elapsed(), "recording stopped");
        Ok(PendingRecording {
            wav: self.wav.clone(),
            target: self.target.clone(),
        })
    }

    fn halt(&mut self) -> Result<(), RecordError> {
        self.stop.store(true, Ordering::Relaxed);
        match self.worker.take() {
            Some(h) => h
                .join()
                .map_err(|_| RecordError::Stream("capture thread panicked".into()))?,
            None => Ok(()),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Err(e) = self.halt() {
            warn!(error = %e, "recording aborted");
        }
    }
}

impl PendingRecording {
    /// Encode the WAV to the final file and remove the WAV.
    ///
    /// If encoding fails the WAV is kept so the take is not lost.
    pub fn encode<T: Transcoder>(self, engine: &MergeEngine<T>) -> Result<AudioFile, RecordError> {
        if let Err(e) = engine.encode(&self.wav, &self.target) {
            warn!(wav = %self.wav.display(), error = %e, "keeping unencoded recording");
            return Err(e.into());
        }
        fs::remove_file(&self.wav)?;
        Ok(AudioFile::new(self.target, Category::Recorded))
    }
}

fn run_capture(
    wav: &Path,
    stop: &AtomicBool,
    meter: &Mutex<LevelMeter>,
    ready: Sender<Result<(), RecordError>>,
) -> Result<(), RecordError> {
    let (stream, rx, mut writer) = match open_input(wav) {
        Ok(v) => v,
        Err(e) => {
            let _ = ready.send(Err(e));
            return Ok(());
        }
    };
    let _ = ready.send(Ok(()));

    let mut write_chunk = |chunk: Vec<i16>, writer: &mut Writer| -> Result<(), RecordError> {
        for s in &chunk {
            writer.write_sample(*s)?;
        }
        if let Ok(mut m) = meter.lock() {
            m.push_chunk(&chunk);
        }
        Ok(())
    };

    while !stop.load(Ordering::Relaxed) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => write_chunk(chunk, &mut writer)?,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(RecordError::Stream("input stream closed".into()));
            }
        }
    }

    drop(stream);
    while let Ok(chunk) = rx.try_recv() {
        write_chunk(chunk, &mut writer)?;
    }
    writer.finalize()?;
    Ok(())
}

fn open_input(wav: &Path) -> Result<(cpal::Stream, Receiver<Vec<i16>>, Writer), RecordError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(RecordError::NoDevice)?;
    info!(
        device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
        "using input device"
    );

    let supported = device
        .default_input_config()
        .map_err(|e| RecordError::Stream(e.to_string()))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let spec = WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate.0,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let writer = WavWriter::create(wav, spec)?;

    let (tx, rx) = mpsc::channel();
    let stream = match sample_format {
        SampleFormat::F32 => build_input_stream::<f32>(&device, &config, tx)?,
        SampleFormat::I16 => build_input_stream::<i16>(&device, &config, tx)?,
        SampleFormat::U16 => build_input_stream::<u16>(&device, &config, tx)?,
        SampleFormat::I32 => build_input_stream::<i32>(&device, &config, tx)?,
        SampleFormat::U8 => build_input_stream::<u8>(&device, &config, tx)?,
        other => {
            return Err(RecordError::Stream(format!(
                "unsupported sample format {other:?}"
            )));
        }
    };
    stream
        .play()
        .map_err(|e| RecordError::Stream(e.to_string()))?;

    Ok((stream, rx, writer))
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: Sender<Vec<i16>>,
) -> Result<cpal::Stream, RecordError>
where
    T: cpal::SizedSample + Send + 'static,
    i16: cpal::FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let chunk: Vec<i16> = data.iter().map(|s| s.to_sample::<i16>()).collect();
                let _ = tx.send(chunk);
            },
            |err| error!("input stream error: {err}"),
            None,
        )
        .map_err(|e| RecordError::Stream(e.to_string()))
}
