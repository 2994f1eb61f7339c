// Audio Module - Continuous mic capture via cpal feeding a ring buffer

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

/// A circular ring buffer for audio samples.
///
/// Stores f32 PCM samples with a fixed capacity. When full, new writes
/// overwrite the oldest data. The visualizer only ever needs the most
/// recent analysis window, read via `read_latest`.
pub struct RingBuffer {
    data: Vec<f32>,
    capacity: usize,
    write_pos: usize,
    count: usize,
}

impl RingBuffer {
    /// Create a new ring buffer with the given capacity in samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity],
            capacity,
            write_pos: 0,
            count: 0,
        }
    }

    /// Write samples into the ring buffer. If the buffer is full,
    /// oldest samples are overwritten.
    pub fn write(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.data[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.capacity;
            if self.count < self.capacity {
                self.count += 1;
            }
        }
    }

    /// Read the last `n` samples (most recent), oldest first.
    pub fn read_latest(&self, n: usize) -> Vec<f32> {
        let n = n.min(self.count);
        if n == 0 {
            return Vec::new();
        }
        let mut result = Vec::with_capacity(n);
        let start = if self.write_pos >= n {
            self.write_pos - n
        } else {
            self.capacity - (n - self.write_pos)
        };
        if start + n <= self.capacity {
            result.extend_from_slice(&self.data[start..start + n]);
        } else {
            result.extend_from_slice(&self.data[start..]);
            let remaining = n - (self.capacity - start);
            result.extend_from_slice(&self.data[..remaining]);
        }
        result
    }

    /// Clear all data from the buffer.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.count = 0;
    }

    /// Number of valid samples in the buffer.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A live audio source the analyser graph can sample from.
///
/// Production code uses `MicCapture`; tests substitute scripted sources so
/// graph lifetime can be observed without an audio device.
pub trait SampleTap {
    /// The sample rate of the source in Hz.
    fn sample_rate(&self) -> u32;

    /// The most recent `n` mono samples, oldest first. May return fewer
    /// than requested (or none) when the source has not produced data yet.
    fn read_latest(&self, n: usize) -> Vec<f32>;

    /// Start or resume delivery. Called on attach and retried on poll when
    /// a previous attempt failed; implementations should be idempotent.
    fn start(&self) -> Result<()> {
        Ok(())
    }
}

/// Microphone capture using cpal's default input device.
///
/// The input stream writes mono f32 PCM into a shared ring buffer sized for
/// two seconds of audio. Dropping the capture drops the stream, releasing
/// the platform audio resources.
pub struct MicCapture {
    buffer: Arc<Mutex<RingBuffer>>,
    stream: cpal::Stream,
    sample_rate: u32,
}

// cpal::Stream is not Send, but we ensure it's only accessed from the thread
// that created it. The Arc<Mutex<RingBuffer>> handles cross-thread access.
unsafe impl Send for MicCapture {}

impl MicCapture {
    /// Open the default input device and build (but do not start) the
    /// capture stream.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No audio input device found"))?;

        let supported_config = device.default_input_config()?;
        let sample_rate = supported_config.sample_rate().0;
        let sample_format = supported_config.sample_format();
        let channels = supported_config.channels() as usize;
        let config: cpal::StreamConfig = supported_config.into();

        // Two seconds of mono audio covers any analysis window
        let buffer = Arc::new(Mutex::new(RingBuffer::new(sample_rate as usize * 2)));

        let buffer_clone = Arc::clone(&buffer);
        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_input_stream::<f32>(&device, &config, buffer_clone, channels)?
            }
            cpal::SampleFormat::I16 => {
                build_input_stream::<i16>(&device, &config, buffer_clone, channels)?
            }
            cpal::SampleFormat::U16 => {
                build_input_stream::<u16>(&device, &config, buffer_clone, channels)?
            }
            format => return Err(anyhow!("Unsupported sample format: {:?}", format)),
        };

        Ok(Self {
            buffer,
            stream,
            sample_rate,
        })
    }
}

impl SampleTap for MicCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_latest(&self, n: usize) -> Vec<f32> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.read_latest(n),
            Err(_) => Vec::new(),
        }
    }

    fn start(&self) -> Result<()> {
        self.stream.play()?;
        Ok(())
    }
}

/// Build a cpal input stream that writes samples to the shared ring buffer.
/// Handles mono conversion from multi-channel audio.
fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer: Arc<Mutex<RingBuffer>>,
    channels: usize,
) -> Result<cpal::Stream>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if let Ok(mut buffer) = buffer.try_lock() {
                // Convert to mono f32
                for chunk in data.chunks(channels) {
                    let mono: f32 = chunk
                        .iter()
                        .map(|s| f32::from_sample(*s))
                        .sum::<f32>()
                        / channels as f32;
                    buffer.write(&[mono]);
                }
            }
            // If lock fails (contention), drop the audio frame.
            // This is acceptable for a decorative visualization.
        },
        |err| eprintln!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}
