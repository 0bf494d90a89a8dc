use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{info, warn};

use crate::asset_keys::asset_file_for_key;

const CLIP_EXTENSIONS: [&str; 3] = ["ogg", "wav", "mp3"];

/// Stoppable handle for a looping sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopHandle(u64);

impl LoopHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Best-effort audio output. Nothing here reports failure to the caller.
///
/// `volume` arguments are per-sound attenuation in `0.0..=1.0`; implementations
/// multiply them by the master sound volume.
pub trait AudioSink {
    fn play_sound(&mut self, clip: &str, volume: f32);
    fn play_looping(&mut self, clip: &str, volume: f32) -> Option<LoopHandle>;
    fn set_loop_volume(&mut self, handle: LoopHandle, volume: f32);
    fn stop_loop(&mut self, handle: LoopHandle);
    fn play_music(&mut self, clip: &str);
    fn stop_music(&mut self);
    fn pause_music(&mut self);
    fn resume_music(&mut self);
    fn set_master_volumes(&mut self, _music: f32, _sound: f32) {}
}

/// Sink used when no output device exists. Loop handles are still issued.
#[derive(Debug, Default)]
pub struct SilentAudio {
    next_handle: u64,
}

impl AudioSink for SilentAudio {
    fn play_sound(&mut self, _clip: &str, _volume: f32) {}

    fn play_looping(&mut self, _clip: &str, _volume: f32) -> Option<LoopHandle> {
        self.next_handle = self.next_handle.wrapping_add(1);
        Some(LoopHandle(self.next_handle))
    }

    fn set_loop_volume(&mut self, _handle: LoopHandle, _volume: f32) {}

    fn stop_loop(&mut self, _handle: LoopHandle) {}

    fn play_music(&mut self, _clip: &str) {}

    fn stop_music(&mut self) {}

    fn pause_music(&mut self) {}

    fn resume_music(&mut self) {}
}

pub struct RodioAudio {
    stream: OutputStream,
    asset_root: PathBuf,
    clips: HashMap<String, Option<Arc<[u8]>>>,
    loops: HashMap<LoopHandle, Sink>,
    music: Option<Sink>,
    music_volume: f32,
    sound_volume: f32,
    next_handle: u64,
    warned_clips: HashSet<String>,
}

impl RodioAudio {
    pub fn open(asset_root: PathBuf, music_volume: f32, sound_volume: f32) -> Option<Self> {
        let stream = OutputStreamBuilder::open_default_stream().ok()?;
        Some(Self {
            stream,
            asset_root,
            clips: HashMap::new(),
            loops: HashMap::new(),
            music: None,
            music_volume: music_volume.clamp(0.0, 1.0),
            sound_volume: sound_volume.clamp(0.0, 1.0),
            next_handle: 0,
            warned_clips: HashSet::new(),
        })
    }

    fn clip_bytes(&mut self, clip: &str) -> Option<Arc<[u8]>> {
        if let Some(cached) = self.clips.get(clip) {
            return cached.clone();
        }
        let loaded = match asset_file_for_key(&self.asset_root, clip, &CLIP_EXTENSIONS) {
            Ok(Some(path)) => match fs::read(&path) {
                Ok(bytes) => Some(Arc::<[u8]>::from(bytes)),
                Err(error) => {
                    self.warn_clip_once(clip, &error.to_string());
                    None
                }
            },
            Ok(None) => {
                self.warn_clip_once(clip, "file not found");
                None
            }
            Err(error) => {
                self.warn_clip_once(clip, &error.to_string());
                None
            }
        };
        self.clips.insert(clip.to_string(), loaded.clone());
        loaded
    }

    fn decoder(&mut self, clip: &str) -> Option<Decoder<Cursor<Arc<[u8]>>>> {
        let bytes = self.clip_bytes(clip)?;
        match Decoder::new(Cursor::new(bytes)) {
            Ok(decoder) => Some(decoder),
            Err(error) => {
                self.warn_clip_once(clip, &error.to_string());
                None
            }
        }
    }

    fn warn_clip_once(&mut self, clip: &str, reason: &str) {
        if self.warned_clips.insert(clip.to_string()) {
            warn!(clip, reason, "audio_clip_unavailable");
        }
    }

    fn sound_level(&self, volume: f32) -> f32 {
        (volume.clamp(0.0, 1.0) * self.sound_volume).clamp(0.0, 1.0)
    }
}

impl AudioSink for RodioAudio {
    fn play_sound(&mut self, clip: &str, volume: f32) {
        let Some(source) = self.decoder(clip) else {
            return;
        };
        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.sound_level(volume));
        sink.append(source);
        sink.detach();
    }

    fn play_looping(&mut self, clip: &str, volume: f32) -> Option<LoopHandle> {
        let source = self.decoder(clip)?;
        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.sound_level(volume));
        sink.append(source.repeat_infinite());
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = LoopHandle(self.next_handle);
        self.loops.insert(handle, sink);
        Some(handle)
    }

    fn set_loop_volume(&mut self, handle: LoopHandle, volume: f32) {
        let level = self.sound_level(volume);
        if let Some(sink) = self.loops.get(&handle) {
            sink.set_volume(level);
        }
    }

    fn stop_loop(&mut self, handle: LoopHandle) {
        if let Some(sink) = self.loops.remove(&handle) {
            sink.stop();
        }
    }

    fn play_music(&mut self, clip: &str) {
        self.stop_music();
        let Some(source) = self.decoder(clip) else {
            return;
        };
        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.music_volume);
        sink.append(source.repeat_infinite());
        self.music = Some(sink);
        info!(clip, "music_started");
    }

    fn stop_music(&mut self) {
        if let Some(sink) = self.music.take() {
            sink.stop();
        }
    }

    fn pause_music(&mut self) {
        if let Some(sink) = &self.music {
            sink.pause();
        }
    }

    fn resume_music(&mut self) {
        if let Some(sink) = &self.music {
            sink.play();
        }
    }

    fn set_master_volumes(&mut self, music: f32, sound: f32) {
        self.music_volume = music.clamp(0.0, 1.0);
        self.sound_volume = sound.clamp(0.0, 1.0);
        if let Some(sink) = &self.music {
            sink.set_volume(self.music_volume);
        }
    }
}

/// Opens the default device, falling back to [`SilentAudio`].
pub fn open_audio(asset_root: PathBuf, music_volume: f32, sound_volume: f32) -> Box<dyn AudioSink> {
    match RodioAudio::open(asset_root, music_volume, sound_volume) {
        Some(audio) => {
            info!(music_volume, sound_volume, "audio_device_opened");
            Box::new(audio)
        }
        None => {
            warn!("audio_device_unavailable_using_silent_sink");
            Box::new(SilentAudio::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_audio_issues_distinct_loop_handles() {
        let mut audio = SilentAudio::default();
        let first = audio.play_looping("level_1/spider/walk", 1.0).expect("handle");
        let second = audio.play_looping("level_1/spider/walk", 1.0).expect("handle");
        assert_ne!(first, second);
        audio.stop_loop(first);
        audio.set_loop_volume(second, 0.5);
    }
}
