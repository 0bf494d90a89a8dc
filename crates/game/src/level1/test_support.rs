use castle_engine::{AudioSink, LoopHandle};

use super::player::DamageSink;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AudioEvent {
    Sound { clip: String, volume: f32 },
    LoopStarted { clip: String, handle: LoopHandle },
    LoopVolume { handle: LoopHandle, volume: f32 },
    LoopStopped(LoopHandle),
    MusicStarted(String),
    MusicStopped,
    MusicPaused,
    MusicResumed,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingAudio {
    pub(crate) events: Vec<AudioEvent>,
    next_handle: u64,
}

impl RecordingAudio {
    pub(crate) fn sounds(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                AudioEvent::Sound { clip, .. } => Some(clip.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn loops_started(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, AudioEvent::LoopStarted { .. }))
            .count()
    }

    pub(crate) fn loops_stopped(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, AudioEvent::LoopStopped(_)))
            .count()
    }
}

impl AudioSink for RecordingAudio {
    fn play_sound(&mut self, clip: &str, volume: f32) {
        self.events.push(AudioEvent::Sound {
            clip: clip.to_string(),
            volume,
        });
    }

    fn play_looping(&mut self, clip: &str, _volume: f32) -> Option<LoopHandle> {
        self.next_handle += 1;
        let handle = LoopHandle::new(self.next_handle);
        self.events.push(AudioEvent::LoopStarted {
            clip: clip.to_string(),
            handle,
        });
        Some(handle)
    }

    fn set_loop_volume(&mut self, handle: LoopHandle, volume: f32) {
        self.events.push(AudioEvent::LoopVolume { handle, volume });
    }

    fn stop_loop(&mut self, handle: LoopHandle) {
        self.events.push(AudioEvent::LoopStopped(handle));
    }

    fn play_music(&mut self, clip: &str) {
        self.events.push(AudioEvent::MusicStarted(clip.to_string()));
    }

    fn stop_music(&mut self) {
        self.events.push(AudioEvent::MusicStopped);
    }

    fn pause_music(&mut self) {
        self.events.push(AudioEvent::MusicPaused);
    }

    fn resume_music(&mut self) {
        self.events.push(AudioEvent::MusicResumed);
    }
}

#[derive(Debug, Default)]
pub(crate) struct CountingDamage {
    pub(crate) calls: Vec<u32>,
}

impl DamageSink for CountingDamage {
    fn damage_player(&mut self, amount: u32) {
        self.calls.push(amount);
    }
}
