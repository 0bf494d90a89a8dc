use castle_engine::AudioSink;
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::info;

pub const HOWL_CHECKPOINTS: [f64; 2] = [6000.0, 8500.0];
pub const HOWL_CLIPS: [&str; 3] = [
    "level_1/wolf/howl_1",
    "level_1/wolf/howl_2",
    "level_1/wolf/howl_3",
];

/// Wolf howls tied to how far the world has scrolled; each fires once per run.
#[derive(Debug, Clone, Default)]
pub struct HowlCues {
    played: [bool; HOWL_CHECKPOINTS.len()],
}

impl HowlCues {
    pub fn reset(&mut self) {
        self.played = [false; HOWL_CHECKPOINTS.len()];
    }

    pub fn played(&self) -> usize {
        self.played.iter().filter(|played| **played).count()
    }

    pub fn update(&mut self, scroll_offset: f64, rng: &mut SmallRng, audio: &mut dyn AudioSink) {
        for (checkpoint, played) in HOWL_CHECKPOINTS.iter().zip(self.played.iter_mut()) {
            if *played || scroll_offset < *checkpoint {
                continue;
            }
            *played = true;
            let clip = HOWL_CLIPS[rng.random_range(0..HOWL_CLIPS.len())];
            audio.play_sound(clip, 1.0);
            info!(checkpoint = *checkpoint, clip, "wolf_howl");
        }
    }
}
